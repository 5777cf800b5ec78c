//! # Document Reference/Enumeration Engine
//!
//! Given a parsed document tree (or a multi-page site of trees), this crate
//! registers reference targets (headings, figures, tables, equations, code
//! blocks and other labeled nodes), assigning each a human-readable
//! enumerator, and resolves cross-reference nodes and internal hyperlinks
//! against that registry, filling templated display text across pages.
//!
//! ## Build Invariants
//!
//! 1. **Three phases, in order**: enumerate the whole tree, then promote
//!    links, then resolve references and inject caption numbers. The
//!    phase-typed pipeline handles make a violation a compile error.
//! 2. **Forward references are legal**: no resolution starts before
//!    enumeration of the entire tree (and, for sites, every page) is done.
//! 3. **First registration wins**: duplicate identifiers are dropped with a
//!    warning unless either node is implicit.
//! 4. **Enumerators are write-once**: an assigned enumerator never changes.
//! 5. **Warnings never fail a build**: unresolved references render with
//!    the `"??"` sentinel; a missing diagnostics sink suppresses warnings
//!    instead of crashing.
//! 6. **Registered targets are snapshots**: later mutation of the live tree
//!    cannot retroactively alter resolved reference content.

mod counters;
mod diagnostics;
mod links;
mod multi_page;
mod node;
mod pipeline;
mod resolve;
mod state;
mod templates;


pub use counters::{
    format_heading_enumerator, increment_heading_counts, initialize_numbered_heading_depths,
    HeadingCounts, TargetCounts, HEADING_DEPTHS,
};
pub use diagnostics::{
    Diagnostics, Warning, WARN_ANCHOR_NOT_FOUND, WARN_DEPRECATED_PLAIN_ANCHOR,
    WARN_DUPLICATE_IDENTIFIER, WARN_IMPLICIT_REFERENCE, WARN_TARGET_NOT_FOUND,
    WARN_UNFILLED_ENUMERATOR,
};
pub use links::promote_internal_links;
pub use multi_page::{MultiPageReferenceState, PageReferenceState, PageView};
pub use node::{
    create_html_id, find_first, find_first_mut, normalize_label, select_all, visit_mut, Node,
};
pub use pipeline::{BuiltPage, Enumeration, Resolution, SitePipeline, SiteResolution};
pub use resolve::{
    inject_caption_numbers, resolve_reference_content, resolve_references, ResolvedTarget,
    TargetLookup,
};
pub use state::{enumerate_targets, NumberingOptions, ReferenceState, Target, TargetKind};
pub use templates::{
    caption_template, default_template, fill_reference_enumerators, UNKNOWN_REFERENCE_ENUMERATOR,
};
