//! Target Registry: one `ReferenceState` per document build.
//!
//! ## Key Invariants
//!
//! 1. Identifiers are unique within one state; the first registration wins.
//!    Duplicates on non-implicit nodes are warned and dropped.
//! 2. An enumerator, once assigned, is immutable.
//! 3. Registered targets are deep-copied snapshots, decoupled from the live
//!    tree: later mutation of the tree cannot alter resolved content.
//! 4. The state is write-once during enumeration and read-only afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::counters::{
    self, format_heading_enumerator, increment_heading_counts, TargetCounts,
};
use crate::diagnostics::{Diagnostics, WARN_DUPLICATE_IDENTIFIER};
use crate::node::{create_html_id, visit_mut, Node};

// ═══════════════════════════════════════════════════════════════════════════════
// TARGET KINDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Closed classification of reference targets. Dispatch in the formatter and
/// resolver matches exhaustively, so adding a kind is a compile-time event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Heading,
    Equation,
    Figure,
    Table,
    Code,
    Other(String),
}

impl TargetKind {
    /// Classify a node, or reject it. Node types that structurally carry an
    /// identifier but are never targets (cross-references, citations,
    /// footnote definitions) return `None`.
    pub fn from_node(node: &Node) -> Option<TargetKind> {
        match node.node_type.as_str() {
            "crossReference" | "cite" | "footnoteDefinition" => None,
            "heading" => Some(TargetKind::Heading),
            "math" => Some(TargetKind::Equation),
            "container" => Some(match node.kind.as_deref() {
                Some("table") => TargetKind::Table,
                Some("code") => TargetKind::Code,
                Some("equation") => TargetKind::Equation,
                Some("figure") | None => TargetKind::Figure,
                Some(other) => TargetKind::Other(other.to_string()),
            }),
            "table" => Some(TargetKind::Table),
            "code" => Some(TargetKind::Code),
            other => Some(TargetKind::Other(other.to_string())),
        }
    }

    /// Lowercase kind name, as carried on caption-number markers.
    pub fn name(&self) -> &str {
        match self {
            TargetKind::Heading => "heading",
            TargetKind::Equation => "equation",
            TargetKind::Figure => "figure",
            TargetKind::Table => "table",
            TargetKind::Code => "code",
            TargetKind::Other(name) => name,
        }
    }
}

/// A registered reference target: an owned snapshot of the node at
/// registration time plus its classification.
#[derive(Debug, Clone)]
pub struct Target {
    pub node: Node,
    pub kind: TargetKind,
}

// ═══════════════════════════════════════════════════════════════════════════════
// NUMBERING OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-kind numbering toggles plus an optional prefix template applied to
/// every formatted numeral. Deserializable so the host's config layer can
/// feed it directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberingOptions {
    /// Prefix template; `%s` is replaced with the formatted numeral.
    pub enumerator: Option<String>,
    pub figure: bool,
    pub equation: bool,
    pub table: bool,
    pub code: bool,
    pub heading_1: bool,
    pub heading_2: bool,
    pub heading_3: bool,
    pub heading_4: bool,
    pub heading_5: bool,
    pub heading_6: bool,
}

impl NumberingOptions {
    /// Everything on; the common site-wide default.
    pub fn all_enabled() -> Self {
        NumberingOptions {
            enumerator: None,
            figure: true,
            equation: true,
            table: true,
            code: true,
            heading_1: true,
            heading_2: true,
            heading_3: true,
            heading_4: true,
            heading_5: true,
            heading_6: true,
        }
    }

    pub fn heading_enabled(&self, depth: u8) -> bool {
        match depth {
            1 => self.heading_1,
            2 => self.heading_2,
            3 => self.heading_3,
            4 => self.heading_4,
            5 => self.heading_5,
            6 => self.heading_6,
            _ => false,
        }
    }

    pub fn kind_enabled(&self, kind: &TargetKind) -> bool {
        match kind {
            TargetKind::Heading => false,
            TargetKind::Equation => self.equation,
            TargetKind::Figure => self.figure,
            TargetKind::Table => self.table,
            TargetKind::Code => self.code,
            TargetKind::Other(_) => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REFERENCE STATE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct ReferenceState {
    pub numbering: NumberingOptions,
    /// Frontmatter-style blanket override: `Some(true)` numbers everything,
    /// `Some(false)` numbers nothing, `None` defers to per-kind toggles.
    pub global_override: Option<bool>,
    pub counts: TargetCounts,
    targets: HashMap<String, Target>,
    order: Vec<String>,
}

impl ReferenceState {
    pub fn new(numbering: NumberingOptions) -> Self {
        ReferenceState {
            numbering,
            ..Default::default()
        }
    }

    pub fn with_override(numbering: NumberingOptions, global_override: Option<bool>) -> Self {
        ReferenceState {
            numbering,
            global_override,
            ..Default::default()
        }
    }

    /// Seed the heading depth vector from the tree, so depths absent from
    /// the document never render. Runs once per document, before any
    /// `add_target` call of the same pass.
    pub fn initialize_numbered_heading_depths(&mut self, tree: &Node) {
        self.counts.heading = counters::initialize_numbered_heading_depths(tree);
    }

    /// Whether a node of the given kind receives an enumerator under the
    /// live numbering config. The global override, when set, wins
    /// unconditionally; headings consult their per-depth toggle.
    pub fn should_enumerate(&self, node: &Node, kind: &TargetKind) -> bool {
        if let Some(force) = self.global_override {
            return force;
        }
        match kind {
            TargetKind::Heading => node
                .depth
                .map(|depth| self.numbering.heading_enabled(depth))
                .unwrap_or(false),
            other => self.numbering.kind_enabled(other),
        }
    }

    fn increment_count(&mut self, node: &Node, kind: &TargetKind) -> String {
        let prefix = self.numbering.enumerator.clone();
        match kind {
            TargetKind::Heading => {
                let depth = node.depth.unwrap_or(1);
                // The depth scan normally seeds this slot; a state used
                // without one seeds on first use so the numeral is never
                // empty.
                let index = depth.saturating_sub(1) as usize;
                if index < counters::HEADING_DEPTHS && self.counts.heading[index].is_none() {
                    self.counts.heading[index] = Some(0);
                }
                self.counts.heading = increment_heading_counts(depth, &self.counts.heading);
                format_heading_enumerator(&self.counts.heading, prefix.as_deref())
            }
            other => {
                let count = self.counts.increment_kind(other);
                counters::apply_enumerator_prefix(&count.to_string(), prefix.as_deref())
            }
        }
    }

    /// Register a node as a reference target, assigning its enumerator and
    /// html id in the process. Registration is write-once: a duplicate
    /// identifier is skipped, warned about unless either side is implicit.
    pub fn add_target(&mut self, node: &mut Node, diags: &mut Diagnostics) {
        let Some(kind) = TargetKind::from_node(node) else {
            return;
        };
        let enumerable = self.should_enumerate(node, &kind);
        if node.enumerated != Some(false) && enumerable && node.enumerator.is_none() {
            let enumerator = self.increment_count(node, &kind);
            node.enumerator = Some(enumerator);
        }
        // The html id is assigned independently of enumerability.
        if let Some(identifier) = &node.identifier {
            node.html_id = Some(create_html_id(identifier));
        }
        let Some(identifier) = node.identifier.clone() else {
            return;
        };
        if let Some(existing) = self.targets.get(&identifier) {
            if !existing.node.implicit && !node.implicit {
                diags.warn(
                    WARN_DUPLICATE_IDENTIFIER,
                    format!(
                        "Duplicate identifier \"{}\"; keeping the first registration",
                        identifier
                    ),
                    node,
                );
            }
            return;
        }
        self.order.push(identifier.clone());
        self.targets.insert(
            identifier,
            Target {
                node: node.clone(),
                kind,
            },
        );
    }

    pub fn get_target(&self, identifier: &str) -> Option<&Target> {
        self.targets.get(identifier)
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Registered targets in registration (document) order.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.order
            .iter()
            .filter_map(move |identifier| self.targets.get(identifier))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMERATION TRAVERSAL
// ═══════════════════════════════════════════════════════════════════════════════

fn is_enumerable_type(node: &Node) -> bool {
    matches!(node.node_type.as_str(), "heading" | "container" | "math")
}

/// Enumeration phase for one document: seed the heading depths, then
/// register every node carrying an identifier or of an enumerable type, in
/// document order.
pub fn enumerate_targets(tree: &mut Node, state: &mut ReferenceState, diags: &mut Diagnostics) {
    state.initialize_numbered_heading_depths(tree);
    visit_mut(tree, &mut |node| {
        if node.identifier.is_some() || is_enumerable_type(node) {
            state.add_target(node, diags);
        }
    });
}
