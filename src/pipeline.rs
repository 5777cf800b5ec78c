//! Phase-typed build pipelines.
//!
//! Every build follows the same hard ordering: (1) enumerate the whole tree
//! in document order, (2) promote links to cross-references, (3) resolve
//! cross-references and inject caption numbers. A reference appearing
//! before its target must still see it, so no resolution may start until
//! enumeration has fully completed. That barrier is a typestate: the
//! resolving handle only exists as the return value of `finish()`.
//!
//! Site builds are embarrassingly parallel in both phases: each page owns
//! its registry during enumeration, and resolution only reads sibling
//! registries through a per-page view.

use rayon::prelude::*;

use crate::diagnostics::{Diagnostics, Warning};
use crate::links::promote_internal_links;
use crate::multi_page::MultiPageReferenceState;
use crate::node::Node;
use crate::resolve::{inject_caption_numbers, resolve_references};
use crate::state::{enumerate_targets, NumberingOptions, ReferenceState};

// ═══════════════════════════════════════════════════════════════════════════════
// SINGLE DOCUMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Enumeration-phase handle for a single document.
pub struct Enumeration {
    state: ReferenceState,
    diagnostics: Diagnostics,
}

impl Enumeration {
    pub fn new(numbering: NumberingOptions) -> Self {
        Enumeration {
            state: ReferenceState::new(numbering),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_override(numbering: NumberingOptions, global_override: Option<bool>) -> Self {
        Enumeration {
            state: ReferenceState::with_override(numbering, global_override),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Enumeration phase: register every target in document order.
    pub fn enumerate(&mut self, tree: &mut Node) {
        enumerate_targets(tree, &mut self.state, &mut self.diagnostics);
    }

    /// End the enumeration phase. The registry is read-only from here on.
    pub fn finish(self) -> Resolution {
        Resolution {
            state: self.state,
            diagnostics: self.diagnostics,
        }
    }
}

/// Resolution-phase handle; obtainable only from `Enumeration::finish`.
pub struct Resolution {
    state: ReferenceState,
    diagnostics: Diagnostics,
}

impl Resolution {
    pub fn promote_links(&mut self, tree: &mut Node) {
        promote_internal_links(tree, &self.state, &mut self.diagnostics);
    }

    pub fn resolve_references(&mut self, tree: &mut Node) {
        resolve_references(tree, &self.state, &mut self.diagnostics);
    }

    pub fn inject_caption_numbers(&mut self, tree: &mut Node) {
        inject_caption_numbers(tree);
    }

    /// Run the whole resolution phase in order.
    pub fn resolve_all(&mut self, tree: &mut Node) {
        self.promote_links(tree);
        self.resolve_references(tree);
        self.inject_caption_numbers(tree);
    }

    pub fn state(&self) -> &ReferenceState {
        &self.state
    }

    pub fn warnings(&self) -> &[Warning] {
        self.diagnostics.warnings()
    }

    pub fn finish(self) -> (ReferenceState, Vec<Warning>) {
        (self.state, self.diagnostics.into_warnings())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MULTI-PAGE SITE
// ═══════════════════════════════════════════════════════════════════════════════

struct PendingPage {
    page_id: String,
    url: String,
    tree: Node,
    state: ReferenceState,
    diagnostics: Diagnostics,
}

/// Site enumeration-phase handle: owns every page's tree and registry.
pub struct SitePipeline {
    pages: Vec<PendingPage>,
}

impl SitePipeline {
    pub fn new() -> Self {
        SitePipeline { pages: Vec::new() }
    }

    pub fn add_page(&mut self, page_id: &str, url: &str, numbering: NumberingOptions, tree: Node) {
        self.pages.push(PendingPage {
            page_id: page_id.to_string(),
            url: url.to_string(),
            tree,
            state: ReferenceState::new(numbering),
            diagnostics: Diagnostics::new(),
        });
    }

    /// Site-wide enumeration phase, one page per task. Consuming `self` is
    /// the explicit barrier: resolution cannot start while any page is
    /// still enumerating.
    pub fn enumerate(mut self) -> SiteResolution {
        self.pages.par_iter_mut().for_each(|page| {
            enumerate_targets(&mut page.tree, &mut page.state, &mut page.diagnostics);
        });

        let mut site = MultiPageReferenceState::new();
        let mut trees = Vec::with_capacity(self.pages.len());
        let mut diagnostics = Vec::with_capacity(self.pages.len());
        for page in self.pages {
            site.add_page(&page.page_id, &page.url, page.state);
            trees.push(page.tree);
            diagnostics.push(page.diagnostics);
        }
        SiteResolution {
            site,
            trees,
            diagnostics,
        }
    }
}

impl Default for SitePipeline {
    fn default() -> Self {
        SitePipeline::new()
    }
}

/// Site resolution-phase handle. Sibling registries are read-only from
/// here, so pages resolve in parallel without locks.
pub struct SiteResolution {
    site: MultiPageReferenceState,
    trees: Vec<Node>,
    diagnostics: Vec<Diagnostics>,
}

/// One fully built page of a site.
pub struct BuiltPage {
    pub page_id: String,
    pub url: String,
    pub tree: Node,
    pub warnings: Vec<Warning>,
}

impl SiteResolution {
    /// Site-wide resolution phase: promote, resolve, and inject captions on
    /// every page, each against its own view of the aggregator.
    pub fn resolve(mut self) -> Vec<BuiltPage> {
        let site = &self.site;
        self.trees
            .par_iter_mut()
            .zip(self.diagnostics.par_iter_mut())
            .enumerate()
            .for_each(|(index, (tree, diags))| {
                let page_state = &site.pages()[index].state;
                promote_internal_links(tree, page_state, diags);
                resolve_references(tree, &site.view(index), diags);
                inject_caption_numbers(tree);
            });

        self.trees
            .into_iter()
            .zip(self.diagnostics)
            .enumerate()
            .map(|(index, (tree, diags))| {
                let page = &self.site.pages()[index];
                BuiltPage {
                    page_id: page.page_id.clone(),
                    url: page.url.clone(),
                    tree,
                    warnings: diags.into_warnings(),
                }
            })
            .collect()
    }

    pub fn site(&self) -> &MultiPageReferenceState {
        &self.site
    }
}
