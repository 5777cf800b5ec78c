//! Multi-Page Aggregator: composes one registry per page and routes
//! cross-page lookups.
//!
//! Writes always go to the current page's own registry. Reads fan out:
//! current page first, then a linear scan of all pages in input order.
//! First match wins, so the earlier-indexed page's copy of a duplicated
//! identifier silently shadows the later one. That is a deliberate policy,
//! not a conflict error.

use crate::diagnostics::Diagnostics;
use crate::node::Node;
use crate::resolve::{resolve_reference_content, ResolvedTarget, TargetLookup};
use crate::state::{ReferenceState, Target};

pub struct PageReferenceState {
    pub page_id: String,
    pub url: String,
    pub state: ReferenceState,
}

#[derive(Default)]
pub struct MultiPageReferenceState {
    pages: Vec<PageReferenceState>,
    current: usize,
}

impl MultiPageReferenceState {
    pub fn new() -> Self {
        MultiPageReferenceState::default()
    }

    /// Append a page; returns its index. The first page added becomes the
    /// current page.
    pub fn add_page(&mut self, page_id: &str, url: &str, state: ReferenceState) -> usize {
        self.pages.push(PageReferenceState {
            page_id: page_id.to_string(),
            url: url.to_string(),
            state,
        });
        self.pages.len() - 1
    }

    pub fn set_current(&mut self, index: usize) {
        debug_assert!(index < self.pages.len());
        self.current = index;
    }

    pub fn pages(&self) -> &[PageReferenceState] {
        &self.pages
    }

    pub fn current_page(&self) -> Option<&PageReferenceState> {
        self.pages.get(self.current)
    }

    /// Writes delegate to the current page's own registry only.
    pub fn add_target(&mut self, node: &mut Node, diags: &mut Diagnostics) {
        if let Some(page) = self.pages.get_mut(self.current) {
            page.state.add_target(node, diags);
        }
    }

    pub fn initialize_numbered_heading_depths(&mut self, tree: &Node) {
        if let Some(page) = self.pages.get_mut(self.current) {
            page.state.initialize_numbered_heading_depths(tree);
        }
    }

    fn find(&self, current: usize, identifier: &str) -> Option<(usize, &Target)> {
        if let Some(page) = self.pages.get(current) {
            if let Some(target) = page.state.get_target(identifier) {
                return Some((current, target));
            }
        }
        self.pages.iter().enumerate().find_map(|(index, page)| {
            page.state
                .get_target(identifier)
                .map(|target| (index, target))
        })
    }

    /// Fan-out read from the current page.
    pub fn get_target(&self, identifier: &str) -> Option<&Target> {
        self.find(self.current, identifier).map(|(_, target)| target)
    }

    /// Resolve via the owning page's registry so its numbering config
    /// governs formatting; remote hits are annotated with the owning page's
    /// URL for cross-page hyperlinking.
    pub fn resolve_reference_content(&self, node: &mut Node, diags: &mut Diagnostics) {
        resolve_reference_content(node, &self.view(self.current), diags);
    }

    /// A read-only lookup view anchored at one page. Views borrow the
    /// aggregator, so the resolution phase can hold one view per page
    /// concurrently.
    pub fn view(&self, current: usize) -> PageView<'_> {
        PageView {
            site: self,
            current,
        }
    }
}

pub struct PageView<'a> {
    site: &'a MultiPageReferenceState,
    current: usize,
}

impl TargetLookup for PageView<'_> {
    fn lookup(&self, identifier: &str) -> Option<ResolvedTarget<'_>> {
        let (index, target) = self.site.find(self.current, identifier)?;
        let page = &self.site.pages[index];
        Some(ResolvedTarget {
            state: &page.state,
            target,
            remote_url: (index != self.current).then(|| page.url.as_str()),
        })
    }
}
