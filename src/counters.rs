//! Counter Engine: per-kind monotonic counters plus the 6-slot heading
//! depth vector behind dotted section numbers.
//!
//! ## Key Invariants
//!
//! 1. The heading vector always has exactly six slots.
//! 2. A `None` slot marks a depth that never occurs in the document; it is
//!    never incremented and never rendered.
//! 3. Incrementing depth `d` leaves shallower slots unchanged and resets
//!    deeper (non-`None`) slots to zero.
//! 4. Trailing zero components are trimmed from the rendered string.

use std::collections::HashMap;

use crate::node::{select_all, Node};
use crate::state::TargetKind;

pub const HEADING_DEPTHS: usize = 6;

/// One slot per heading depth; `None` means the depth does not occur.
pub type HeadingCounts = [Option<u32>; HEADING_DEPTHS];

/// Increment the slot for `depth` (1-based) and reset deeper slots.
/// `None` slots are left untouched regardless of position.
pub fn increment_heading_counts(depth: u8, counts: &HeadingCounts) -> HeadingCounts {
    let index = depth.saturating_sub(1) as usize;
    let mut next = *counts;
    for (i, slot) in next.iter_mut().enumerate() {
        let Some(value) = slot else { continue };
        if i == index {
            *value += 1;
        } else if i > index {
            *value = 0;
        }
    }
    next
}

/// Render the vector as a dotted numeral: `None` slots are skipped,
/// trailing zeros trimmed, the rest joined with `.` and passed through the
/// optional `%s` prefix template.
pub fn format_heading_enumerator(counts: &HeadingCounts, prefix: Option<&str>) -> String {
    let mut values: Vec<u32> = counts.iter().filter_map(|slot| *slot).collect();
    while values.last() == Some(&0) {
        values.pop();
    }
    let joined = values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".");
    apply_enumerator_prefix(&joined, prefix)
}

/// Substitute a formatted numeral into the configured prefix template.
pub fn apply_enumerator_prefix(numeral: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(template) => template.replace("%s", numeral),
        None => numeral.to_string(),
    }
}

/// Seed the heading vector from the document: a depth gets `Some(0)` when
/// any heading with `enumerated != false` occurs at it, `None` otherwise.
/// Depth seeding deliberately ignores the per-depth numbering toggles, so a
/// sparse document (say, only depths 1 and 3) never renders misleading zero
/// components for the unused depths.
pub fn initialize_numbered_heading_depths(tree: &Node) -> HeadingCounts {
    let mut counts: HeadingCounts = [None; HEADING_DEPTHS];
    for heading in select_all(tree, "heading") {
        if heading.enumerated == Some(false) {
            continue;
        }
        if let Some(depth) = heading.depth {
            let index = depth.saturating_sub(1) as usize;
            if index < HEADING_DEPTHS {
                counts[index] = Some(0);
            }
        }
    }
    counts
}

// ═══════════════════════════════════════════════════════════════════════════════
// TARGET COUNTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-kind counters for a single document. Non-heading kinds get a flat
/// counter created lazily on first use; headings go through the vector.
#[derive(Debug, Default)]
pub struct TargetCounts {
    kinds: HashMap<TargetKind, u32>,
    pub heading: HeadingCounts,
}

impl TargetCounts {
    pub fn new() -> Self {
        TargetCounts::default()
    }

    /// Advance the flat counter for a non-heading kind; first use yields 1.
    pub fn increment_kind(&mut self, kind: &TargetKind) -> u32 {
        let count = self.kinds.entry(kind.clone()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn get_kind(&self, kind: &TargetKind) -> u32 {
        self.kinds.get(kind).copied().unwrap_or(0)
    }
}
