//! Link Promoter: rewrites in-document hash-links into typed
//! cross-reference nodes ahead of the resolution traversal.
//!
//! A `#`-prefixed URL is an explicit internal reference: a miss is warned.
//! A bare URL is only promoted when it happens to match a registered
//! target; a miss is assumed to be an external link and left untouched.

use crate::diagnostics::{
    Diagnostics, WARN_ANCHOR_NOT_FOUND, WARN_DEPRECATED_PLAIN_ANCHOR, WARN_IMPLICIT_REFERENCE,
};
use crate::node::{normalize_label, visit_mut, Node};
use crate::state::ReferenceState;

/// Promote every internal hyperlink in the tree against the page's own
/// registry. Promotion mutates the link node in place: it is retyped to a
/// cross-reference and loses its `kind` and `url` fields.
pub fn promote_internal_links(tree: &mut Node, state: &ReferenceState, diags: &mut Diagnostics) {
    visit_mut(tree, &mut |node| {
        if node.node_type == "link" {
            promote_link(node, state, diags);
        }
    });
}

fn promote_link(node: &mut Node, state: &ReferenceState, diags: &mut Diagnostics) {
    let Some(url) = node.url.clone() else {
        return;
    };
    let explicit = url.starts_with('#');
    let raw = if explicit { &url[1..] } else { url.as_str() };

    // Raw value first, then the normalized form.
    let target = state
        .get_target(raw)
        .or_else(|| state.get_target(&normalize_label(raw)));
    let Some(target) = target else {
        if explicit {
            diags.warn(
                WARN_ANCHOR_NOT_FOUND,
                format!("No target for internal reference \"{}\"", url),
                node,
            );
        }
        // Bare unresolved links are assumed external.
        return;
    };

    if !explicit {
        diags.warn_with_note(
            WARN_DEPRECATED_PLAIN_ANCHOR,
            format!("Link target \"{}\" should be written as \"#{}\"", url, raw),
            node,
            Some("Bare internal link syntax is deprecated.".to_string()),
        );
    }
    if target.node.implicit {
        diags.warn(
            WARN_IMPLICIT_REFERENCE,
            format!(
                "Link \"{}\" resolves to an auto-generated anchor; prefer an explicit reference",
                url
            ),
            node,
        );
    }

    node.node_type = "crossReference".to_string();
    node.identifier = target.node.identifier.clone();
    node.label = target
        .node
        .label
        .clone()
        .or_else(|| target.node.identifier.clone());
    node.kind = None;
    node.url = None;
}
