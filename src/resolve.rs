//! Cross-Reference Resolver and Caption Number Injector.
//!
//! Resolution runs strictly after enumeration of the whole tree (and, for
//! sites, of every page) has completed, so forward references are legal.
//! An unresolved reference is never fatal: it renders with the `"??"`
//! sentinel, gets a warning, and the build continues.

use crate::diagnostics::{Diagnostics, WARN_TARGET_NOT_FOUND};
use crate::node::{find_first, find_first_mut, visit_mut, Node};
use crate::state::{ReferenceState, Target, TargetKind};
use crate::templates::{caption_template, default_template, fill_reference_enumerators};

// ═══════════════════════════════════════════════════════════════════════════════
// TARGET LOOKUP
// ═══════════════════════════════════════════════════════════════════════════════

/// A resolved lookup: the target, the state whose numbering config governs
/// its formatting, and the owning page's URL when that page is not the one
/// being resolved.
pub struct ResolvedTarget<'a> {
    pub state: &'a ReferenceState,
    pub target: &'a Target,
    pub remote_url: Option<&'a str>,
}

/// Where the resolver looks targets up: a single page's registry, or a
/// site-wide view that routes to the owning page.
pub trait TargetLookup {
    fn lookup(&self, identifier: &str) -> Option<ResolvedTarget<'_>>;
}

impl TargetLookup for ReferenceState {
    fn lookup(&self, identifier: &str) -> Option<ResolvedTarget<'_>> {
        self.get_target(identifier).map(|target| ResolvedTarget {
            state: self,
            target,
            remote_url: None,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CROSS-REFERENCE RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Whether a reference node is the plain `ref` variant (as opposed to the
/// number-only `numref` variant).
fn is_plain_ref(node: &Node) -> bool {
    node.kind.as_deref().unwrap_or("ref") == "ref"
}

/// Deep-copy a target's caption title: the children of its first
/// `caption > paragraph`, minus any already-injected caption number.
fn caption_title(target: &Node) -> Option<Vec<Node>> {
    let paragraph = find_first(target, "caption").and_then(|c| find_first(c, "paragraph"))?;
    Some(
        paragraph
            .children
            .iter()
            .filter(|child| child.node_type != "captionNumber")
            .cloned()
            .collect(),
    )
}

/// Fill a cross-reference node's content from its resolved target.
///
/// Safe to re-invoke after registry changes (content is regenerated each
/// call), but designed to run exactly once per reference per build.
pub fn resolve_reference_content(
    node: &mut Node,
    lookup: &dyn TargetLookup,
    diags: &mut Diagnostics,
) {
    let Some(identifier) = node.identifier.clone() else {
        return;
    };
    let Some(resolved) = lookup.lookup(&identifier) else {
        diags.warn(
            WARN_TARGET_NOT_FOUND,
            format!("Cross-reference target \"{}\" was not found", identifier),
            node,
        );
        // Render the sentinel so the build can continue; the node stays
        // unresolved.
        let template = node.template.clone().unwrap_or_else(|| "%s".to_string());
        let mut muted = Diagnostics::muted();
        fill_reference_enumerators(node, &template, None, None, &mut muted);
        return;
    };

    let target = resolved.target;
    let enumerator = target.node.enumerator.clone();
    let (template, title) = match &target.kind {
        TargetKind::Heading => {
            // Re-derive from the live numbering config, not from the mere
            // presence of a stored enumerator.
            let enumerated = resolved.state.should_enumerate(&target.node, &target.kind)
                && target.node.enumerated != Some(false);
            (
                default_template(&TargetKind::Heading, enumerated),
                Some(target.node.children.clone()),
            )
        }
        TargetKind::Equation => (default_template(&TargetKind::Equation, true), None),
        kind => {
            let title = caption_title(&target.node);
            if is_plain_ref(node) && node.children.is_empty() {
                if let Some(title) = &title {
                    node.children = title.clone();
                }
            }
            (default_template(kind, enumerator.is_some()), title)
        }
    };
    let target_identifier = target.node.identifier.clone();
    let remote_url = resolved.remote_url.map(str::to_string);

    fill_reference_enumerators(node, &template, enumerator.as_deref(), title.as_deref(), diags);
    node.resolved = true;
    if let Some(identifier) = target_identifier {
        node.identifier = Some(identifier);
    }
    if let Some(url) = remote_url {
        node.remote = true;
        node.url = Some(url);
    }
}

/// Resolution traversal: fill every cross-reference node in the tree.
pub fn resolve_references(tree: &mut Node, lookup: &dyn TargetLookup, diags: &mut Diagnostics) {
    visit_mut(tree, &mut |node| {
        if node.node_type == "crossReference" {
            resolve_reference_content(node, lookup, diags);
        }
    });
}

// ═══════════════════════════════════════════════════════════════════════════════
// CAPTION NUMBER INJECTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Splice a formatted caption number into every enumerated container's
/// caption paragraph. Containers without a caption paragraph are skipped
/// silently; the already-present guard makes the pass idempotent.
pub fn inject_caption_numbers(tree: &mut Node) {
    visit_mut(tree, &mut |node| {
        if node.node_type != "container" {
            return;
        }
        let Some(enumerator) = node.enumerator.clone() else {
            return;
        };
        let Some(kind) = TargetKind::from_node(node) else {
            return;
        };
        let identifier = node.identifier.clone();
        let label = node.label.clone();
        let html_id = node.html_id.clone();
        let template = caption_template(&kind);
        let Some(paragraph) =
            find_first_mut(node, "caption").and_then(|c| find_first_mut(c, "paragraph"))
        else {
            return;
        };
        let already_present = paragraph
            .children
            .first()
            .map(|child| child.node_type == "captionNumber")
            .unwrap_or(false);
        if already_present {
            return;
        }
        let mut marker = Node {
            node_type: "captionNumber".to_string(),
            kind: Some(kind.name().to_string()),
            identifier,
            label,
            html_id,
            ..Default::default()
        };
        // The enumerator is known here, so the fill cannot warn.
        let mut muted = Diagnostics::muted();
        fill_reference_enumerators(&mut marker, &template, Some(&enumerator), None, &mut muted);
        paragraph.children.insert(0, marker);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NumberingOptions;

    fn text_of(node: &Node) -> String {
        let mut out = String::new();
        fn walk(node: &Node, out: &mut String) {
            if let Some(value) = &node.value {
                out.push_str(value);
            }
            for child in &node.children {
                walk(child, out);
            }
        }
        walk(node, &mut out);
        out
    }

    fn figure_with_caption(identifier: &str, caption: &str) -> Node {
        Node {
            node_type: "container".to_string(),
            kind: Some("figure".to_string()),
            identifier: Some(identifier.to_string()),
            children: vec![Node {
                node_type: "caption".to_string(),
                children: vec![Node {
                    node_type: "paragraph".to_string(),
                    children: vec![Node::text(caption)],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn state_with(nodes: &mut [Node]) -> ReferenceState {
        let mut state = ReferenceState::new(NumberingOptions::all_enabled());
        let mut diags = Diagnostics::new();
        for node in nodes {
            state.add_target(node, &mut diags);
        }
        state
    }

    #[test]
    fn test_unknown_target_fills_sentinel() {
        let state = ReferenceState::new(NumberingOptions::all_enabled());
        let mut diags = Diagnostics::new();
        let mut reference = Node {
            node_type: "crossReference".to_string(),
            identifier: Some("nope".to_string()),
            ..Default::default()
        };
        resolve_reference_content(&mut reference, &state, &mut diags);
        assert!(!reference.resolved);
        assert_eq!(text_of(&reference), "??");
        assert!(reference.enumerator.is_none());
        assert_eq!(diags.warnings().len(), 1);
        assert_eq!(diags.warnings()[0].code, WARN_TARGET_NOT_FOUND);
    }

    #[test]
    fn test_figure_numref_fills_number() {
        let mut figure = figure_with_caption("fig1", "A caption");
        let state = state_with(std::slice::from_mut(&mut figure));
        let mut diags = Diagnostics::new();
        let mut reference = Node {
            node_type: "crossReference".to_string(),
            identifier: Some("fig1".to_string()),
            kind: Some("numref".to_string()),
            ..Default::default()
        };
        resolve_reference_content(&mut reference, &state, &mut diags);
        assert!(reference.resolved);
        assert_eq!(text_of(&reference), "Figure 1");
        assert_eq!(reference.enumerator.as_deref(), Some("1"));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_plain_ref_takes_caption_title() {
        let mut figure = figure_with_caption("fig1", "The results");
        let state = state_with(std::slice::from_mut(&mut figure));
        let mut diags = Diagnostics::new();
        let mut reference = Node {
            node_type: "crossReference".to_string(),
            identifier: Some("fig1".to_string()),
            ..Default::default()
        };
        resolve_reference_content(&mut reference, &state, &mut diags);
        assert!(reference.resolved);
        assert_eq!(text_of(&reference), "The results");
    }

    #[test]
    fn test_heading_reference_follows_live_config() {
        let mut heading = Node {
            node_type: "heading".to_string(),
            depth: Some(1),
            identifier: Some("intro".to_string()),
            children: vec![Node::text("Introduction")],
            ..Default::default()
        };
        let state = state_with(std::slice::from_mut(&mut heading));
        let mut diags = Diagnostics::new();
        let mut reference = Node {
            node_type: "crossReference".to_string(),
            identifier: Some("intro".to_string()),
            ..Default::default()
        };
        resolve_reference_content(&mut reference, &state, &mut diags);
        assert_eq!(text_of(&reference), "Section 1");

        // Same target, numbering off: the title is used instead.
        let mut unnumbered = ReferenceState::new(NumberingOptions::default());
        let mut heading = Node {
            node_type: "heading".to_string(),
            depth: Some(1),
            identifier: Some("intro".to_string()),
            children: vec![Node::text("Introduction")],
            ..Default::default()
        };
        unnumbered.add_target(&mut heading, &mut diags);
        let mut reference = Node {
            node_type: "crossReference".to_string(),
            identifier: Some("intro".to_string()),
            ..Default::default()
        };
        resolve_reference_content(&mut reference, &unnumbered, &mut diags);
        assert_eq!(text_of(&reference), "Introduction");
        assert!(reference.resolved);
    }

    #[test]
    fn test_equation_reference_always_parenthesized() {
        let mut math = Node {
            node_type: "math".to_string(),
            identifier: Some("eq1".to_string()),
            ..Default::default()
        };
        let state = state_with(std::slice::from_mut(&mut math));
        let mut diags = Diagnostics::new();
        let mut reference = Node {
            node_type: "crossReference".to_string(),
            identifier: Some("eq1".to_string()),
            ..Default::default()
        };
        resolve_reference_content(&mut reference, &state, &mut diags);
        assert_eq!(text_of(&reference), "(1)");
        assert!(reference.resolved);
    }

    #[test]
    fn test_caption_number_injection_is_guarded() {
        let mut tree = Node::new("root");
        tree.children.push(figure_with_caption("fig1", "A caption"));
        let mut state = ReferenceState::new(NumberingOptions::all_enabled());
        let mut diags = Diagnostics::new();
        crate::state::enumerate_targets(&mut tree, &mut state, &mut diags);

        inject_caption_numbers(&mut tree);
        let paragraph = find_first(&tree, "paragraph").unwrap();
        assert_eq!(paragraph.children[0].node_type, "captionNumber");
        assert_eq!(text_of(&paragraph.children[0]), "Figure 1:");
        assert_eq!(paragraph.children.len(), 2);

        // Second run is a no-op.
        inject_caption_numbers(&mut tree);
        let paragraph = find_first(&tree, "paragraph").unwrap();
        assert_eq!(paragraph.children.len(), 2);
    }

    #[test]
    fn test_caption_injection_skips_captionless_containers() {
        let mut tree = Node::new("root");
        tree.children.push(Node {
            node_type: "container".to_string(),
            kind: Some("figure".to_string()),
            identifier: Some("fig1".to_string()),
            ..Default::default()
        });
        let mut state = ReferenceState::new(NumberingOptions::all_enabled());
        let mut diags = Diagnostics::new();
        crate::state::enumerate_targets(&mut tree, &mut state, &mut diags);
        inject_caption_numbers(&mut tree);
        assert!(find_first(&tree, "captionNumber").is_none());
    }

    #[test]
    fn test_resolver_skips_injected_caption_number_in_title() {
        let mut tree = Node::new("root");
        tree.children.push(figure_with_caption("fig1", "A caption"));
        let mut state = ReferenceState::new(NumberingOptions::all_enabled());
        let mut diags = Diagnostics::new();
        crate::state::enumerate_targets(&mut tree, &mut state, &mut diags);

        // Target snapshot with a caption number already present.
        let mut decorated = figure_with_caption("fig2", "Other caption");
        decorated.enumerator = Some("2".to_string());
        let paragraph = find_first_mut(&mut decorated, "paragraph").unwrap();
        paragraph.children.insert(
            0,
            Node {
                node_type: "captionNumber".to_string(),
                ..Default::default()
            },
        );
        let title = caption_title(&decorated).unwrap();
        assert_eq!(title.len(), 1);
        assert_eq!(title[0].value.as_deref(), Some("Other caption"));
    }
}
