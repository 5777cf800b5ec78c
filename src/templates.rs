//! Template Formatter: token substitution producing display text for
//! cross-references and caption numbers.
//!
//! Three tokens are recognized: `%s` and `{number}` substitute the target's
//! enumerator, `{name}` substitutes the target's title (as spliced nodes
//! when the resolver supplies them, else the node's label or identifier).
//! A reference without a known enumerator is filled with the `"??"`
//! sentinel and warned about, never dropped.

use lazy_static::lazy_static;
use regex::Regex;

use crate::diagnostics::{Diagnostics, WARN_UNFILLED_ENUMERATOR};
use crate::node::Node;
use crate::state::TargetKind;

/// Sentinel rendered in place of an enumerator that could not be resolved.
pub const UNKNOWN_REFERENCE_ENUMERATOR: &str = "??";

lazy_static! {
    static ref NUMERAL_TOKENS: Regex = Regex::new(r"%s|\{number\}").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULT TEMPLATES
// ═══════════════════════════════════════════════════════════════════════════════

fn title_case(kind: &str) -> String {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Default display template for a kind. `numbered` selects between the
/// enumerated variant and the `{name}` fallback; equations are always
/// numbered and have no unnumbered variant.
pub fn default_template(kind: &TargetKind, numbered: bool) -> String {
    match kind {
        TargetKind::Equation => "(%s)".to_string(),
        TargetKind::Heading if numbered => "Section %s".to_string(),
        TargetKind::Figure if numbered => "Figure %s".to_string(),
        TargetKind::Table if numbered => "Table %s".to_string(),
        TargetKind::Code if numbered => "Program %s".to_string(),
        TargetKind::Other(name) if numbered => format!("{} %s", title_case(name)),
        _ => "{name}".to_string(),
    }
}

/// Caption-number variant: the numbered template with a `:` suffix.
pub fn caption_template(kind: &TargetKind) -> String {
    format!("{}:", default_template(kind, true))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN SUBSTITUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Fill a reference node's content from a template.
///
/// Empty nodes are seeded with the literal template text so substitution has
/// content to operate on. `title` nodes, when present, are spliced in place
/// of the `{name}` token; otherwise `{name}` falls back to the node's label,
/// then its identifier, else the token is left verbatim.
pub fn fill_reference_enumerators(
    node: &mut Node,
    template: &str,
    enumerator: Option<&str>,
    title: Option<&[Node]>,
    diags: &mut Diagnostics,
) {
    if node.children.is_empty() {
        node.children.push(Node::text(template));
    }
    let numeral = enumerator.unwrap_or(UNKNOWN_REFERENCE_ENUMERATOR).to_string();
    node.template = Some(template.to_string());
    if numeral != UNKNOWN_REFERENCE_ENUMERATOR {
        node.enumerator = Some(numeral.clone());
    }
    let fallback = node.label.clone().or_else(|| node.identifier.clone());
    substitute_tokens(&mut node.children, &numeral, title, fallback.as_deref());
    if numeral == UNKNOWN_REFERENCE_ENUMERATOR {
        let tokens: Vec<&str> = NUMERAL_TOKENS
            .find_iter(template)
            .map(|m| m.as_str())
            .collect();
        if !tokens.is_empty() {
            diags.warn_with_note(
                WARN_UNFILLED_ENUMERATOR,
                format!(
                    "Unfilled token(s) {} in reference template \"{}\"",
                    tokens.join(", "),
                    template
                ),
                node,
                Some("The reference value was filled with \"??\".".to_string()),
            );
        }
    }
}

fn substitute_tokens(
    children: &mut Vec<Node>,
    numeral: &str,
    title: Option<&[Node]>,
    fallback: Option<&str>,
) {
    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    for mut child in children.drain(..) {
        if child.node_type != "text" {
            substitute_tokens(&mut child.children, numeral, title, fallback);
            out.push(child);
            continue;
        }
        let mut value = child.value.take().unwrap_or_default();
        value = value.replace("%s", numeral).replace("{number}", numeral);
        if value.contains("{name}") {
            if let Some(title) = title {
                // Splice at every occurrence, not just the first.
                let mut rest = value.as_str();
                while let Some((before, after)) = rest.split_once("{name}") {
                    if !before.is_empty() {
                        out.push(Node::text(before));
                    }
                    out.extend(title.iter().cloned());
                    rest = after;
                }
                if !rest.is_empty() {
                    out.push(Node::text(rest));
                }
                continue;
            }
            if let Some(name) = fallback {
                value = value.replace("{name}", name);
            }
        }
        child.value = Some(value);
        out.push(child);
    }
    *children = out;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(node: &Node) -> String {
        node.children
            .iter()
            .filter_map(|child| child.value.clone())
            .collect()
    }

    #[test]
    fn test_seeds_empty_children_with_template() {
        let mut diags = Diagnostics::new();
        let mut node = Node::new("crossReference");
        fill_reference_enumerators(&mut node, "Figure %s", Some("3"), None, &mut diags);
        assert_eq!(text_of(&node), "Figure 3");
        assert_eq!(node.template.as_deref(), Some("Figure %s"));
        assert_eq!(node.enumerator.as_deref(), Some("3"));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_number_token_substitution() {
        let mut diags = Diagnostics::new();
        let mut node = Node::new("crossReference");
        node.children.push(Node::text("See item {number} above"));
        fill_reference_enumerators(&mut node, "{number}", Some("2.1"), None, &mut diags);
        assert_eq!(text_of(&node), "See item 2.1 above");
    }

    #[test]
    fn test_name_fallback_chain() {
        let mut diags = Diagnostics::new();
        let mut node = Node::new("crossReference");
        node.label = Some("My Figure".to_string());
        node.identifier = Some("fig1".to_string());
        fill_reference_enumerators(&mut node, "{name}", None, None, &mut diags);
        assert_eq!(text_of(&node), "My Figure");
        // No numeral token in the template, so the sentinel stays silent.
        assert!(diags.is_empty());
        assert!(node.enumerator.is_none());

        let mut node = Node::new("crossReference");
        node.identifier = Some("fig1".to_string());
        fill_reference_enumerators(&mut node, "{name}", None, None, &mut diags);
        assert_eq!(text_of(&node), "fig1");
    }

    #[test]
    fn test_name_splices_title_nodes() {
        let mut diags = Diagnostics::new();
        let mut node = Node::new("crossReference");
        let title = vec![Node::text("The "), Node::text("Results")];
        fill_reference_enumerators(&mut node, "{name}", None, Some(&title), &mut diags);
        assert_eq!(node.children.len(), 2);
        assert_eq!(text_of(&node), "The Results");
    }

    #[test]
    fn test_name_splices_every_occurrence() {
        let mut diags = Diagnostics::new();
        let mut node = Node::new("crossReference");
        node.children.push(Node::text("{name} (see {name})"));
        let title = vec![Node::text("Results")];
        fill_reference_enumerators(&mut node, "{name}", None, Some(&title), &mut diags);
        assert_eq!(text_of(&node), "Results (see Results)");
    }

    #[test]
    fn test_sentinel_warns_and_names_tokens() {
        let mut diags = Diagnostics::new();
        let mut node = Node::new("crossReference");
        node.identifier = Some("eq-lost".to_string());
        fill_reference_enumerators(&mut node, "(%s)", None, None, &mut diags);
        assert_eq!(text_of(&node), "(??)");
        assert!(node.enumerator.is_none());
        assert_eq!(diags.warnings().len(), 1);
        let warning = &diags.warnings()[0];
        assert_eq!(warning.code, WARN_UNFILLED_ENUMERATOR);
        assert!(warning.message.contains("%s"));
        assert_eq!(warning.identifier.as_deref(), Some("eq-lost"));
    }

    #[test]
    fn test_default_templates() {
        assert_eq!(default_template(&TargetKind::Heading, true), "Section %s");
        assert_eq!(default_template(&TargetKind::Heading, false), "{name}");
        assert_eq!(default_template(&TargetKind::Equation, false), "(%s)");
        assert_eq!(default_template(&TargetKind::Code, true), "Program %s");
        assert_eq!(
            default_template(&TargetKind::Other("proof".to_string()), true),
            "Proof %s"
        );
        assert_eq!(caption_template(&TargetKind::Table), "Table %s:");
    }
}
