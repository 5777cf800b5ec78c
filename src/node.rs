//! Document tree IR shared by every engine phase.
//!
//! The upstream parser owns the node vocabulary, so the tree is a single
//! generic `Node` struct keyed by a `type` tag rather than a closed enum.
//! Fields the engine decorates (`enumerator`, `htmlId`, `resolved`, `remote`,
//! `url`, `template`) are defaulted and skipped when absent so the decorated
//! tree round-trips cleanly to the downstream renderer.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// A generic document tree element.
///
/// `enumerated` is tri-state: `Some(false)` opts a node out of numbering,
/// `Some(true)` opts it in, and `None` defers to the numbering config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enumerated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enumerator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Set true only after a cross-reference fill succeeded.
    #[serde(default, skip_serializing_if = "is_false")]
    pub resolved: bool,
    /// True when the reference target lives on another page of the site.
    #[serde(default, skip_serializing_if = "is_false")]
    pub remote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Container kind (`figure`, `table`, ...) or reference variant
    /// (`ref`, `numref`) depending on the node type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Heading depth, 1 through 6.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u8>,
    /// Auto-generated targets (e.g. automatic heading anchors).
    #[serde(default, skip_serializing_if = "is_false")]
    pub implicit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(node_type: &str) -> Self {
        Node {
            node_type: node_type.to_string(),
            ..Default::default()
        }
    }

    pub fn text(value: &str) -> Self {
        Node {
            node_type: "text".to_string(),
            value: Some(value.to_string()),
            ..Default::default()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRAVERSAL PRIMITIVES
// ═══════════════════════════════════════════════════════════════════════════════

/// Visit every node in document order (parent before children), mutably.
pub fn visit_mut<F: FnMut(&mut Node)>(node: &mut Node, f: &mut F) {
    f(node);
    for child in &mut node.children {
        visit_mut(child, f);
    }
}

/// Select all nodes of a given type in document order, the node itself included.
pub fn select_all<'a>(node: &'a Node, node_type: &str) -> Vec<&'a Node> {
    let mut found = Vec::new();
    collect(node, node_type, &mut found);
    found
}

fn collect<'a>(node: &'a Node, node_type: &str, found: &mut Vec<&'a Node>) {
    if node.node_type == node_type {
        found.push(node);
    }
    for child in &node.children {
        collect(child, node_type, found);
    }
}

/// First node of a given type in document order, the node itself included.
pub fn find_first<'a>(node: &'a Node, node_type: &str) -> Option<&'a Node> {
    if node.node_type == node_type {
        return Some(node);
    }
    node.children
        .iter()
        .find_map(|child| find_first(child, node_type))
}

pub fn find_first_mut<'a>(node: &'a mut Node, node_type: &str) -> Option<&'a mut Node> {
    if node.node_type == node_type {
        return Some(node);
    }
    node.children
        .iter_mut()
        .find_map(|child| find_first_mut(child, node_type))
}

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIER NORMALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    static ref LABEL_WHITESPACE: Regex = Regex::new(r"[\t\n\r ]+").unwrap();
    static ref NON_ID_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9-]").unwrap();
    static ref DASH_RUNS: Regex = Regex::new(r"-{2,}").unwrap();
    static ref EDGE_DASHES: Regex = Regex::new(r"(^-+)|(-+$)").unwrap();
}

/// Normalize an authored label into its identifier form: collapse
/// whitespace, trim, lowercase.
pub fn normalize_label(label: &str) -> String {
    LABEL_WHITESPACE
        .replace_all(label, " ")
        .trim()
        .to_lowercase()
}

/// Build an HTML-safe anchor id from an identifier. Invalid characters
/// collapse to single dashes; ids may not start with a digit or a dash.
pub fn create_html_id(identifier: &str) -> String {
    let id = identifier.replace('*', "");
    let id = NON_ID_CHARS.replace_all(&id, "-");
    let id = DASH_RUNS.replace_all(&id, "-");
    let id = EDGE_DASHES.replace_all(&id, "").to_string();
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        format!("id-{}", id)
    } else {
        id
    }
}
