//! Provenance-attributed warnings.
//!
//! The engine never fails: everything it cannot do becomes either a warning
//! attributed to the offending node or a silent correction. A `Diagnostics`
//! collector stands in for the host's diagnostics sink; `Diagnostics::muted()`
//! is the "no sink attached" case and drops warnings instead of crashing.

use serde::Serialize;

use crate::node::Node;

// ═══════════════════════════════════════════════════════════════════════════════
// WARNING CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const WARN_DUPLICATE_IDENTIFIER: &str = "XR001";
pub const WARN_TARGET_NOT_FOUND: &str = "XR002";
pub const WARN_UNFILLED_ENUMERATOR: &str = "XR003";
pub const WARN_ANCHOR_NOT_FOUND: &str = "XR004";
pub const WARN_DEPRECATED_PLAIN_ANCHOR: &str = "XR005";
pub const WARN_IMPLICIT_REFERENCE: &str = "XR006";

fn get_hint(code: &str) -> &'static str {
    match code {
        WARN_DUPLICATE_IDENTIFIER => {
            "Identifiers must be unique within a document; the first registration wins."
        }
        WARN_TARGET_NOT_FOUND => "Unresolved references render with the \"??\" placeholder.",
        WARN_UNFILLED_ENUMERATOR => "The reference value was filled with \"??\".",
        WARN_ANCHOR_NOT_FOUND => "Internal links must point at a registered identifier.",
        WARN_DEPRECATED_PLAIN_ANCHOR => "Prefix internal references with \"#\".",
        WARN_IMPLICIT_REFERENCE => {
            "Reference an explicit label instead of an auto-generated anchor."
        }
        _ => "Unknown warning.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WARNING RECORD
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub code: String,
    pub message: String,
    /// Type tag of the node the warning is attributed to.
    pub node_type: String,
    pub identifier: Option<String>,
    pub note: Option<String>,
    pub hint: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLECTOR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
    muted: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// A sink that drops every warning. Used when the host attaches no
    /// diagnostics sink; warnings must be suppressed, never fatal.
    pub fn muted() -> Self {
        Diagnostics {
            warnings: Vec::new(),
            muted: true,
        }
    }

    pub fn warn(&mut self, code: &str, message: impl Into<String>, node: &Node) {
        self.warn_with_note(code, message, node, None);
    }

    pub fn warn_with_note(
        &mut self,
        code: &str,
        message: impl Into<String>,
        node: &Node,
        note: Option<String>,
    ) {
        if self.muted {
            return;
        }
        self.warnings.push(Warning {
            code: code.to_string(),
            message: message.into(),
            node_type: node.node_type.clone(),
            identifier: node.identifier.clone().or_else(|| node.label.clone()),
            note,
            hint: get_hint(code).to_string(),
        });
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_attribution() {
        let mut diags = Diagnostics::new();
        let node = Node {
            node_type: "crossReference".to_string(),
            identifier: Some("fig1".to_string()),
            ..Default::default()
        };
        diags.warn(WARN_TARGET_NOT_FOUND, "missing", &node);
        assert_eq!(diags.warnings().len(), 1);
        let warning = &diags.warnings()[0];
        assert_eq!(warning.code, WARN_TARGET_NOT_FOUND);
        assert_eq!(warning.node_type, "crossReference");
        assert_eq!(warning.identifier.as_deref(), Some("fig1"));
    }

    #[test]
    fn test_muted_sink_drops_warnings() {
        let mut diags = Diagnostics::muted();
        diags.warn(WARN_TARGET_NOT_FOUND, "missing", &Node::new("crossReference"));
        assert!(diags.is_empty());
    }
}
