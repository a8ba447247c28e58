//! Document model exchanged with the persistence backend.
//!
//! A document is a flat list of nodes in file order. Tree structure is carried by
//! `parent_idxs` (same-type parents) and `parent_idxs_diff_type` (cross-type
//! comparison parents), both expressed as file-order indices.

use serde::{Deserialize, Serialize};

/// Role of a node in the decision tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Decision,
    Option,
    Pro,
    Con,
    Note,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Decision,
        NodeType::Option,
        NodeType::Pro,
        NodeType::Con,
        NodeType::Note,
    ];

    /// Type selected by the letter pressed after the create shortcut
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "d" => Some(NodeType::Decision),
            "o" => Some(NodeType::Option),
            "p" => Some(NodeType::Pro),
            "c" => Some(NodeType::Con),
            "n" => Some(NodeType::Note),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            NodeType::Decision => "d",
            NodeType::Option => "o",
            NodeType::Pro => "p",
            NodeType::Con => "c",
            NodeType::Note => "n",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeType::Decision => "Decision",
            NodeType::Option => "Option",
            NodeType::Pro => "Pro",
            NodeType::Con => "Con",
            NodeType::Note => "Note",
        }
    }

    /// Rank hint used when ordering node kinds top to bottom
    pub fn rank(self) -> u32 {
        match self {
            NodeType::Decision => 0,
            NodeType::Option => 1,
            NodeType::Pro => 2,
            NodeType::Con => 3,
            NodeType::Note => 4,
        }
    }

    /// Fill colour as 0xRRGGBB
    pub fn color(self) -> u32 {
        match self {
            NodeType::Decision => 0xFFAF37, // orange
            NodeType::Option => 0x36A9E2,   // blue
            NodeType::Pro => 0x6FC17C,      // green
            NodeType::Con => 0xF58888,      // red
            NodeType::Note => 0xFFEDB0,     // yellow
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One persisted node, in the backend's wire shape
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub text: String,
    pub file_order: u32,
    pub level: u32,
    #[serde(default)]
    pub parent_idxs: Vec<u32>,
    pub type_is: NodeType,
    #[serde(default)]
    pub parent_idxs_diff_type: Vec<u32>,
}

impl DocumentNode {
    pub fn new(text: impl Into<String>, type_is: NodeType) -> Self {
        Self {
            text: text.into(),
            file_order: 0,
            level: 0,
            parent_idxs: Vec::new(),
            type_is,
            parent_idxs_diff_type: Vec::new(),
        }
    }

    pub fn with_order(mut self, file_order: u32, level: u32) -> Self {
        self.file_order = file_order;
        self.level = level;
        self
    }

    pub fn with_parents(mut self, parent_idxs: Vec<u32>) -> Self {
        self.parent_idxs = parent_idxs;
        self
    }

    pub fn with_diff_type_parents(mut self, parent_idxs_diff_type: Vec<u32>) -> Self {
        self.parent_idxs_diff_type = parent_idxs_diff_type;
        self
    }
}

/// A whole document: its title line and nodes in file order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentBundle {
    pub title: String,
    pub nodes: Vec<DocumentNode>,
}

impl DocumentBundle {
    pub fn new(title: impl Into<String>, nodes: Vec<DocumentNode>) -> Self {
        Self {
            title: title.into(),
            nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape_field_names() {
        let node = DocumentNode::new("Postgres", NodeType::Option)
            .with_order(1, 1)
            .with_parents(vec![0]);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["text"], "Postgres");
        assert_eq!(json["file_order"], 1);
        assert_eq!(json["level"], 1);
        assert_eq!(json["parent_idxs"], serde_json::json!([0]));
        assert_eq!(json["type_is"], "Option");
        assert_eq!(json["parent_idxs_diff_type"], serde_json::json!([]));
    }

    #[test]
    fn test_missing_diff_type_parents_default_to_empty() {
        let node: DocumentNode = serde_json::from_str(
            r#"{"text":"Mature","file_order":2,"level":2,"parent_idxs":[1],"type_is":"Pro"}"#,
        )
        .unwrap();
        assert_eq!(node.type_is, NodeType::Pro);
        assert!(node.parent_idxs_diff_type.is_empty());
    }

    #[test]
    fn test_type_keys() {
        for node_type in NodeType::ALL {
            assert_eq!(NodeType::from_key(node_type.key()), Some(node_type));
        }
        assert_eq!(NodeType::from_key("x"), None);
    }
}
