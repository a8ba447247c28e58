use std::fmt;

use crate::document::NodeType;
use crate::node::RenderId;

/// A node type was requested under a parent type that may not hold it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeCreationError {
    pub attempted: NodeType,
    pub parent: Option<NodeType>,
}

impl fmt::Display for NodeCreationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent {
            Some(parent) => write!(f, "cannot create {} under {}", self.attempted, parent),
            None => write!(f, "cannot create {} without a parent", self.attempted),
        }
    }
}

impl std::error::Error for NodeCreationError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationshipError {
    /// Only pros and cons can be attached to an extra parent
    NotComparable { child: NodeType },
    /// Pros and cons only weigh options
    InvalidParent { parent: NodeType },
    SelfEdge(RenderId),
    Duplicate { parent: RenderId, child: RenderId },
    WouldCreateCycle { parent: RenderId, child: RenderId },
    UnknownNode(RenderId),
}

impl fmt::Display for RelationshipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipError::NotComparable { child } => {
                write!(f, "a {child} cannot be linked as a pro or con")
            }
            RelationshipError::InvalidParent { parent } => {
                write!(f, "a pro or con can only be linked under an Option, not a {parent}")
            }
            RelationshipError::SelfEdge(id) => write!(f, "node {id} cannot be linked to itself"),
            RelationshipError::Duplicate { parent, child } => {
                write!(f, "node {child} is already linked under node {parent}")
            }
            RelationshipError::WouldCreateCycle { parent, child } => {
                write!(f, "linking node {child} under node {parent} would create a cycle")
            }
            RelationshipError::UnknownNode(id) => write!(f, "node {id} does not exist"),
        }
    }
}

impl std::error::Error for RelationshipError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationReason {
    OutOfRange,
    SelfReference,
    Cycle,
    /// A diff-type parent on a node that is neither a pro nor a con
    NoCrossTypeKind,
}

/// A malformed parent reference found while loading a document
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvariantViolation {
    /// File-order index of the node carrying the bad reference
    pub node: u32,
    pub parent: u32,
    pub reason: ViolationReason,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.reason {
            ViolationReason::OutOfRange => "is out of range",
            ViolationReason::SelfReference => "refers to the node itself",
            ViolationReason::Cycle => "would create a cycle",
            ViolationReason::NoCrossTypeKind => "is a cross-type parent of a node without one",
        };
        write!(
            f,
            "parent index {} of node {} {}; edge skipped",
            self.parent, self.node, reason
        )
    }
}

impl std::error::Error for InvariantViolation {}

/// Everything the editor reports to the user
#[derive(Clone, Debug, PartialEq)]
pub enum EditorError {
    DocumentRead { path: String, message: String },
    DocumentWrite { path: Option<String>, message: String },
    NodeCreation(NodeCreationError),
    Relationship(RelationshipError),
    Invariant(InvariantViolation),
    UnknownNode(RenderId),
    /// Key pressed after Ctrl+M that names no node type
    InvalidShortcut(String),
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::DocumentRead { path, message } => {
                write!(f, "failed to read {path}: {message}")
            }
            EditorError::DocumentWrite {
                path: Some(path),
                message,
            } => write!(f, "failed to write {path}: {message}"),
            EditorError::DocumentWrite {
                path: None,
                message,
            } => write!(f, "failed to save: {message}"),
            EditorError::NodeCreation(err) => write!(f, "{err}"),
            EditorError::Relationship(err) => write!(f, "{err}"),
            EditorError::Invariant(err) => write!(f, "{err}"),
            EditorError::UnknownNode(id) => write!(f, "node {id} does not exist"),
            EditorError::InvalidShortcut(key) => {
                write!(f, "invalid node type shortcut {key}; use d, o, p, c or n")
            }
        }
    }
}

impl std::error::Error for EditorError {}

impl From<NodeCreationError> for EditorError {
    fn from(err: NodeCreationError) -> Self {
        EditorError::NodeCreation(err)
    }
}

impl From<RelationshipError> for EditorError {
    fn from(err: RelationshipError) -> Self {
        EditorError::Relationship(err)
    }
}

impl From<InvariantViolation> for EditorError {
    fn from(err: InvariantViolation) -> Self {
        EditorError::Invariant(err)
    }
}

/// Ordered log of reported errors with an unread marker
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Vec<EditorError>,
    has_new: bool,
}

impl ErrorLog {
    pub fn push(&mut self, err: impl Into<EditorError>) {
        let err = err.into();
        tracing::warn!(error = %err, "editor error");
        self.entries.push(err);
        self.has_new = true;
    }

    pub fn entries(&self) -> &[EditorError] {
        &self.entries
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &EditorError> {
        self.entries.iter().rev()
    }

    pub fn has_new(&self) -> bool {
        self.has_new
    }

    pub fn mark_seen(&mut self) {
        self.has_new = false;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_keeps_order_and_flags_new() {
        let mut log = ErrorLog::default();
        assert!(!log.has_new());

        log.push(NodeCreationError {
            attempted: NodeType::Pro,
            parent: Some(NodeType::Decision),
        });
        log.push(EditorError::UnknownNode(RenderId(4)));
        assert!(log.has_new());
        assert_eq!(log.len(), 2);

        let newest: Vec<_> = log.newest_first().collect();
        assert_eq!(newest[0], &EditorError::UnknownNode(RenderId(4)));

        log.mark_seen();
        assert!(!log.has_new());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_messages() {
        let err = NodeCreationError {
            attempted: NodeType::Pro,
            parent: Some(NodeType::Decision),
        };
        assert_eq!(err.to_string(), "cannot create Pro under Decision");

        let err = NodeCreationError {
            attempted: NodeType::Option,
            parent: None,
        };
        assert_eq!(err.to_string(), "cannot create Option without a parent");

        let err = RelationshipError::InvalidParent {
            parent: NodeType::Decision,
        };
        assert_eq!(
            err.to_string(),
            "a pro or con can only be linked under an Option, not a Decision"
        );
        assert_eq!(
            EditorError::InvalidShortcut("x".to_string()).to_string(),
            "invalid node type shortcut x; use d, o, p, c or n"
        );
    }
}
