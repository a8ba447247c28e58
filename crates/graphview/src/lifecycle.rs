//! Creation and removal rules for decision nodes.

use crate::document::NodeType;
use crate::edge::{EdgeKind, RenderEdge};
use crate::error::{EditorError, NodeCreationError, RelationshipError};
use crate::graph::{GraphModel, Removal};
use crate::node::RenderId;

/// Kind of link made from the node context menu
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationKind {
    Pro,
    Con,
}

impl RelationKind {
    pub fn edge_kind(self) -> EdgeKind {
        match self {
            RelationKind::Pro => EdgeKind::Pro,
            RelationKind::Con => EdgeKind::Con,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RelationKind::Pro => "Make Pro for...",
            RelationKind::Con => "Make Con for...",
        }
    }
}

/// Whether a node of type `new` may be created under `parent`.
///
/// Decisions are roots, options hang off decisions, pros and cons off options, and
/// notes go anywhere.
pub fn can_create(new: NodeType, parent: Option<NodeType>) -> bool {
    match (new, parent) {
        (NodeType::Note, _) => true,
        (NodeType::Decision, None) => true,
        (NodeType::Option, Some(NodeType::Decision)) => true,
        (NodeType::Pro | NodeType::Con, Some(NodeType::Option)) => true,
        _ => false,
    }
}

pub fn check_compatibility(
    new: NodeType,
    parent: Option<NodeType>,
) -> Result<(), NodeCreationError> {
    if can_create(new, parent) {
        Ok(())
    } else {
        Err(NodeCreationError {
            attempted: new,
            parent,
        })
    }
}

/// Validate and add a node. Nothing changes when validation fails.
pub fn create_node(
    model: &mut GraphModel,
    node_type: NodeType,
    parent: Option<RenderId>,
) -> Result<RenderId, EditorError> {
    let parent_type = match parent {
        Some(id) => Some(
            model
                .node(id)
                .ok_or(EditorError::UnknownNode(id))?
                .node_type(),
        ),
        None => None,
    };
    check_compatibility(node_type, parent_type)?;
    model.add_node(node_type, parent)
}

/// Attach `child` (a pro or con) under an additional option `parent` with the given kind.
///
/// The edge must keep the graph acyclic and must not duplicate an existing link.
pub fn create_relationship(
    model: &mut GraphModel,
    parent: RenderId,
    child: RenderId,
    kind: RelationKind,
) -> Result<(), RelationshipError> {
    let parent_type = model
        .node(parent)
        .ok_or(RelationshipError::UnknownNode(parent))?
        .node_type();
    let child_type = model
        .node(child)
        .ok_or(RelationshipError::UnknownNode(child))?
        .node_type();
    if !matches!(child_type, NodeType::Pro | NodeType::Con) {
        return Err(RelationshipError::NotComparable { child: child_type });
    }
    if parent == child {
        return Err(RelationshipError::SelfEdge(child));
    }
    if parent_type != NodeType::Option {
        return Err(RelationshipError::InvalidParent {
            parent: parent_type,
        });
    }
    if model.has_edge(parent, child) {
        return Err(RelationshipError::Duplicate { parent, child });
    }
    if model.reaches(child, parent) {
        return Err(RelationshipError::WouldCreateCycle { parent, child });
    }

    model.add_edge(RenderEdge::new(parent, child, kind.edge_kind()));
    tracing::debug!(%parent, %child, ?kind, "relationship created");
    Ok(())
}

pub fn remove_node(model: &mut GraphModel, id: RenderId) -> Result<Removal, EditorError> {
    model.remove_subtree(id)
}

/// Replace a node's text. Its box size changes, so callers relayout afterwards.
pub fn edit_text(
    model: &mut GraphModel,
    id: RenderId,
    text: impl Into<String>,
) -> Result<(), EditorError> {
    let text = text.into();
    tracing::debug!(%id, len = text.len(), "text edited");
    model.set_text(id, text)
}
