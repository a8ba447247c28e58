use crate::document::NodeType;
use crate::node::RenderId;

/// Relationship carried by an edge, used for stroke colour and for telling tree edges
/// apart from cross-type comparison edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    #[default]
    Default,
    Pro,
    Con,
}

impl EdgeKind {
    /// Kind of a tree edge leading into a node of this type
    pub fn natural(child: NodeType) -> Self {
        match child {
            NodeType::Pro => EdgeKind::Pro,
            NodeType::Con => EdgeKind::Con,
            _ => EdgeKind::Default,
        }
    }

    /// Kind of a comparison edge leading into a node of this type, if the type has one
    pub fn cross_type(child: NodeType) -> Option<Self> {
        match child {
            NodeType::Pro => Some(EdgeKind::Con),
            NodeType::Con => Some(EdgeKind::Pro),
            _ => None,
        }
    }

    /// Stroke colour as 0xRRGGBB
    pub fn stroke(self) -> u32 {
        match self {
            EdgeKind::Pro => 0x90EE90,
            EdgeKind::Con => 0xFFB6B6,
            EdgeKind::Default => 0x666666,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderEdge {
    pub source: RenderId,
    pub target: RenderId,
    pub kind: EdgeKind,
}

impl RenderEdge {
    pub fn new(source: RenderId, target: RenderId, kind: EdgeKind) -> Self {
        Self {
            source,
            target,
            kind,
        }
    }

    pub fn touches(&self, id: RenderId) -> bool {
        self.source == id || self.target == id
    }

    /// Whether this edge is a tree edge for a child of `child_type`
    pub fn is_same_type(&self, child_type: NodeType) -> bool {
        self.kind == EdgeKind::natural(child_type)
    }
}
