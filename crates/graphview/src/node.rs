use crate::document::{DocumentNode, NodeType};

/// Session-local identifier of a graph vertex. Reset on every load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderId(pub u32);

impl std::fmt::Display for RenderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Visual class of a node: its type, plus whether it is referenced from
/// opposing branches (mixed incoming edge kinds).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StyleClass {
    pub node_type: NodeType,
    pub comparative: bool,
}

impl StyleClass {
    pub fn name(&self) -> String {
        if self.comparative {
            format!("{}-comparative", self.node_type.label().to_lowercase())
        } else {
            self.node_type.label().to_lowercase()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
    pub id: RenderId,
    pub data: DocumentNode,
    /// Centre of the node, as computed by layout
    pub position: Position,
    /// Measured box size, as fed to layout
    pub size: Size,
    pub style: StyleClass,
}

impl RenderNode {
    pub fn new(id: RenderId, data: DocumentNode) -> Self {
        let style = StyleClass {
            node_type: data.type_is,
            comparative: false,
        };
        Self {
            id,
            data,
            position: Position::default(),
            size: Size::default(),
            style,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.data.type_is
    }

    pub fn text(&self) -> &str {
        &self.data.text
    }

    /// Top-left corner derived from the centre position
    pub fn origin(&self) -> Position {
        Position {
            x: self.position.x - self.size.width / 2.0,
            y: self.position.y - self.size.height / 2.0,
        }
    }
}
