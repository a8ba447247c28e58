//! What the session hands to whatever draws the canvas.

use crate::edge::RenderEdge;
use crate::lifecycle::RelationKind;
use crate::node::{RenderId, RenderNode};

/// Node whose text is being edited, with the uncommitted buffer
#[derive(Clone, Debug, PartialEq)]
pub struct EditingNode {
    pub node: RenderId,
    pub buffer: String,
}

/// A pro or con waiting for the user to click its new parent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingLink {
    pub child: RenderId,
    pub kind: RelationKind,
}

/// Full snapshot of the canvas after a layout pass
#[derive(Clone, Debug, PartialEq)]
pub struct RenderFrame {
    pub title: String,
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    pub selected: Option<RenderId>,
    pub editing: Option<EditingNode>,
    pub pending_link: Option<PendingLink>,
    /// False while an import is in flight
    pub interactive: bool,
    /// Apply the frame first, then move keyboard focus to this node's editor
    pub focus_editor: Option<RenderId>,
}

impl RenderFrame {
    pub fn node(&self, id: RenderId) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Text to draw for a node, taking an open edit buffer into account
    pub fn display_text(&self, id: RenderId) -> Option<&str> {
        match &self.editing {
            Some(editing) if editing.node == id => Some(editing.buffer.as_str()),
            _ => self.node(id).map(|n| n.text()),
        }
    }
}

pub trait RenderSink {
    fn render_graph(&mut self, frame: RenderFrame);
}

/// Keeps only the most recent frame, for sinks that repaint on their own schedule
#[derive(Debug, Default)]
pub struct LatestFrame {
    frame: Option<RenderFrame>,
    focus: Option<RenderId>,
}

impl LatestFrame {
    pub fn frame(&self) -> Option<&RenderFrame> {
        self.frame.as_ref()
    }

    /// Pending focus request, cleared once taken
    pub fn take_focus(&mut self) -> Option<RenderId> {
        self.focus.take()
    }
}

impl RenderSink for LatestFrame {
    fn render_graph(&mut self, frame: RenderFrame) {
        if frame.focus_editor.is_some() {
            self.focus = frame.focus_editor;
        }
        self.frame = Some(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentNode, NodeType};

    fn frame(focus: Option<RenderId>) -> RenderFrame {
        RenderFrame {
            title: "t".to_string(),
            nodes: vec![RenderNode::new(
                RenderId(0),
                DocumentNode::new("Pick DB", NodeType::Decision),
            )],
            edges: Vec::new(),
            selected: None,
            editing: None,
            pending_link: None,
            interactive: true,
            focus_editor: focus,
        }
    }

    #[test]
    fn test_display_text_prefers_edit_buffer() {
        let mut frame = frame(None);
        assert_eq!(frame.display_text(RenderId(0)), Some("Pick DB"));
        frame.editing = Some(EditingNode {
            node: RenderId(0),
            buffer: "Pick a DB".to_string(),
        });
        assert_eq!(frame.display_text(RenderId(0)), Some("Pick a DB"));
        assert_eq!(frame.display_text(RenderId(5)), None);
    }

    #[test]
    fn test_latest_frame_keeps_focus_until_taken() {
        let mut sink = LatestFrame::default();
        sink.render_graph(frame(Some(RenderId(0))));
        sink.render_graph(frame(None));
        assert!(sink.frame().is_some());
        assert_eq!(sink.take_focus(), Some(RenderId(0)));
        assert_eq!(sink.take_focus(), None);
    }
}
