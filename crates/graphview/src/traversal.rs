//! Keyboard traversal of the selection.
//!
//! The traverser caches a window around the selected node (its anchoring parent and its
//! siblings on either side) so repeated sideways moves walk a stable sequence. When a
//! node has several parents, the parent we last descended from anchors the window.

use std::collections::VecDeque;

use crate::graph::GraphModel;
use crate::node::RenderId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraversalWindow {
    pub current: RenderId,
    pub parent: Option<RenderId>,
    /// Nearest sibling first
    pub left: VecDeque<RenderId>,
    /// Nearest sibling first
    pub right: VecDeque<RenderId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
    Left,
    Right,
}

#[derive(Debug, Default)]
pub struct SelectionTraverser {
    window: Option<TraversalWindow>,
    last_depth_change_parent: Option<RenderId>,
    /// Child we just moved up from, preferred by the next move down
    ascended_from: Option<RenderId>,
}

impl SelectionTraverser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<RenderId> {
        self.window.as_ref().map(|w| w.current)
    }

    pub fn window(&self) -> Option<&TraversalWindow> {
        self.window.as_ref()
    }

    pub fn last_depth_change_parent(&self) -> Option<RenderId> {
        self.last_depth_change_parent
    }

    pub fn select(&mut self, model: &GraphModel, id: Option<RenderId>) {
        match id {
            None => self.clear(),
            Some(id) if self.current() == Some(id) => {}
            Some(id) => {
                self.ascended_from = None;
                self.populate_from(model, id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.window = None;
        self.last_depth_change_parent = None;
        self.ascended_from = None;
    }

    /// Rebuild the window after the model changed underneath it
    pub fn refresh(&mut self, model: &GraphModel) {
        match self.current() {
            Some(id) if model.contains(id) => self.populate_from(model, id),
            Some(_) => self.clear(),
            None => {}
        }
        if self
            .last_depth_change_parent
            .is_some_and(|p| !model.contains(p))
        {
            self.last_depth_change_parent = None;
        }
    }

    pub fn step(&mut self, model: &GraphModel, direction: Direction) -> Option<RenderId> {
        match direction {
            Direction::Down => self.move_down(model),
            Direction::Up => self.move_up(model),
            Direction::Left => self.move_left(model),
            Direction::Right => self.move_right(model),
        }
    }

    /// Select the first child, or the child we last came up from
    pub fn move_down(&mut self, model: &GraphModel) -> Option<RenderId> {
        let Some(current) = self.current() else {
            return self.start(model);
        };
        let children = model.children(current);
        let target = self
            .ascended_from
            .filter(|c| children.contains(c))
            .or_else(|| children.first().copied());
        if let Some(target) = target {
            self.last_depth_change_parent = Some(current);
            self.ascended_from = None;
            self.populate_from(model, target);
        }
        self.current()
    }

    pub fn move_up(&mut self, model: &GraphModel) -> Option<RenderId> {
        let Some(window) = &self.window else {
            return self.start(model);
        };
        let current = window.current;
        if let Some(parent) = window.parent {
            self.populate_from(model, parent);
            self.ascended_from = Some(current);
        }
        self.current()
    }

    pub fn move_left(&mut self, model: &GraphModel) -> Option<RenderId> {
        let Some(window) = &mut self.window else {
            return self.start(model);
        };
        if let Some(target) = window.left.pop_front() {
            self.ascended_from = None;
            self.populate_from(model, target);
        }
        self.current()
    }

    pub fn move_right(&mut self, model: &GraphModel) -> Option<RenderId> {
        let Some(window) = &mut self.window else {
            return self.start(model);
        };
        if let Some(target) = window.right.pop_front() {
            self.ascended_from = None;
            self.populate_from(model, target);
        }
        self.current()
    }

    /// With nothing selected, a move lands on the first root
    fn start(&mut self, model: &GraphModel) -> Option<RenderId> {
        let root = model.roots().first().copied();
        if let Some(root) = root {
            self.populate_from(model, root);
        }
        self.current()
    }

    fn populate_from(&mut self, model: &GraphModel, id: RenderId) {
        if !model.contains(id) {
            self.window = None;
            return;
        }

        let mut parents: Vec<RenderId> = Vec::new();
        for parent in model.parents(id) {
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }
        if let Some(anchor) = self.last_depth_change_parent {
            if let Some(pos) = parents.iter().position(|p| *p == anchor) {
                let anchor = parents.remove(pos);
                parents.insert(0, anchor);
            }
        }

        let siblings: Vec<RenderId> = if parents.is_empty() {
            model.roots()
        } else {
            let mut siblings = Vec::new();
            for parent in &parents {
                for child in model.children(*parent) {
                    if !siblings.contains(&child) {
                        siblings.push(child);
                    }
                }
            }
            siblings
        };

        let (left, right) = match siblings.iter().position(|s| *s == id) {
            Some(split) => (
                siblings[..split].iter().rev().copied().collect(),
                siblings[split + 1..].iter().copied().collect(),
            ),
            None => (VecDeque::new(), VecDeque::new()),
        };

        tracing::debug!(current = %id, parent = ?parents.first(), "traversal window rebuilt");
        self.window = Some(TraversalWindow {
            current: id,
            parent: parents.first().copied(),
            left,
            right,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentBundle, DocumentNode, NodeType};

    /// 0 Decision
    /// ├─ 1 Option ── 3 Pro, 4 Con
    /// └─ 2 Option ── 5 Pro, and 4 as a cross-type parent
    /// 6 Decision
    fn model() -> GraphModel {
        let bundle = DocumentBundle::new(
            "t",
            vec![
                DocumentNode::new("Pick DB", NodeType::Decision),
                DocumentNode::new("Postgres", NodeType::Option).with_parents(vec![0]),
                DocumentNode::new("Sqlite", NodeType::Option).with_parents(vec![0]),
                DocumentNode::new("Mature", NodeType::Pro).with_parents(vec![1]),
                DocumentNode::new("Heavy", NodeType::Con)
                    .with_parents(vec![1])
                    .with_diff_type_parents(vec![2]),
                DocumentNode::new("Embedded", NodeType::Pro).with_parents(vec![2]),
                DocumentNode::new("Pick host", NodeType::Decision),
            ],
        );
        let (model, violations) = GraphModel::from_bundle(&bundle);
        assert!(violations.is_empty());
        model
    }

    #[test]
    fn test_first_move_selects_first_root() {
        let model = model();
        let mut traverser = SelectionTraverser::new();
        assert_eq!(traverser.move_down(&model), Some(RenderId(0)));
    }

    #[test]
    fn test_root_siblings_are_other_roots() {
        let model = model();
        let mut traverser = SelectionTraverser::new();
        traverser.select(&model, Some(RenderId(0)));
        let window = traverser.window().unwrap();
        assert_eq!(window.parent, None);
        assert!(window.left.is_empty());
        assert_eq!(window.right, VecDeque::from(vec![RenderId(6)]));

        assert_eq!(traverser.move_right(&model), Some(RenderId(6)));
        assert_eq!(traverser.move_left(&model), Some(RenderId(0)));
        assert_eq!(traverser.move_up(&model), Some(RenderId(0)));
    }

    #[test]
    fn test_siblings_split_nearest_first() {
        let model = model();
        let mut traverser = SelectionTraverser::new();
        traverser.select(&model, Some(RenderId(4)));
        let window = traverser.window().unwrap();
        // Parents in edge order are 1 then 2; siblings 3, 4, 5
        assert_eq!(window.parent, Some(RenderId(1)));
        assert_eq!(window.left, VecDeque::from(vec![RenderId(3)]));
        assert_eq!(window.right, VecDeque::from(vec![RenderId(5)]));
    }

    #[test]
    fn test_down_then_sideways() {
        let model = model();
        let mut traverser = SelectionTraverser::new();
        traverser.select(&model, Some(RenderId(0)));
        assert_eq!(traverser.move_down(&model), Some(RenderId(1)));
        assert_eq!(traverser.move_right(&model), Some(RenderId(2)));
        assert_eq!(traverser.move_right(&model), Some(RenderId(2)));
        assert_eq!(traverser.move_down(&model), Some(RenderId(4)));
        assert_eq!(traverser.move_down(&model), Some(RenderId(4)));
    }

    #[test]
    fn test_multi_parent_round_trip_is_stable() {
        let model = model();
        let mut traverser = SelectionTraverser::new();
        traverser.select(&model, Some(RenderId(2)));

        // Entering node 4 from its cross-type parent anchors the window on 2
        assert_eq!(traverser.move_down(&model), Some(RenderId(4)));
        assert_eq!(traverser.last_depth_change_parent(), Some(RenderId(2)));
        assert_eq!(traverser.window().unwrap().parent, Some(RenderId(2)));

        assert_eq!(traverser.move_up(&model), Some(RenderId(2)));
        assert_eq!(traverser.move_down(&model), Some(RenderId(4)));
        assert_eq!(traverser.move_up(&model), Some(RenderId(2)));
    }

    #[test]
    fn test_down_returns_to_child_we_came_from() {
        let model = model();
        let mut traverser = SelectionTraverser::new();
        traverser.select(&model, Some(RenderId(5)));
        assert_eq!(traverser.move_up(&model), Some(RenderId(2)));
        assert_eq!(traverser.move_down(&model), Some(RenderId(5)));
    }

    #[test]
    fn test_refresh_drops_removed_selection() {
        let mut model = model();
        let mut traverser = SelectionTraverser::new();
        traverser.select(&model, Some(RenderId(3)));
        model.remove_subtree(RenderId(1)).unwrap();
        traverser.refresh(&model);
        assert_eq!(traverser.current(), None);
    }

    #[test]
    fn test_refresh_rebuilds_window_after_insert() {
        let mut model = model();
        let mut traverser = SelectionTraverser::new();
        traverser.select(&model, Some(RenderId(5)));
        let note = model.add_node(NodeType::Note, Some(RenderId(2))).unwrap();
        traverser.refresh(&model);
        assert_eq!(traverser.move_right(&model), Some(note));
    }
}
