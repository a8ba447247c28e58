//! Canonical in-memory graph of a decision document.
//!
//! The model owns every [`RenderNode`] and [`RenderEdge`]. Other components refer to
//! vertices by [`RenderId`] only. Edge order is insertion order and is significant: it
//! fixes child order for traversal and for the depth-first export.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::document::{DocumentBundle, DocumentNode, NodeType};
use crate::edge::{EdgeKind, RenderEdge};
use crate::error::{EditorError, InvariantViolation, ViolationReason};
use crate::node::{RenderId, RenderNode};

type Adjacency = HashMap<RenderId, Vec<RenderId>>;

/// Outcome of a cascading removal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Removal {
    /// Removed ids in depth-first order, starting with the requested root
    pub removed: Vec<RenderId>,
    /// Node that should be selected next
    pub select: Option<RenderId>,
}

#[derive(Debug, Default)]
pub struct GraphModel {
    title: String,
    nodes: BTreeMap<RenderId, RenderNode>,
    edges: Vec<RenderEdge>,
    next_id: u32,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh model from a document, returning the references that were skipped
    pub fn from_bundle(bundle: &DocumentBundle) -> (Self, Vec<InvariantViolation>) {
        let mut model = Self::new();
        let violations = model.load(bundle);
        (model, violations)
    }

    /// Replace the whole model with the given document.
    ///
    /// Render ids are assigned in input order starting from zero, so right after a load
    /// a node's render id equals its position in `bundle.nodes`. Parent references that
    /// are out of range, point at the node itself, would close a cycle, or ask for a
    /// cross-type edge on a node type without one are skipped and reported.
    pub fn load(&mut self, bundle: &DocumentBundle) -> Vec<InvariantViolation> {
        self.title = bundle.title.clone();
        self.nodes.clear();
        self.edges.clear();
        self.next_id = 0;

        for doc in &bundle.nodes {
            let id = self.allocate_id();
            self.nodes.insert(id, RenderNode::new(id, doc.clone()));
        }

        let mut violations = Vec::new();
        let mut adjacency: Adjacency = HashMap::new();
        for (index, doc) in bundle.nodes.iter().enumerate() {
            let index = index as u32;
            let natural = EdgeKind::natural(doc.type_is);
            for &parent in &doc.parent_idxs {
                self.load_edge(index, parent, natural, &mut adjacency, &mut violations);
            }
            for &parent in &doc.parent_idxs_diff_type {
                match EdgeKind::cross_type(doc.type_is) {
                    Some(kind) => {
                        self.load_edge(index, parent, kind, &mut adjacency, &mut violations)
                    }
                    None => violations.push(InvariantViolation {
                        node: index,
                        parent,
                        reason: ViolationReason::NoCrossTypeKind,
                    }),
                }
            }
        }

        let ids: Vec<RenderId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.refresh_style(id);
        }

        for violation in &violations {
            tracing::warn!(%violation, "malformed parent reference");
        }
        tracing::info!(
            title = %self.title,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            skipped = violations.len(),
            "document loaded"
        );
        violations
    }

    fn load_edge(
        &mut self,
        index: u32,
        parent: u32,
        kind: EdgeKind,
        adjacency: &mut Adjacency,
        violations: &mut Vec<InvariantViolation>,
    ) {
        let reason = if parent as usize >= self.nodes.len() {
            Some(ViolationReason::OutOfRange)
        } else if parent == index {
            Some(ViolationReason::SelfReference)
        } else if reachable(adjacency, RenderId(index), RenderId(parent)) {
            Some(ViolationReason::Cycle)
        } else {
            None
        };

        match reason {
            Some(reason) => violations.push(InvariantViolation {
                node: index,
                parent,
                reason,
            }),
            None => {
                let edge = RenderEdge::new(RenderId(parent), RenderId(index), kind);
                let children = adjacency.entry(RenderId(parent)).or_default();
                // Scan the edge list only when the pair is already linked
                if !children.contains(&RenderId(index)) || !self.edges.contains(&edge) {
                    self.edges.push(edge);
                    children.push(RenderId(index));
                }
            }
        }
    }

    fn allocate_id(&mut self) -> RenderId {
        let id = RenderId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, id: RenderId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: RenderId) -> Option<&RenderNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: RenderId) -> Option<&mut RenderNode> {
        self.nodes.get_mut(&id)
    }

    /// Nodes in render-id order
    pub fn nodes(&self) -> impl Iterator<Item = &RenderNode> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut RenderNode> {
        self.nodes.values_mut()
    }

    pub fn edges(&self) -> &[RenderEdge] {
        &self.edges
    }

    pub fn has_edge(&self, source: RenderId, target: RenderId) -> bool {
        self.edges
            .iter()
            .any(|e| e.source == source && e.target == target)
    }

    /// Nodes without incoming edges, in render-id order
    pub fn roots(&self) -> Vec<RenderId> {
        let targets: HashSet<RenderId> = self.edges.iter().map(|e| e.target).collect();
        self.nodes
            .keys()
            .filter(|id| !targets.contains(id))
            .copied()
            .collect()
    }

    /// Children in edge insertion order
    pub fn children(&self, id: RenderId) -> Vec<RenderId> {
        self.edges
            .iter()
            .filter(|e| e.source == id)
            .map(|e| e.target)
            .collect()
    }

    /// Parents in edge insertion order
    pub fn parents(&self, id: RenderId) -> Vec<RenderId> {
        self.incoming(id).map(|e| e.source).collect()
    }

    pub fn incoming(&self, id: RenderId) -> impl Iterator<Item = &RenderEdge> {
        self.edges.iter().filter(move |e| e.target == id)
    }

    /// First parent connected by a tree edge
    pub fn same_type_parent(&self, id: RenderId) -> Option<RenderId> {
        let node_type = self.nodes.get(&id)?.node_type();
        self.incoming(id)
            .find(|e| e.is_same_type(node_type))
            .map(|e| e.source)
    }

    /// Whether `to` is reachable from `from` along outgoing edges
    pub fn reaches(&self, from: RenderId, to: RenderId) -> bool {
        reachable(&self.adjacency(), from, to)
    }

    /// Pre-order depth-first walk from the given starts along all outgoing edges
    pub fn dfs(&self, starts: &[RenderId]) -> Vec<RenderId> {
        preorder(starts, &self.adjacency())
    }

    fn adjacency(&self) -> Adjacency {
        let mut adjacency: Adjacency = HashMap::new();
        for edge in &self.edges {
            adjacency.entry(edge.source).or_default().push(edge.target);
        }
        adjacency
    }

    /// Create an empty node of `node_type`, optionally as a child of `parent`
    pub fn add_node(
        &mut self,
        node_type: NodeType,
        parent: Option<RenderId>,
    ) -> Result<RenderId, EditorError> {
        let level = match parent {
            Some(parent) => match self.nodes.get(&parent) {
                Some(node) => node.data.level + 1,
                None => return Err(EditorError::UnknownNode(parent)),
            },
            None => 0,
        };

        let id = self.allocate_id();
        let mut data = DocumentNode::new("", node_type);
        data.level = level;
        self.nodes.insert(id, RenderNode::new(id, data));
        if let Some(parent) = parent {
            self.edges
                .push(RenderEdge::new(parent, id, EdgeKind::natural(node_type)));
        }
        tracing::debug!(%id, %node_type, parent = ?parent, "node added");
        Ok(id)
    }

    /// Append an edge and restyle its target. Callers check the DAG invariant.
    pub(crate) fn add_edge(&mut self, edge: RenderEdge) {
        let target = edge.target;
        self.edges.push(edge);
        self.refresh_style(target);
    }

    pub fn set_text(&mut self, id: RenderId, text: impl Into<String>) -> Result<(), EditorError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(EditorError::UnknownNode(id))?;
        node.data.text = text.into();
        Ok(())
    }

    /// Remove `root` and everything reachable from it.
    ///
    /// The replacement selection is the root's first same-type parent, or the first
    /// remaining root when it has none.
    pub fn remove_subtree(&mut self, root: RenderId) -> Result<Removal, EditorError> {
        if !self.contains(root) {
            return Err(EditorError::UnknownNode(root));
        }
        let parent = self.same_type_parent(root);

        let removed = self.dfs(&[root]);
        let removed_set: HashSet<RenderId> = removed.iter().copied().collect();

        let survivors_touched: Vec<RenderId> = self
            .edges
            .iter()
            .filter(|e| removed_set.contains(&e.source) && !removed_set.contains(&e.target))
            .map(|e| e.target)
            .collect();

        self.nodes.retain(|id, _| !removed_set.contains(id));
        self.edges
            .retain(|e| !removed_set.contains(&e.source) && !removed_set.contains(&e.target));
        for id in survivors_touched {
            self.refresh_style(id);
        }

        let select = parent
            .filter(|p| self.contains(*p))
            .or_else(|| self.roots().first().copied());
        tracing::debug!(%root, removed = removed.len(), select = ?select, "subtree removed");
        Ok(Removal { removed, select })
    }

    /// Flatten the graph into document order.
    ///
    /// The walk starts from every node without an incoming tree edge, in render-id
    /// order, and descends along tree edges in insertion order. Each node's incoming
    /// edges are split into `parent_idxs` (edge kind matches the node's own type) and
    /// `parent_idxs_diff_type`, both rewritten to output positions.
    pub fn to_ordered_document_nodes(&self) -> Vec<DocumentNode> {
        let mut tree_children: Adjacency = HashMap::new();
        let mut has_tree_parent: HashSet<RenderId> = HashSet::new();
        for edge in &self.edges {
            let Some(target) = self.nodes.get(&edge.target) else {
                continue;
            };
            if edge.is_same_type(target.node_type()) {
                tree_children.entry(edge.source).or_default().push(edge.target);
                has_tree_parent.insert(edge.target);
            }
        }

        let starts: Vec<RenderId> = self
            .nodes
            .keys()
            .filter(|id| !has_tree_parent.contains(id))
            .copied()
            .collect();
        let mut order = preorder(&starts, &tree_children);
        if order.len() < self.nodes.len() {
            // Only reachable through a tree cycle, which load and the lifecycle rules
            // keep out of the graph
            let seen: HashSet<RenderId> = order.iter().copied().collect();
            let rest: Vec<RenderId> = self
                .nodes
                .keys()
                .filter(|id| !seen.contains(id))
                .copied()
                .collect();
            order.extend(
                preorder(&rest, &tree_children)
                    .into_iter()
                    .filter(|id| !seen.contains(id)),
            );
        }

        let position: HashMap<RenderId, u32> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i as u32))
            .collect();

        order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|node| {
                let mut data = node.data.clone();
                data.file_order = position[&node.id];
                data.parent_idxs.clear();
                data.parent_idxs_diff_type.clear();
                for edge in self.incoming(node.id) {
                    let Some(&parent) = position.get(&edge.source) else {
                        continue;
                    };
                    if edge.is_same_type(node.node_type()) {
                        data.parent_idxs.push(parent);
                    } else {
                        data.parent_idxs_diff_type.push(parent);
                    }
                }
                data
            })
            .collect()
    }

    pub fn to_bundle(&self) -> DocumentBundle {
        DocumentBundle::new(self.title.clone(), self.to_ordered_document_nodes())
    }

    /// Recompute whether a node is comparative from its incoming edge kinds
    pub(crate) fn refresh_style(&mut self, id: RenderId) {
        let kinds: HashSet<EdgeKind> = self.incoming(id).map(|e| e.kind).collect();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.style.comparative = kinds.len() > 1;
        }
    }
}

/// Stops at the first hit instead of walking the whole reachable set
fn reachable(adjacency: &Adjacency, from: RenderId, to: RenderId) -> bool {
    let mut visited: HashSet<RenderId> = HashSet::new();
    let mut stack = vec![from];
    while let Some(id) = stack.pop() {
        if id == to {
            return true;
        }
        if !visited.insert(id) {
            continue;
        }
        if let Some(children) = adjacency.get(&id) {
            stack.extend(children.iter().copied());
        }
    }
    false
}

fn preorder(starts: &[RenderId], adjacency: &Adjacency) -> Vec<RenderId> {
    let mut visited: HashSet<RenderId> = HashSet::new();
    let mut order = Vec::new();
    for &start in starts {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            order.push(id);
            if let Some(children) = adjacency.get(&id) {
                stack.extend(children.iter().rev().copied());
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick_db() -> DocumentBundle {
        DocumentBundle::new(
            "(md-decision-trees) Databases",
            vec![
                DocumentNode::new("Pick DB", NodeType::Decision).with_order(0, 0),
                DocumentNode::new("Postgres", NodeType::Option)
                    .with_order(1, 1)
                    .with_parents(vec![0]),
                DocumentNode::new("Mature", NodeType::Pro)
                    .with_order(2, 2)
                    .with_parents(vec![1]),
            ],
        )
    }

    #[test]
    fn test_load_assigns_sequential_ids_and_edges() {
        let (model, violations) = GraphModel::from_bundle(&pick_db());
        assert!(violations.is_empty());
        assert_eq!(model.len(), 3);
        assert_eq!(
            model.edges(),
            &[
                RenderEdge::new(RenderId(0), RenderId(1), EdgeKind::Default),
                RenderEdge::new(RenderId(1), RenderId(2), EdgeKind::Pro),
            ]
        );
        assert_eq!(model.node(RenderId(1)).unwrap().text(), "Postgres");
        assert_eq!(model.roots(), vec![RenderId(0)]);
    }

    #[test]
    fn test_remove_option_subtree() {
        let (mut model, _) = GraphModel::from_bundle(&pick_db());
        let removal = model.remove_subtree(RenderId(1)).unwrap();

        assert_eq!(removal.removed, vec![RenderId(1), RenderId(2)]);
        assert_eq!(removal.select, Some(RenderId(0)));
        assert_eq!(model.len(), 1);
        assert_eq!(model.edge_count(), 0);

        let nodes = model.to_ordered_document_nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text, "Pick DB");
        assert_eq!(nodes[0].file_order, 0);
    }

    #[test]
    fn test_removing_root_selects_next_root() {
        let bundle = DocumentBundle::new(
            "t",
            vec![
                DocumentNode::new("First", NodeType::Decision),
                DocumentNode::new("Second", NodeType::Decision).with_order(1, 0),
            ],
        );
        let (mut model, _) = GraphModel::from_bundle(&bundle);
        let removal = model.remove_subtree(RenderId(0)).unwrap();
        assert_eq!(removal.select, Some(RenderId(1)));

        let removal = model.remove_subtree(RenderId(1)).unwrap();
        assert_eq!(removal.select, None);
        assert!(model.is_empty());
    }

    #[test]
    fn test_remove_unknown_node() {
        let (mut model, _) = GraphModel::from_bundle(&pick_db());
        assert_eq!(
            model.remove_subtree(RenderId(9)),
            Err(EditorError::UnknownNode(RenderId(9)))
        );
        assert_eq!(model.len(), 3);
    }

    #[test]
    fn test_out_of_range_parent_is_skipped() {
        let mut bundle = pick_db();
        bundle.nodes[2].parent_idxs = vec![1, 7];
        let (model, violations) = GraphModel::from_bundle(&bundle);

        assert_eq!(model.len(), 3);
        assert_eq!(model.edge_count(), 2);
        assert_eq!(
            violations,
            vec![InvariantViolation {
                node: 2,
                parent: 7,
                reason: ViolationReason::OutOfRange,
            }]
        );
    }

    #[test]
    fn test_self_and_cyclic_parents_are_skipped() {
        let mut bundle = pick_db();
        bundle.nodes[1].parent_idxs = vec![0, 1];
        bundle.nodes[0].parent_idxs = vec![2];
        let (model, violations) = GraphModel::from_bundle(&bundle);

        let reasons: Vec<_> = violations.iter().map(|v| v.reason).collect();
        assert_eq!(
            reasons,
            vec![ViolationReason::SelfReference, ViolationReason::Cycle]
        );
        // 2 -> 0 was accepted first, so 0 -> 1 -> 2 -> 0 is closed at 1 -> 2
        assert_eq!(model.edge_count(), 2);
        assert!(!model.has_edge(RenderId(1), RenderId(2)));
        assert_eq!(model.roots(), vec![RenderId(2)]);
    }

    #[test]
    fn test_long_chain_loads_and_closing_edge_is_skipped() {
        // 1999 -> 1998 -> ... -> 0, each reference given twice, then 0 -> 1999 last
        let nodes: Vec<DocumentNode> = (0..2000u32)
            .map(|i| {
                let parent = if i == 1999 { 0 } else { i + 1 };
                DocumentNode::new(format!("note {i}"), NodeType::Note)
                    .with_parents(vec![parent, parent])
            })
            .collect();
        let (model, violations) = GraphModel::from_bundle(&DocumentBundle::new("t", nodes));

        assert_eq!(model.edge_count(), 1999);
        assert_eq!(
            violations,
            vec![
                InvariantViolation {
                    node: 1999,
                    parent: 0,
                    reason: ViolationReason::Cycle,
                };
                2
            ]
        );
        assert_eq!(model.roots(), vec![RenderId(1999)]);
        assert!(model.reaches(RenderId(1999), RenderId(0)));
        assert!(!model.reaches(RenderId(0), RenderId(1999)));
    }

    #[test]
    fn test_diff_type_parent_marks_comparative() {
        let bundle = DocumentBundle::new(
            "t",
            vec![
                DocumentNode::new("Pick DB", NodeType::Decision),
                DocumentNode::new("Postgres", NodeType::Option)
                    .with_order(1, 1)
                    .with_parents(vec![0]),
                DocumentNode::new("Fast", NodeType::Pro)
                    .with_order(2, 2)
                    .with_parents(vec![1]),
                DocumentNode::new("Sqlite", NodeType::Option)
                    .with_order(3, 1)
                    .with_parents(vec![0]),
                DocumentNode::new("Slow", NodeType::Con)
                    .with_order(4, 2)
                    .with_parents(vec![3])
                    .with_diff_type_parents(vec![1]),
            ],
        );
        let (model, violations) = GraphModel::from_bundle(&bundle);
        assert!(violations.is_empty());

        let slow = model.node(RenderId(4)).unwrap();
        assert!(slow.style.comparative);
        assert_eq!(slow.style.name(), "con-comparative");
        assert!(!model.node(RenderId(2)).unwrap().style.comparative);

        let cross = model
            .incoming(RenderId(4))
            .find(|e| e.source == RenderId(1))
            .unwrap();
        assert_eq!(cross.kind, EdgeKind::Pro);
    }

    #[test]
    fn test_diff_type_parent_on_note_is_rejected() {
        let bundle = DocumentBundle::new(
            "t",
            vec![
                DocumentNode::new("Pick DB", NodeType::Decision),
                DocumentNode::new("Aside", NodeType::Note)
                    .with_order(1, 1)
                    .with_parents(vec![0])
                    .with_diff_type_parents(vec![0]),
            ],
        );
        let (model, violations) = GraphModel::from_bundle(&bundle);
        assert_eq!(model.edge_count(), 1);
        assert_eq!(violations[0].reason, ViolationReason::NoCrossTypeKind);
    }

    #[test]
    fn test_add_node_levels_and_edges() {
        let (mut model, _) = GraphModel::from_bundle(&pick_db());
        let con = model.add_node(NodeType::Con, Some(RenderId(1))).unwrap();
        assert_eq!(con, RenderId(3));
        let node = model.node(con).unwrap();
        assert_eq!(node.data.level, 2);
        assert_eq!(node.text(), "");
        assert_eq!(model.children(RenderId(1)), vec![RenderId(2), con]);
        assert_eq!(
            model.incoming(con).next().map(|e| e.kind),
            Some(EdgeKind::Con)
        );

        let root = model.add_node(NodeType::Note, None).unwrap();
        assert_eq!(model.node(root).unwrap().data.level, 0);
        assert_eq!(model.roots(), vec![RenderId(0), root]);

        assert_eq!(
            model.add_node(NodeType::Pro, Some(RenderId(42))),
            Err(EditorError::UnknownNode(RenderId(42)))
        );
    }

    #[test]
    fn test_export_is_deterministic() {
        let (mut model, _) = GraphModel::from_bundle(&pick_db());
        model.add_node(NodeType::Con, Some(RenderId(1))).unwrap();
        assert_eq!(
            model.to_ordered_document_nodes(),
            model.to_ordered_document_nodes()
        );
    }

    #[test]
    fn test_export_places_new_child_after_existing_siblings() {
        let (mut model, _) = GraphModel::from_bundle(&pick_db());
        let option = model.add_node(NodeType::Option, Some(RenderId(0))).unwrap();
        model.set_text(option, "Sqlite").unwrap();
        let pro = model.add_node(NodeType::Pro, Some(RenderId(1))).unwrap();
        model.set_text(pro, "Extensions").unwrap();

        let texts: Vec<_> = model
            .to_ordered_document_nodes()
            .into_iter()
            .map(|n| (n.text, n.file_order, n.parent_idxs))
            .collect();
        assert_eq!(
            texts,
            vec![
                ("Pick DB".to_string(), 0, vec![]),
                ("Postgres".to_string(), 1, vec![0]),
                ("Mature".to_string(), 2, vec![1]),
                ("Extensions".to_string(), 3, vec![1]),
                ("Sqlite".to_string(), 4, vec![0]),
            ]
        );
    }
}
