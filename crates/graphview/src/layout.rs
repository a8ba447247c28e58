//! Hierarchical layout of the graph model.
//!
//! The layout library only ever sees what [`LayoutGraph`] hands it; the rest of the
//! crate works with [`RenderId`], [`Size`] and [`Position`].

use std::collections::HashMap;

use crate::config::{EditorConfig, LayoutConfig, TextMetrics};
use crate::graph::GraphModel;
use crate::node::{Position, RenderId, Size};

/// Narrow interface onto a ranked layout implementation
pub trait LayoutGraph {
    fn clear(&mut self);
    fn set_node(&mut self, id: RenderId, size: Size);
    fn set_edge(&mut self, source: RenderId, target: RenderId);
    fn layout(&mut self, config: &LayoutConfig);
    /// Centre of the node after the last `layout` call
    fn position(&self, id: RenderId) -> Option<Position>;
}

/// Size of a node box for `text`: greedy word wrap at the configured width with a fixed
/// character advance. Width is the widest wrapped line, height is one line height per
/// wrapped line, both padded.
pub fn measure_text(text: &str, metrics: &TextMetrics) -> Size {
    let max_chars = ((metrics.max_wrap_width / metrics.char_width).floor() as usize).max(1);

    let mut lines: Vec<usize> = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = 0usize;
        for word in paragraph.split_whitespace() {
            let len = word.chars().count();
            if current == 0 {
                current = len;
            } else if current + 1 + len <= max_chars {
                current += 1 + len;
            } else {
                lines.push(current);
                current = len;
            }
        }
        lines.push(current);
    }

    let widest = lines.iter().copied().max().unwrap_or(0);
    Size {
        width: (widest as f32 * metrics.char_width + metrics.padding).max(metrics.min_width),
        height: lines.len().max(1) as f32 * metrics.line_height + metrics.padding,
    }
}

/// Dagre (Sugiyama) layout over a petgraph graph, ranked top to bottom
#[derive(Default)]
pub struct DagreGraph {
    nodes: Vec<(RenderId, Size)>,
    edges: Vec<(RenderId, RenderId)>,
    positions: HashMap<RenderId, Position>,
}

impl LayoutGraph for DagreGraph {
    fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.positions.clear();
    }

    fn set_node(&mut self, id: RenderId, size: Size) {
        match self.nodes.iter_mut().find(|(n, _)| *n == id) {
            Some(entry) => entry.1 = size,
            None => self.nodes.push((id, size)),
        }
    }

    fn set_edge(&mut self, source: RenderId, target: RenderId) {
        if !self.edges.contains(&(source, target)) {
            self.edges.push((source, target));
        }
    }

    fn layout(&mut self, config: &LayoutConfig) {
        use dagre_rs::{DagreLayout, LayoutOptions, RankDir};
        use petgraph::Graph as PetGraph;

        self.positions.clear();
        let n = self.nodes.len();
        if n == 0 {
            return;
        }

        let mut max_width = 0.0f32;
        let mut max_height = 0.0f32;
        for (_, size) in &self.nodes {
            max_width = max_width.max(size.width);
            max_height = max_height.max(size.height);
        }

        let mut pg: PetGraph<usize, ()> = PetGraph::new();
        let mut node_indices = Vec::with_capacity(n);
        let mut index_of = HashMap::with_capacity(n);
        for (i, (id, _)) in self.nodes.iter().enumerate() {
            let index = pg.add_node(i);
            node_indices.push(index);
            index_of.insert(*id, index);
        }
        for (source, target) in &self.edges {
            if let (Some(&s), Some(&t)) = (index_of.get(source), index_of.get(target)) {
                pg.add_edge(s, t, ());
            }
        }

        // The layout places points, so separation accounts for the largest box
        let options = LayoutOptions {
            rank_dir: RankDir::TopToBottom,
            node_sep: max_width + config.node_sep,
            rank_sep: max_height + config.rank_sep,
            ..Default::default()
        };
        let result = DagreLayout::with_options(options).compute(&pg);

        if result.node_positions.is_empty() {
            tracing::warn!(nodes = n, "dagre returned no positions, using grid");
            let cols = (n as f32).sqrt().ceil() as usize;
            let spacing_x = max_width + config.node_sep;
            let spacing_y = max_height + config.rank_sep;
            for (i, (id, size)) in self.nodes.iter().enumerate() {
                let col = i % cols;
                let row = i / cols;
                self.positions.insert(
                    *id,
                    Position {
                        x: config.margin + col as f32 * spacing_x + size.width / 2.0,
                        y: config.margin + row as f32 * spacing_y + size.height / 2.0,
                    },
                );
            }
            return;
        }

        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut raw: Vec<(f32, f32)> = Vec::with_capacity(n);
        for (i, (_, size)) in self.nodes.iter().enumerate() {
            let (x, y) = match result.node_positions.get(&node_indices[i]) {
                Some(&(x, y)) => (x, y),
                None => (0.0, 0.0),
            };
            min_x = min_x.min(x - size.width / 2.0);
            min_y = min_y.min(y - size.height / 2.0);
            raw.push((x, y));
        }

        // Shift so the top-left-most box sits at the margin
        let offset_x = config.margin - min_x;
        let offset_y = config.margin - min_y;
        for (i, (id, _)) in self.nodes.iter().enumerate() {
            let (x, y) = raw[i];
            self.positions.insert(
                *id,
                Position {
                    x: x + offset_x,
                    y: y + offset_y,
                },
            );
        }
    }

    fn position(&self, id: RenderId) -> Option<Position> {
        self.positions.get(&id).copied()
    }
}

/// Owns the layout graph and mirrors the model into it on every pass
pub struct LayoutEngine<G: LayoutGraph = DagreGraph> {
    graph: G,
    config: LayoutConfig,
    metrics: TextMetrics,
    passes: u64,
}

impl LayoutEngine<DagreGraph> {
    pub fn dagre(config: &EditorConfig) -> Self {
        Self::new(DagreGraph::default(), config)
    }
}

impl<G: LayoutGraph> LayoutEngine<G> {
    pub fn new(graph: G, config: &EditorConfig) -> Self {
        Self {
            graph,
            config: config.layout.clone(),
            metrics: config.text.clone(),
            passes: 0,
        }
    }

    pub fn metrics(&self) -> &TextMetrics {
        &self.metrics
    }

    /// Number of completed layout passes
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Full relayout: measure every node, push nodes and edges, run the layout and write
    /// the resulting centres back onto the model.
    pub fn relayout(&mut self, model: &mut GraphModel) {
        self.graph.clear();
        for node in model.nodes_mut() {
            node.size = measure_text(&node.data.text, &self.metrics);
            self.graph.set_node(node.id, node.size);
        }
        for edge in model.edges() {
            self.graph.set_edge(edge.source, edge.target);
        }

        self.graph.layout(&self.config);

        for node in model.nodes_mut() {
            if let Some(position) = self.graph.position(node.id) {
                node.position = position;
            }
        }
        self.passes += 1;
        tracing::debug!(
            nodes = model.len(),
            edges = model.edge_count(),
            pass = self.passes,
            "relayout"
        );
    }
}
