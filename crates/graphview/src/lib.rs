//! Graph state and interaction engine for a decision-tree canvas.
//!
//! [`Session`] owns everything: the [`GraphModel`], keyboard traversal, the layout
//! adapter, the modal [`Dispatcher`] and the error log. Drawing is left to a
//! [`RenderSink`]; storage to a [`DocumentBackend`].

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod document;
pub mod edge;
pub mod error;
pub mod graph;
pub mod layout;
pub mod lifecycle;
pub mod node;
pub mod render;
pub mod session;
pub mod traversal;

pub use backend::{BackendError, DocumentBackend, JsonFileBackend};
pub use config::{ConfigError, EditorConfig, LayoutConfig, TextMetrics};
pub use dispatcher::{Command, Dispatcher, Input, KeyPress, Mode, SHORTCUTS};
pub use document::{DocumentBundle, DocumentNode, NodeType};
pub use edge::{EdgeKind, RenderEdge};
pub use error::{EditorError, ErrorLog, InvariantViolation};
pub use graph::GraphModel;
pub use layout::{DagreGraph, LayoutEngine, LayoutGraph};
pub use lifecycle::RelationKind;
pub use node::{Position, RenderId, RenderNode, Size};
pub use render::{LatestFrame, RenderFrame, RenderSink};
pub use session::{Effect, ImportTicket, SelectionState, Session};
pub use traversal::{Direction, SelectionTraverser};
