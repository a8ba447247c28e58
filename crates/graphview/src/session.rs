//! The editing session: one owner for the model and everything that reacts to it.
//!
//! Every mutation runs a full relayout before the sink sees a frame. Backend I/O is left
//! to the caller; the session hands out import tickets and save snapshots and takes the
//! results back on the same thread.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{BackendError, DocumentBackend};
use crate::config::EditorConfig;
use crate::dispatcher::{Command, Dispatcher, Input, Mode};
use crate::document::DocumentBundle;
use crate::error::{EditorError, ErrorLog};
use crate::graph::GraphModel;
use crate::layout::{DagreGraph, LayoutEngine, LayoutGraph};
use crate::lifecycle;
use crate::node::RenderId;
use crate::render::{EditingNode, PendingLink, RenderFrame, RenderSink};
use crate::traversal::SelectionTraverser;

/// Side effect the caller has to carry out
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Save { bundle: DocumentBundle, path: PathBuf },
}

/// An outstanding document read.
///
/// Input stays blocked while any ticket is alive. Dropping a ticket without finishing it
/// abandons the read and releases the block.
#[derive(Debug)]
pub struct ImportTicket {
    id: u64,
    path: PathBuf,
    in_flight: Arc<AtomicUsize>,
}

impl ImportTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ImportTicket {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected: Option<RenderId>,
    pub editing: bool,
}

#[derive(Default)]
struct Pass {
    layout: bool,
    render: bool,
    focus: Option<RenderId>,
}

pub struct Session<S: RenderSink, G: LayoutGraph = DagreGraph> {
    model: GraphModel,
    traverser: SelectionTraverser,
    layout: LayoutEngine<G>,
    dispatcher: Dispatcher,
    errors: ErrorLog,
    file_path: Option<PathBuf>,
    next_ticket: u64,
    imports_in_flight: Arc<AtomicUsize>,
    sink: S,
}

impl<S: RenderSink> Session<S, DagreGraph> {
    pub fn new(config: &EditorConfig, sink: S) -> Self {
        Self::with_layout(LayoutEngine::dagre(config), sink)
    }
}

impl<S: RenderSink, G: LayoutGraph> Session<S, G> {
    pub fn with_layout(layout: LayoutEngine<G>, sink: S) -> Self {
        Self {
            model: GraphModel::new(),
            traverser: SelectionTraverser::new(),
            layout,
            dispatcher: Dispatcher::new(),
            errors: ErrorLog::default(),
            file_path: None,
            next_ticket: 0,
            imports_in_flight: Arc::default(),
            sink,
        }
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn selected(&self) -> Option<RenderId> {
        self.traverser.current()
    }

    pub fn selection(&self) -> SelectionState {
        SelectionState {
            selected: self.traverser.current(),
            editing: self.dispatcher.is_editing(),
        }
    }

    pub fn mode(&self) -> &Mode {
        self.dispatcher.mode()
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorLog {
        &mut self.errors
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn set_file_path(&mut self, path: impl Into<PathBuf>) {
        self.file_path = Some(path.into());
    }

    pub fn is_importing(&self) -> bool {
        self.imports_in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn layout_passes(&self) -> u64 {
        self.layout.passes()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Route one input through the dispatcher and apply what it asks for
    pub fn handle(&mut self, input: Input) -> Option<Effect> {
        if self.is_importing() {
            tracing::debug!(?input, "input ignored while importing");
            return None;
        }

        let commands = self.dispatcher.dispatch(input, self.traverser.current());
        let mut pass = Pass::default();
        let mut effect = None;
        for command in commands {
            if let Some(e) = self.apply(command, &mut pass) {
                effect = Some(e);
            }
        }
        self.finish(pass);
        effect
    }

    fn apply(&mut self, command: Command, pass: &mut Pass) -> Option<Effect> {
        tracing::trace!(?command, "apply");
        pass.render = true;
        match command {
            Command::Create { node_type, parent } => {
                match lifecycle::create_node(&mut self.model, node_type, parent) {
                    Ok(id) => {
                        self.traverser.refresh(&self.model);
                        self.traverser.select(&self.model, Some(id));
                        self.dispatcher.begin_editing(id, "");
                        pass.focus = Some(id);
                        pass.layout = true;
                    }
                    Err(err) => self.errors.push(err),
                }
            }
            Command::BeginEdit(id) => match self.model.node(id) {
                Some(node) => {
                    let text = node.text().to_string();
                    self.dispatcher.begin_editing(id, text);
                    pass.focus = Some(id);
                }
                None => self.errors.push(EditorError::UnknownNode(id)),
            },
            Command::CommitEdit { node, text } => {
                match lifecycle::edit_text(&mut self.model, node, text) {
                    Ok(()) => pass.layout = true,
                    Err(err) => self.errors.push(err),
                }
            }
            Command::DiscardEdit(_) | Command::Redraw => {}
            Command::InvalidShortcut(key) => self.errors.push(EditorError::InvalidShortcut(key)),
            Command::Delete(id) => match lifecycle::remove_node(&mut self.model, id) {
                Ok(removal) => {
                    self.traverser.refresh(&self.model);
                    self.traverser.select(&self.model, removal.select);
                    pass.layout = true;
                }
                Err(err) => self.errors.push(err),
            },
            Command::Save => return self.save(),
            Command::Relayout => pass.layout = true,
            Command::Move(direction) => {
                self.traverser.step(&self.model, direction);
            }
            Command::Select(id) => {
                let id = id.filter(|id| self.model.contains(*id));
                self.traverser.select(&self.model, id);
            }
            Command::Link {
                parent,
                child,
                kind,
            } => match lifecycle::create_relationship(&mut self.model, parent, child, kind) {
                Ok(()) => {
                    self.traverser.refresh(&self.model);
                    pass.layout = true;
                }
                Err(err) => self.errors.push(err),
            },
        }
        None
    }

    fn finish(&mut self, pass: Pass) {
        if pass.layout {
            self.layout.relayout(&mut self.model);
        }
        if pass.layout || pass.render {
            self.render(pass.focus);
        }
    }

    fn render(&mut self, focus_editor: Option<RenderId>) {
        let editing = self
            .dispatcher
            .edit_buffer()
            .map(|(node, buffer)| EditingNode {
                node,
                buffer: buffer.to_string(),
            });
        let pending_link = match self.dispatcher.mode() {
            Mode::PendingEdgeTarget { child, kind } => Some(PendingLink {
                child: *child,
                kind: *kind,
            }),
            _ => None,
        };
        let frame = RenderFrame {
            title: self.model.title().to_string(),
            nodes: self.model.nodes().cloned().collect(),
            edges: self.model.edges().to_vec(),
            selected: self.traverser.current(),
            editing,
            pending_link,
            interactive: !self.is_importing(),
            focus_editor,
        };
        self.sink.render_graph(frame);
    }

    /// Redraw without changing anything
    pub fn redraw(&mut self) {
        self.render(None);
    }

    /// Replace the model with `bundle`. References that break the graph rules are
    /// skipped and reported; everything else loads.
    pub fn import_document(&mut self, bundle: &DocumentBundle) {
        let violations = self.model.load(bundle);
        for violation in violations {
            self.errors.push(violation);
        }
        self.dispatcher.reset();
        self.traverser.clear();
        self.layout.relayout(&mut self.model);
        self.render(None);
    }

    pub fn export_document(&self) -> DocumentBundle {
        self.model.to_bundle()
    }

    /// Start reading `path`. Selection is dropped and input is ignored until every
    /// outstanding ticket has been finished or dropped.
    pub fn begin_import(&mut self, path: impl Into<PathBuf>) -> ImportTicket {
        self.imports_in_flight.fetch_add(1, Ordering::SeqCst);
        let ticket = ImportTicket {
            id: self.next_ticket,
            path: path.into(),
            in_flight: Arc::clone(&self.imports_in_flight),
        };
        self.next_ticket += 1;
        self.dispatcher.reset();
        self.traverser.clear();
        tracing::info!(ticket = ticket.id, path = %ticket.path.display(), "import started");
        self.render(None);
        ticket
    }

    /// Take back the result of a read. A success replaces the model, a failure leaves it
    /// as it was.
    pub fn finish_import(
        &mut self,
        ticket: ImportTicket,
        result: Result<DocumentBundle, BackendError>,
    ) {
        let path = ticket.path.clone();
        drop(ticket);
        match result {
            Ok(bundle) => {
                self.file_path = Some(path);
                self.import_document(&bundle);
            }
            Err(err) => {
                self.errors.push(EditorError::DocumentRead {
                    path: path.display().to_string(),
                    message: err.to_string(),
                });
                self.render(None);
            }
        }
    }

    /// Snapshot the model for writing to the current file
    pub fn save(&mut self) -> Option<Effect> {
        match &self.file_path {
            Some(path) => Some(Effect::Save {
                bundle: self.model.to_bundle(),
                path: path.clone(),
            }),
            None => {
                self.errors.push(EditorError::DocumentWrite {
                    path: None,
                    message: "no file is open".to_string(),
                });
                None
            }
        }
    }

    pub fn finish_save(&mut self, path: &Path, result: Result<(), BackendError>) {
        match result {
            Ok(()) => tracing::info!(path = %path.display(), "document saved"),
            Err(err) => {
                self.errors.push(EditorError::DocumentWrite {
                    path: Some(path.display().to_string()),
                    message: err.to_string(),
                });
                self.render(None);
            }
        }
    }

    /// Blocking read through `backend`, for callers without an executor
    pub fn open_with(&mut self, backend: &dyn DocumentBackend, path: impl Into<PathBuf>) {
        let ticket = self.begin_import(path);
        let result = backend.get_nodes(ticket.path());
        self.finish_import(ticket, result);
    }

    /// Blocking write of `effect` through `backend`
    pub fn perform(&mut self, backend: &dyn DocumentBackend, effect: Effect) {
        match effect {
            Effect::Save { bundle, path } => {
                let result = backend.send_nodes(&bundle, &path);
                self.finish_save(&path, result);
            }
        }
    }
}
