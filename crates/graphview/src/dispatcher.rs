//! Modal routing of keyboard and mouse input.
//!
//! The dispatcher only decides *what* should happen; the session carries it out. Text
//! editing is an explicit mode holding the edit buffer, so commit and cancel are plain
//! state transitions.

use crate::document::NodeType;
use crate::lifecycle::RelationKind;
use crate::node::RenderId;
use crate::traversal::Direction;

/// A key press as delivered by the windowing layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPress {
    /// Key name, lower case (`"m"`, `"escape"`, `"backspace"`, `"enter"`, `"space"`)
    pub key: String,
    /// Text the key produces, when it produces any
    pub text: Option<String>,
    pub ctrl: bool,
}

impl KeyPress {
    pub fn plain(key: &str) -> Self {
        let text = (key.chars().count() == 1).then(|| key.to_string());
        Self {
            key: key.to_string(),
            text,
            ctrl: false,
        }
    }

    pub fn ctrl(key: &str) -> Self {
        Self {
            key: key.to_string(),
            text: None,
            ctrl: true,
        }
    }

    fn is_ctrl(&self, key: &str) -> bool {
        self.ctrl && self.key == key
    }

    fn is_escape(&self) -> bool {
        self.key == "escape"
    }

    /// How the key reads in an error message (`"x"`, `"Ctrl+x"`)
    fn describe(&self) -> String {
        if self.ctrl {
            format!("Ctrl+{}", self.key)
        } else {
            self.key.clone()
        }
    }

    fn typed_text(&self) -> Option<&str> {
        if self.ctrl {
            return None;
        }
        match self.text.as_deref() {
            Some(text) => Some(text),
            None if self.key == "space" => Some(" "),
            None => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Key(KeyPress),
    NodeClick(RenderId),
    BackgroundClick,
    /// "Make Pro for..." / "Make Con for..." chosen on `node`
    ContextMenu { node: RenderId, kind: RelationKind },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    PendingCreateType,
    EditingText { node: RenderId, buffer: String },
    PendingEdgeTarget { child: RenderId, kind: RelationKind },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Create {
        node_type: NodeType,
        parent: Option<RenderId>,
    },
    BeginEdit(RenderId),
    CommitEdit { node: RenderId, text: String },
    DiscardEdit(RenderId),
    Delete(RenderId),
    Save,
    Relayout,
    Move(Direction),
    Select(Option<RenderId>),
    Link {
        parent: RenderId,
        child: RenderId,
        kind: RelationKind,
    },
    /// A key that names no node type ended a pending create
    InvalidShortcut(String),
    /// Only the presentation changed (edit buffer, pending state)
    Redraw,
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    mode: Mode,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, Mode::EditingText { .. })
    }

    /// Node whose text is being edited, with the live buffer
    pub fn edit_buffer(&self) -> Option<(RenderId, &str)> {
        match &self.mode {
            Mode::EditingText { node, buffer } => Some((*node, buffer.as_str())),
            _ => None,
        }
    }

    pub fn begin_editing(&mut self, node: RenderId, text: impl Into<String>) {
        self.mode = Mode::EditingText {
            node,
            buffer: text.into(),
        };
    }

    /// Drop back to idle without committing anything
    pub fn reset(&mut self) {
        self.mode = Mode::Idle;
    }

    pub fn dispatch(&mut self, input: Input, selected: Option<RenderId>) -> Vec<Command> {
        match input {
            Input::Key(key) => self.on_key(key, selected),
            Input::NodeClick(node) => self.on_node_click(node),
            Input::BackgroundClick => self.on_background_click(),
            Input::ContextMenu { node, kind } => {
                let mut commands = self.finish_edit();
                self.mode = Mode::PendingEdgeTarget { child: node, kind };
                commands.push(Command::Select(Some(node)));
                commands
            }
        }
    }

    fn on_key(&mut self, key: KeyPress, selected: Option<RenderId>) -> Vec<Command> {
        match std::mem::take(&mut self.mode) {
            Mode::Idle => self.on_idle_key(key, selected),
            Mode::PendingCreateType => {
                // Any key resolves the pending create; only type letters create
                if key.is_escape() {
                    return vec![Command::Redraw];
                }
                match key.typed_text().and_then(NodeType::from_key) {
                    Some(node_type) => vec![Command::Create {
                        node_type,
                        parent: selected,
                    }],
                    None => vec![Command::InvalidShortcut(key.describe())],
                }
            }
            Mode::EditingText { node, mut buffer } => {
                if key.is_ctrl("e") {
                    return vec![Command::CommitEdit { node, text: buffer }];
                }
                if key.is_escape() {
                    return vec![Command::DiscardEdit(node)];
                }
                let changed = match key.key.as_str() {
                    _ if key.ctrl => false,
                    "backspace" => buffer.pop().is_some(),
                    "enter" => {
                        buffer.push('\n');
                        true
                    }
                    _ => match key.typed_text() {
                        Some(text) => {
                            buffer.push_str(text);
                            true
                        }
                        None => false,
                    },
                };
                self.mode = Mode::EditingText { node, buffer };
                if changed { vec![Command::Redraw] } else { Vec::new() }
            }
            Mode::PendingEdgeTarget { child, kind } => {
                if key.is_escape() {
                    vec![Command::Redraw]
                } else {
                    self.mode = Mode::PendingEdgeTarget { child, kind };
                    Vec::new()
                }
            }
        }
    }

    fn on_idle_key(&mut self, key: KeyPress, selected: Option<RenderId>) -> Vec<Command> {
        if key.ctrl {
            return match (key.key.as_str(), selected) {
                ("m", _) => {
                    self.mode = Mode::PendingCreateType;
                    vec![Command::Redraw]
                }
                ("e", Some(node)) => vec![Command::BeginEdit(node)],
                ("d", Some(node)) => vec![Command::Delete(node)],
                ("s", _) => vec![Command::Save],
                ("z", _) => vec![Command::Relayout],
                _ => Vec::new(),
            };
        }
        match key.key.as_str() {
            "j" => vec![Command::Move(Direction::Down)],
            "k" => vec![Command::Move(Direction::Up)],
            "h" => vec![Command::Move(Direction::Left)],
            "l" => vec![Command::Move(Direction::Right)],
            "escape" => vec![Command::Select(None)],
            _ => Vec::new(),
        }
    }

    fn on_node_click(&mut self, node: RenderId) -> Vec<Command> {
        match std::mem::take(&mut self.mode) {
            Mode::PendingEdgeTarget { child, kind } => vec![Command::Link {
                parent: node,
                child,
                kind,
            }],
            Mode::EditingText { node: edited, buffer } => vec![
                Command::CommitEdit {
                    node: edited,
                    text: buffer,
                },
                Command::Select(Some(node)),
            ],
            Mode::Idle | Mode::PendingCreateType => vec![Command::Select(Some(node))],
        }
    }

    fn on_background_click(&mut self) -> Vec<Command> {
        match std::mem::take(&mut self.mode) {
            Mode::PendingEdgeTarget { .. } => vec![Command::Redraw],
            Mode::EditingText { node, buffer } => vec![
                Command::CommitEdit { node, text: buffer },
                Command::Select(None),
            ],
            Mode::Idle | Mode::PendingCreateType => vec![Command::Select(None)],
        }
    }

    fn finish_edit(&mut self) -> Vec<Command> {
        match std::mem::take(&mut self.mode) {
            Mode::EditingText { node, buffer } => vec![Command::CommitEdit { node, text: buffer }],
            _ => Vec::new(),
        }
    }
}

pub struct Shortcut {
    pub keys: &'static str,
    pub description: &'static str,
}

pub struct ShortcutSection {
    pub title: &'static str,
    pub shortcuts: &'static [Shortcut],
}

pub const SHORTCUTS: &[ShortcutSection] = &[
    ShortcutSection {
        title: "Node types",
        shortcuts: &[
            Shortcut { keys: "d", description: "Decision" },
            Shortcut { keys: "o", description: "Option" },
            Shortcut { keys: "p", description: "Pro" },
            Shortcut { keys: "c", description: "Con" },
            Shortcut { keys: "n", description: "Note" },
        ],
    },
    ShortcutSection {
        title: "Edit",
        shortcuts: &[
            Shortcut { keys: "Ctrl + m, <node type>", description: "Make new node" },
            Shortcut { keys: "Ctrl + e", description: "Edit (re-press to save)" },
            Shortcut { keys: "Ctrl + d", description: "Delete selected node & children" },
            Shortcut { keys: "Ctrl + s", description: "Save" },
            Shortcut { keys: "Ctrl + z", description: "Re-run layout" },
            Shortcut { keys: "Escape", description: "Cancel edit / link, deselect" },
        ],
    },
    ShortcutSection {
        title: "Navigation",
        shortcuts: &[
            Shortcut { keys: "j", description: "Down" },
            Shortcut { keys: "k", description: "Up" },
            Shortcut { keys: "h", description: "Left" },
            Shortcut { keys: "l", description: "Right" },
        ],
    },
    ShortcutSection {
        title: "File & view",
        shortcuts: &[
            Shortcut { keys: "Ctrl + o", description: "Open document" },
            Shortcut { keys: "F1", description: "Show / hide shortcuts" },
            Shortcut { keys: "F2", description: "Show / hide error log" },
        ],
    },
    ShortcutSection {
        title: "Mouse",
        shortcuts: &[
            Shortcut { keys: "click node", description: "Select" },
            Shortcut { keys: "click background", description: "Deselect" },
            Shortcut { keys: "right click pro / con", description: "Add relationship" },
        ],
    },
];
