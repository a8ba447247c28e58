use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use graphview::error::RelationshipError;
use graphview::*;
use tracing_test::traced_test;

#[derive(Default)]
struct Recorder {
    frames: Vec<RenderFrame>,
}

impl RenderSink for Recorder {
    fn render_graph(&mut self, frame: RenderFrame) {
        self.frames.push(frame);
    }
}

impl Recorder {
    fn last(&self) -> &RenderFrame {
        self.frames.last().unwrap()
    }
}

#[derive(Default)]
struct MemoryBackend {
    files: Mutex<HashMap<PathBuf, DocumentBundle>>,
}

impl DocumentBackend for MemoryBackend {
    fn get_nodes(&self, path: &Path) -> Result<DocumentBundle, BackendError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| {
                BackendError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such document",
                ))
            })
    }

    fn send_nodes(&self, bundle: &DocumentBundle, path: &Path) -> Result<(), BackendError> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), bundle.clone());
        Ok(())
    }
}

fn press(session: &mut Session<Recorder>, key: KeyPress) -> Option<Effect> {
    session.handle(Input::Key(key))
}

fn type_text(session: &mut Session<Recorder>, text: &str) {
    for c in text.chars() {
        let key = if c == ' ' {
            KeyPress::plain("space")
        } else {
            KeyPress::plain(&c.to_string())
        };
        press(session, key);
    }
}

fn create(session: &mut Session<Recorder>, key: &str, text: &str) -> RenderId {
    press(session, KeyPress::ctrl("m"));
    press(session, KeyPress::plain(key));
    let id = session.selected().unwrap();
    type_text(session, text);
    press(session, KeyPress::ctrl("e"));
    id
}

#[test]
fn test_build_save_and_reopen() {
    let backend = MemoryBackend::default();
    let path = PathBuf::from("/notes/databases.md");
    let mut session = Session::new(&EditorConfig::default(), Recorder::default());
    session.set_file_path(&path);

    let decision = create(&mut session, "d", "Pick DB");
    create(&mut session, "o", "Postgres");
    let mature = create(&mut session, "p", "Mature");
    press(&mut session, KeyPress::plain("k"));
    press(&mut session, KeyPress::plain("k"));
    assert_eq!(session.selected(), Some(decision));
    let sqlite = create(&mut session, "o", "Sqlite");

    session.handle(Input::ContextMenu {
        node: mature,
        kind: RelationKind::Con,
    });
    session.handle(Input::NodeClick(sqlite));
    assert!(session.errors().is_empty());

    let effect = press(&mut session, KeyPress::ctrl("s")).unwrap();
    session.perform(&backend, effect);

    let mut reopened = Session::new(&EditorConfig::default(), Recorder::default());
    reopened.open_with(&backend, &path);
    assert_eq!(reopened.file_path(), Some(path.as_path()));

    let frame = reopened.sink().last();
    let texts: Vec<&str> = frame.nodes.iter().map(|n| n.text()).collect();
    assert_eq!(texts, vec!["Pick DB", "Postgres", "Mature", "Sqlite"]);
    assert!(frame.node(RenderId(2)).unwrap().style.comparative);
    assert_eq!(reopened.export_document(), session.export_document());
}

#[test]
fn test_open_missing_document_keeps_session() {
    let backend = MemoryBackend::default();
    let mut session = Session::new(&EditorConfig::default(), Recorder::default());
    let decision = create(&mut session, "d", "Pick DB");

    session.open_with(&backend, "/notes/missing.md");
    assert_eq!(session.model().len(), 1);
    assert!(session.model().contains(decision));
    assert!(session.errors().has_new());
    let message = session.errors().newest_first().next().unwrap().to_string();
    assert!(message.contains("/notes/missing.md"), "{message}");

    session.errors_mut().mark_seen();
    assert!(!session.errors().has_new());
}

#[test]
fn test_every_mutation_renders_a_laid_out_frame() {
    let mut session = Session::new(&EditorConfig::default(), Recorder::default());
    let decision = create(&mut session, "d", "Pick DB");
    create(&mut session, "o", "Postgres");

    let frame = session.sink().last();
    let decision_y = frame.node(decision).unwrap().position.y;
    let option = frame.nodes.iter().find(|n| n.id != decision).unwrap();
    assert!(option.position.y > decision_y);
    assert!(frame.nodes.iter().all(|n| n.size.width > 0.0));
}

#[test]
fn test_relationship_rejections_are_logged() {
    let mut session = Session::new(&EditorConfig::default(), Recorder::default());
    let decision = create(&mut session, "d", "Pick DB");
    let option = create(&mut session, "o", "Postgres");
    let pro = create(&mut session, "p", "Mature");

    session.handle(Input::ContextMenu {
        node: pro,
        kind: RelationKind::Pro,
    });
    session.handle(Input::NodeClick(option));
    assert!(matches!(
        session.errors().entries(),
        [EditorError::Relationship(_)]
    ));
    assert_eq!(session.model().edge_count(), 2);
    assert!(session.model().has_edge(decision, option));
}

fn pick_db() -> Session<Recorder> {
    let bundle = DocumentBundle::new(
        "(md-decision-trees) Databases",
        vec![
            DocumentNode::new("Pick DB", NodeType::Decision),
            DocumentNode::new("Postgres", NodeType::Option)
                .with_order(1, 1)
                .with_parents(vec![0]),
            DocumentNode::new("Mature", NodeType::Pro)
                .with_order(2, 2)
                .with_parents(vec![1]),
            DocumentNode::new("Sqlite", NodeType::Option)
                .with_order(3, 1)
                .with_parents(vec![0]),
            DocumentNode::new("No server", NodeType::Pro)
                .with_order(4, 2)
                .with_parents(vec![3]),
        ],
    );
    let mut session = Session::new(&EditorConfig::default(), Recorder::default());
    session.import_document(&bundle);
    session
}

#[test]
fn test_decision_under_selected_node_is_rejected() {
    let mut session = pick_db();
    let before = session.export_document();

    for node in [RenderId(0), RenderId(1), RenderId(2)] {
        session.handle(Input::NodeClick(node));
        press(&mut session, KeyPress::ctrl("m"));
        press(&mut session, KeyPress::plain("d"));
        assert_eq!(session.selected(), Some(node));
        assert_eq!(session.mode(), &Mode::Idle);
    }

    assert_eq!(session.errors().len(), 3);
    assert!(
        session
            .errors()
            .entries()
            .iter()
            .all(|err| matches!(err, EditorError::NodeCreation(_)))
    );
    assert_eq!(session.model().roots(), vec![RenderId(0)]);
    assert_eq!(session.export_document(), before);
}

#[test]
fn test_pro_links_only_under_options() {
    let mut session = pick_db();
    let before = session.export_document();
    let mature = RenderId(2);
    let no_server = RenderId(4);

    // Pro for the decision itself
    session.handle(Input::ContextMenu {
        node: mature,
        kind: RelationKind::Pro,
    });
    session.handle(Input::NodeClick(RenderId(0)));
    // Con hung under another pro
    session.handle(Input::ContextMenu {
        node: no_server,
        kind: RelationKind::Con,
    });
    session.handle(Input::NodeClick(mature));

    assert!(matches!(
        session.errors().entries(),
        [
            EditorError::Relationship(RelationshipError::InvalidParent {
                parent: NodeType::Decision
            }),
            EditorError::Relationship(RelationshipError::InvalidParent {
                parent: NodeType::Pro
            }),
        ]
    ));
    assert_eq!(session.export_document(), before);

    // Deleting a pro never reaches into another option's subtree
    session.handle(Input::NodeClick(mature));
    press(&mut session, KeyPress::ctrl("d"));
    let texts: Vec<String> = session
        .model()
        .nodes()
        .map(|n| n.text().to_string())
        .collect();
    assert_eq!(texts, vec!["Pick DB", "Postgres", "Sqlite", "No server"]);

    // The same link under an option is accepted
    session.handle(Input::ContextMenu {
        node: no_server,
        kind: RelationKind::Con,
    });
    session.handle(Input::NodeClick(RenderId(1)));
    assert_eq!(session.errors().len(), 2);
    assert!(session.model().has_edge(RenderId(1), no_server));
}

#[test]
#[traced_test]
fn test_load_logs_skipped_references() {
    let bundle = DocumentBundle::new(
        "t",
        vec![
            DocumentNode::new("Pick DB", NodeType::Decision),
            DocumentNode::new("Postgres", NodeType::Option).with_parents(vec![0, 4]),
        ],
    );
    let mut session = Session::new(&EditorConfig::default(), Recorder::default());
    session.import_document(&bundle);

    assert_eq!(session.model().edge_count(), 1);
    assert_eq!(session.errors().len(), 1);
    assert!(logs_contain("malformed parent reference"));
    assert!(logs_contain("document loaded"));
}
