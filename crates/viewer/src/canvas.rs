use std::path::PathBuf;
use std::sync::Arc;

use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::ActiveTheme;
use graphview::dispatcher::Input as EditorInput;
use graphview::{
    DocumentBackend, EdgeKind, EditorConfig, JsonFileBackend, KeyPress, LatestFrame, Mode,
    NodeType, RelationKind, RenderFrame, RenderId, SHORTCUTS, Session,
};

use crate::node_view::NodeBox;

struct ContextMenu {
    node: RenderId,
    /// Container-local position of the right click
    position: Point<Pixels>,
}

pub struct DecisionCanvas {
    session: Session<LatestFrame>,
    backend: Arc<dyn DocumentBackend>,
    focus_handle: FocusHandle,
    zoom: f32,
    pan: Point<Pixels>,
    container_offset: Point<Pixels>,
    container_size: Size<Pixels>,
    // For panning with mouse drag
    is_panning: bool,
    pan_start: Point<Pixels>,
    pan_start_pos: Point<Pixels>,
    context_menu: Option<ContextMenu>,
    show_help: bool,
    show_errors: bool,
}

impl DecisionCanvas {
    pub fn new(
        config: &EditorConfig,
        document: Option<PathBuf>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let focus_handle = cx.focus_handle();
        window.focus(&focus_handle);

        let mut this = Self {
            session: Session::new(config, LatestFrame::default()),
            backend: Arc::new(JsonFileBackend),
            focus_handle,
            zoom: 1.0,
            pan: point(px(0.0), px(0.0)),
            container_offset: point(px(0.0), px(0.0)),
            container_size: size(px(0.0), px(0.0)),
            is_panning: false,
            pan_start: point(px(0.0), px(0.0)),
            pan_start_pos: point(px(0.0), px(0.0)),
            context_menu: None,
            show_help: false,
            show_errors: false,
        };
        this.session.redraw();
        if let Some(path) = document {
            this.open(path, cx);
        }
        this
    }

    /// Read `path` off the UI thread; input stays disabled until it lands
    fn open(&mut self, path: PathBuf, cx: &mut Context<Self>) {
        self.context_menu = None;
        let ticket = self.session.begin_import(path);
        let backend = self.backend.clone();
        let read_path = ticket.path().to_path_buf();
        let task = cx.background_spawn(async move { backend.get_nodes(&read_path) });

        cx.spawn(async move |this, cx| {
            let result = task.await;
            this.update(cx, |this, cx| {
                this.session.finish_import(ticket, result);
                this.reset_view();
                cx.notify();
            })
            .ok();
        })
        .detach();
        cx.notify();
    }

    fn prompt_open(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let paths = cx.prompt_for_paths(PathPromptOptions {
            files: true,
            directories: false,
            multiple: false,
            prompt: Some("Open a decision document".into()),
        });

        cx.spawn_in(window, async move |this, cx| {
            let path = paths.await.ok()?.ok()??.into_iter().next()?;
            this.update(cx, |this, cx| this.open(path, cx)).ok()
        })
        .detach();
    }

    fn save(&mut self, effect: Option<graphview::Effect>, cx: &mut Context<Self>) {
        let Some(graphview::Effect::Save { bundle, path }) = effect else {
            return;
        };
        let backend = self.backend.clone();
        let task = cx.background_spawn(async move {
            let result = backend.send_nodes(&bundle, &path);
            (path, result)
        });

        cx.spawn(async move |this, cx| {
            let (path, result) = task.await;
            this.update(cx, |this, cx| {
                this.session.finish_save(&path, result);
                cx.notify();
            })
            .ok();
        })
        .detach();
    }

    fn dispatch(&mut self, input: EditorInput, cx: &mut Context<Self>) {
        let effect = self.session.handle(input);
        if let Some(id) = self.session.sink_mut().take_focus() {
            self.scroll_to(id);
        }
        self.save(effect, cx);
        cx.notify();
    }

    fn is_editing(&self) -> bool {
        matches!(self.session.mode(), Mode::EditingText { .. })
    }

    fn reset_view(&mut self) {
        self.zoom = 1.0;
        self.pan = point(px(0.0), px(0.0));
    }

    /// Bring a node into view when it is outside the visible area
    fn scroll_to(&mut self, id: RenderId) {
        let Some(node) = self.session.model().node(id) else {
            return;
        };
        let x = self.pan.x + px(node.position.x * self.zoom);
        let y = self.pan.y + px(node.position.y * self.zoom);
        let visible = self.container_size;
        if x < px(0.0) || y < px(0.0) || x > visible.width || y > visible.height {
            self.pan = point(
                visible.width / 2.0 - px(node.position.x * self.zoom),
                visible.height / 2.0 - px(node.position.y * self.zoom),
            );
        }
    }

    /// Topmost node under a container-local point
    fn hit_test(&self, cursor: Point<Pixels>) -> Option<RenderId> {
        let x = f32::from((cursor.x - self.pan.x) / self.zoom);
        let y = f32::from((cursor.y - self.pan.y) / self.zoom);
        self.session
            .model()
            .nodes()
            .filter(|node| {
                let origin = node.origin();
                x >= origin.x
                    && x <= origin.x + node.size.width
                    && y >= origin.y
                    && y <= origin.y + node.size.height
            })
            .last()
            .map(|node| node.id)
    }

    fn local(&self, position: Point<Pixels>) -> Point<Pixels> {
        point(
            position.x - self.container_offset.x,
            position.y - self.container_offset.y,
        )
    }

    fn on_key_down(&mut self, event: &KeyDownEvent, window: &mut Window, cx: &mut Context<Self>) {
        let keystroke = &event.keystroke;
        let ctrl = keystroke.modifiers.control || keystroke.modifiers.platform;

        if !self.is_editing() {
            match keystroke.key.as_str() {
                "o" if ctrl => {
                    self.prompt_open(window, cx);
                    return;
                }
                "f1" => {
                    self.show_help = !self.show_help;
                    cx.notify();
                    return;
                }
                "f2" => {
                    self.show_errors = !self.show_errors;
                    if self.show_errors {
                        self.session.errors_mut().mark_seen();
                    }
                    cx.notify();
                    return;
                }
                "escape" if self.show_help || self.show_errors || self.context_menu.is_some() => {
                    self.show_help = false;
                    self.show_errors = false;
                    self.context_menu = None;
                    cx.notify();
                    return;
                }
                _ => {}
            }
        }

        let press = KeyPress {
            key: keystroke.key.clone(),
            text: keystroke.key_char.clone(),
            ctrl,
        };
        self.dispatch(EditorInput::Key(press), cx);
        cx.stop_propagation();
    }

    fn render_edges(&self, frame: &RenderFrame, cx: &App) -> impl IntoElement {
        let zoom = self.zoom;
        let pan = self.pan;
        let glow = cx.theme().ring.opacity(0.35);
        let selected = frame.selected;
        let nodes = frame.nodes.clone();
        let edges = frame.edges.clone();

        canvas(
            |_bounds, _window, _cx| (),
            move |bounds, _state, window, _cx| {
                let offset = bounds.origin;
                let thickness = (1.5f32 * zoom).max(1.0);

                let draw_segment = |path: &mut gpui::Path<Pixels>,
                                    p1: Point<Pixels>,
                                    p2: Point<Pixels>,
                                    half_thickness: f32| {
                    let dir = point(p2.x - p1.x, p2.y - p1.y);
                    let len = dir.magnitude() as f32;
                    if len <= 0.0001 {
                        return;
                    }
                    let normal = point(-dir.y, dir.x) * (half_thickness / len);

                    let p1a = point(p1.x + normal.x, p1.y + normal.y);
                    let p1b = point(p1.x - normal.x, p1.y - normal.y);
                    let p2a = point(p2.x + normal.x, p2.y + normal.y);
                    let p2b = point(p2.x - normal.x, p2.y - normal.y);

                    let st = (point(0., 1.), point(0., 1.), point(0., 1.));
                    path.push_triangle((p1a, p1b, p2a), st);
                    path.push_triangle((p2a, p1b, p2b), st);
                };

                let draw_arrow = |path: &mut gpui::Path<Pixels>, p1: Point<Pixels>, p2: Point<Pixels>| {
                    let dir = point(p2.x - p1.x, p2.y - p1.y);
                    let len = dir.magnitude() as f32;
                    if len <= 0.0001 {
                        return;
                    }
                    let back = dir * (8.0 * zoom / len);
                    let side = point(-dir.y, dir.x) * (4.0 * zoom / len);
                    let base = point(p2.x - back.x, p2.y - back.y);
                    let st = (point(0., 1.), point(0., 1.), point(0., 1.));
                    path.push_triangle(
                        (
                            p2,
                            point(base.x + side.x, base.y + side.y),
                            point(base.x - side.x, base.y - side.y),
                        ),
                        st,
                    );
                };

                let screen = |x: f32, y: f32| {
                    point(
                        offset.x + pan.x + px(x * zoom),
                        offset.y + pan.y + px(y * zoom),
                    )
                };

                let mut glow_path = gpui::Path::new(offset);
                let mut paths: Vec<(EdgeKind, gpui::Path<Pixels>)> = [
                    EdgeKind::Default,
                    EdgeKind::Pro,
                    EdgeKind::Con,
                ]
                .into_iter()
                .map(|kind| (kind, gpui::Path::new(offset)))
                .collect();

                for edge in &edges {
                    let source = nodes.iter().find(|n| n.id == edge.source);
                    let target = nodes.iter().find(|n| n.id == edge.target);
                    let (Some(source), Some(target)) = (source, target) else {
                        continue;
                    };
                    // Bottom centre of the parent to top centre of the child
                    let p1 = screen(
                        source.position.x,
                        source.position.y + source.size.height / 2.0,
                    );
                    let p2 = screen(
                        target.position.x,
                        target.position.y - target.size.height / 2.0,
                    );

                    if selected.is_some_and(|id| edge.touches(id)) {
                        draw_segment(&mut glow_path, p1, p2, thickness * 3.0);
                    }
                    if let Some((_, path)) = paths.iter_mut().find(|(kind, _)| *kind == edge.kind) {
                        draw_segment(path, p1, p2, thickness);
                        draw_arrow(path, p1, p2);
                    }
                }

                window.paint_path(glow_path, glow);
                for (kind, path) in paths {
                    window.paint_path(path, rgb(kind.stroke()));
                }
            },
        )
        .absolute()
        .size_full()
    }

    fn render_context_menu(&self, cx: &mut Context<Self>) -> Option<Div> {
        let menu = self.context_menu.as_ref()?;
        let node = menu.node;
        let border_color = cx.theme().border;
        let hover_bg = cx.theme().secondary;

        let item = |kind: RelationKind, cx: &mut Context<Self>| {
            div()
                .px(px(10.0))
                .py(px(4.0))
                .cursor_pointer()
                .hover(|this| this.bg(hover_bg))
                .child(kind.label())
                .on_mouse_down(
                    MouseButton::Left,
                    cx.listener(move |this, _e: &MouseDownEvent, _w, cx| {
                        cx.stop_propagation();
                        this.context_menu = None;
                        this.dispatch(EditorInput::ContextMenu { node, kind }, cx);
                    }),
                )
        };

        Some(
            div()
                .absolute()
                .left(menu.position.x)
                .top(menu.position.y)
                .py(px(4.0))
                .bg(cx.theme().background)
                .text_color(cx.theme().foreground)
                .border(px(1.0))
                .border_color(border_color)
                .rounded(px(4.0))
                .shadow_md()
                .flex()
                .flex_col()
                .child(item(RelationKind::Pro, cx))
                .child(item(RelationKind::Con, cx)),
        )
    }

    fn render_help(&self, cx: &App) -> impl IntoElement {
        panel(cx)
            .right(px(8.0))
            .top(px(8.0))
            .children(SHORTCUTS.iter().map(|section| {
                div()
                    .flex()
                    .flex_col()
                    .gap_1()
                    .child(div().font_weight(FontWeight::SEMIBOLD).child(section.title))
                    .children(section.shortcuts.iter().map(|shortcut| {
                        div()
                            .flex()
                            .gap_2()
                            .child(div().w(px(150.0)).child(shortcut.keys))
                            .child(shortcut.description)
                    }))
            }))
    }

    fn render_errors(&self, cx: &App) -> impl IntoElement {
        let errors = self.session.errors();
        panel(cx)
            .left(px(8.0))
            .top(px(8.0))
            .max_w(px(480.0))
            .child(div().font_weight(FontWeight::SEMIBOLD).child("Errors"))
            .when(errors.is_empty(), |this| this.child("No errors"))
            .children(
                errors
                    .newest_first()
                    .map(|err| div().text_color(cx.theme().danger).child(err.to_string())),
            )
    }

    fn render_status(&self, frame: Option<&RenderFrame>, cx: &mut Context<Self>) -> Div {
        let hint = match self.session.mode() {
            _ if self.session.is_importing() => "Loading…",
            Mode::Idle => "F1 for shortcuts",
            Mode::PendingCreateType => "New node: d o p c n",
            Mode::EditingText { .. } => "Editing: Ctrl+E to save, Escape to cancel",
            Mode::PendingEdgeTarget { .. } => "Click the node this relationship is for",
        };
        let title = frame.map(|f| f.title.clone()).unwrap_or_default();
        let path = self
            .session
            .file_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unsaved".to_string());
        let errors = self.session.errors();
        let error_label = format!("{} errors", errors.len());
        let error_color = if errors.has_new() {
            cx.theme().danger
        } else {
            cx.theme().muted_foreground
        };

        div()
            .absolute()
            .bottom_0()
            .left_0()
            .right_0()
            .px(px(8.0))
            .py(px(4.0))
            .flex()
            .gap_4()
            .bg(cx.theme().background.opacity(0.9))
            .border_t(px(1.0))
            .border_color(cx.theme().border)
            .text_size(px(12.0))
            .text_color(cx.theme().foreground)
            .child(div().font_weight(FontWeight::MEDIUM).child(title))
            .child(path)
            .child(div().flex_1().child(hint))
            .child(
                div()
                    .cursor_pointer()
                    .text_color(error_color)
                    .child(error_label)
                    .on_mouse_down(
                        MouseButton::Left,
                        cx.listener(|this, _e: &MouseDownEvent, _w, cx| {
                            cx.stop_propagation();
                            this.show_errors = !this.show_errors;
                            this.session.errors_mut().mark_seen();
                            cx.notify();
                        }),
                    ),
            )
    }
}

fn panel(cx: &App) -> Div {
    div()
        .absolute()
        .p(px(8.0))
        .flex()
        .flex_col()
        .gap_2()
        .text_size(px(12.0))
        .text_color(cx.theme().foreground)
        .bg(cx.theme().background.opacity(0.95))
        .border(px(1.0))
        .border_color(cx.theme().border)
        .rounded(px(6.0))
}

impl Focusable for DecisionCanvas {
    fn focus_handle(&self, _cx: &App) -> FocusHandle {
        self.focus_handle.clone()
    }
}

impl Render for DecisionCanvas {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let frame = self.session.sink().frame().cloned();

        // Track container bounds for hit testing and scrolling
        let entity = cx.entity();
        let bounds_tracker = canvas(
            |_bounds, _window, _cx| (),
            move |bounds, _state, _window, cx| {
                cx.update_entity(&entity, |this, _| {
                    this.container_offset = bounds.origin;
                    this.container_size = bounds.size;
                });
            },
        )
        .absolute()
        .size_full();

        let mut graph_canvas = div().relative().size_full().child(bounds_tracker);
        if let Some(frame) = &frame {
            let editing = frame.editing.as_ref().map(|e| e.node);
            let linking = frame.pending_link.map(|l| l.child);
            graph_canvas = graph_canvas
                .child(self.render_edges(frame, cx))
                .children(frame.nodes.iter().map(|node| {
                    let text = frame.display_text(node.id).unwrap_or_default().to_string();
                    NodeBox::new(node.clone(), text)
                        .selected(frame.selected == Some(node.id))
                        .editing(editing == Some(node.id))
                        .linking(linking == Some(node.id))
                        .view(self.zoom, self.pan)
                }));
        }

        let context_menu = self.render_context_menu(cx);
        let status = self.render_status(frame.as_ref(), cx);

        div()
            .id("decision-canvas")
            .size_full()
            .relative()
            .overflow_hidden()
            .bg(cx.theme().background)
            .track_focus(&self.focus_handle)
            .on_key_down(cx.listener(Self::on_key_down))
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, e: &MouseDownEvent, window, cx| {
                    window.focus(&this.focus_handle);
                    this.context_menu = None;
                    let cursor = this.local(e.position);
                    match this.hit_test(cursor) {
                        Some(node) => this.dispatch(EditorInput::NodeClick(node), cx),
                        None => {
                            this.is_panning = true;
                            this.pan_start = this.pan;
                            this.pan_start_pos = cursor;
                            this.dispatch(EditorInput::BackgroundClick, cx);
                        }
                    }
                }),
            )
            .on_mouse_down(
                MouseButton::Right,
                cx.listener(|this, e: &MouseDownEvent, _w, cx| {
                    let cursor = this.local(e.position);
                    this.context_menu = this
                        .hit_test(cursor)
                        .filter(|id| {
                            this.session.model().node(*id).is_some_and(|n| {
                                matches!(n.node_type(), NodeType::Pro | NodeType::Con)
                            })
                        })
                        .map(|node| ContextMenu {
                            node,
                            position: cursor,
                        });
                    cx.notify();
                }),
            )
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, _e: &MouseUpEvent, _w, cx| {
                    this.is_panning = false;
                    cx.notify();
                }),
            )
            .on_mouse_move(cx.listener(|this, e: &MouseMoveEvent, _w, cx| {
                if !this.is_panning {
                    return;
                }
                if e.pressed_button != Some(MouseButton::Left) {
                    this.is_panning = false;
                    cx.notify();
                    return;
                }
                let current = this.local(e.position);
                this.pan = point(
                    this.pan_start.x + current.x - this.pan_start_pos.x,
                    this.pan_start.y + current.y - this.pan_start_pos.y,
                );
                cx.notify();
            }))
            .on_scroll_wheel(cx.listener(|this, event: &ScrollWheelEvent, _window, cx| {
                let dy = event.delta.pixel_delta(px(16.0)).y;
                if dy == px(0.0) {
                    return;
                }
                let factor = if dy > px(0.0) { 1.1 } else { 0.9 };
                let old_zoom = this.zoom;
                let new_zoom = (old_zoom * factor).clamp(0.25, 4.0);

                // Zoom toward the cursor
                let s = this.local(event.position);
                let world_x = (s.x - this.pan.x) / old_zoom;
                let world_y = (s.y - this.pan.y) / old_zoom;
                this.pan = point(s.x - world_x * new_zoom, s.y - world_y * new_zoom);
                this.zoom = new_zoom;
                cx.notify();
            }))
            .child(graph_canvas)
            .when_some(context_menu, |this, menu| this.child(menu))
            .when(self.show_help, |this| this.child(self.render_help(cx)))
            .when(self.show_errors, |this| this.child(self.render_errors(cx)))
            .child(status)
    }
}
