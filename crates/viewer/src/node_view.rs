use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::ActiveTheme;
use graphview::{EdgeKind, RenderNode};

/// One decision node, drawn at its laid-out box
#[derive(IntoElement)]
pub struct NodeBox {
    node: RenderNode,
    text: SharedString,
    selected: bool,
    editing: bool,
    linking: bool,
    zoom: f32,
    pan: Point<Pixels>,
}

impl NodeBox {
    pub fn new(node: RenderNode, text: impl Into<SharedString>) -> Self {
        Self {
            node,
            text: text.into(),
            selected: false,
            editing: false,
            linking: false,
            zoom: 1.0,
            pan: point(px(0.0), px(0.0)),
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn editing(mut self, editing: bool) -> Self {
        self.editing = editing;
        self
    }

    /// Node waiting for the user to pick its new parent
    pub fn linking(mut self, linking: bool) -> Self {
        self.linking = linking;
        self
    }

    pub fn view(mut self, zoom: f32, pan: Point<Pixels>) -> Self {
        self.zoom = zoom;
        self.pan = pan;
        self
    }
}

impl RenderOnce for NodeBox {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let zoom = self.zoom;
        let origin = self.node.origin();
        let node_type = self.node.node_type();

        let border_color: Hsla = if self.selected {
            cx.theme().ring
        } else if self.linking {
            rgb(EdgeKind::Con.stroke()).into()
        } else {
            cx.theme().border
        };
        let border_width = if self.selected || self.linking { 3.0 } else { 1.0 };

        // Caret while editing
        let text = if self.editing {
            SharedString::from(format!("{}▏", self.text))
        } else {
            self.text
        };

        div()
            .id(("node", self.node.id.0 as usize))
            .absolute()
            .left(self.pan.x + px(origin.x) * zoom)
            .top(self.pan.y + px(origin.y) * zoom)
            .w(px(self.node.size.width * zoom))
            .min_h(px(self.node.size.height * zoom))
            .px(px(12.0 * zoom))
            .py(px(12.0 * zoom))
            .bg(rgb(node_type.color()))
            .border(px(border_width))
            .border_color(border_color)
            .rounded(px(6.0 * zoom))
            .shadow_sm()
            .text_size(px(12.0 * zoom))
            .line_height(px(16.0 * zoom))
            .text_color(rgb(0x1f1f1f))
            .child(text)
            .when(self.node.style.comparative, |this| {
                this.child(
                    div()
                        .absolute()
                        .top(px(-8.0 * zoom))
                        .right(px(-8.0 * zoom))
                        .px(px(4.0 * zoom))
                        .rounded(px(3.0 * zoom))
                        .bg(rgb(0xffffff))
                        .border(px(1.0))
                        .border_color(cx.theme().border)
                        .text_size(px(9.0 * zoom))
                        .child("vs"),
                )
            })
    }
}
