mod canvas;
mod node_view;

use std::path::PathBuf;

use anyhow::Context as _;
use gpui::*;
use gpui_component_assets::Assets;
use graphview::EditorConfig;
use tracing_subscriber::EnvFilter;

use crate::canvas::DecisionCanvas;

/// Names a JSON file with layout and text metric overrides
const CONFIG_ENV: &str = "DECISION_CANVAS_CONFIG";

fn load_config() -> anyhow::Result<EditorConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            EditorConfig::load(&path)
                .with_context(|| format!("loading config from {}", path.display()))
        }
        None => Ok(EditorConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let document = std::env::args_os().nth(1).map(PathBuf::from);

    Application::new().with_assets(Assets).run(move |cx: &mut App| {
        gpui_component::init(cx);
        cx.activate(true);

        let mut window_opts = WindowOptions::default();
        window_opts.app_id = Some("decision-canvas".to_string());

        let opened = cx.open_window(window_opts, |window, cx| {
            cx.new(|cx| DecisionCanvas::new(&config, document.clone(), window, cx))
        });
        if let Err(err) = opened {
            tracing::error!(%err, "failed to open window");
            cx.quit();
        }
    });
    Ok(())
}
