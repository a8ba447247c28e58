use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Spacing handed to the hierarchical layout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical gap between ranks, added to the tallest node
    pub rank_sep: f32,
    /// Horizontal gap between nodes of one rank, added to the widest node
    pub node_sep: f32,
    /// Offset of the top-left-most node from the canvas origin
    pub margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_sep: 100.0,
            node_sep: 200.0,
            margin: 50.0,
        }
    }
}

/// Fixed font metric used to size node boxes before layout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextMetrics {
    pub char_width: f32,
    pub line_height: f32,
    pub max_wrap_width: f32,
    pub padding: f32,
    pub min_width: f32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 7.2,
            line_height: 16.0,
            max_wrap_width: 220.0,
            padding: 24.0,
            min_width: 60.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub layout: LayoutConfig,
    pub text: TextMetrics,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "cannot read config: {err}"),
            ConfigError::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl EditorConfig {
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(ConfigError::Parse)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json(&content)
    }
}
