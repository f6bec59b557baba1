use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Vertical gap between two rows of shapes.
    pub row_gap: i32,
    /// Extra gap added by a spacer row between unrelated parts of a flow.
    pub blank_row_gap: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_gap: 5,
            blank_row_gap: 48,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Size used for PNG output when the SVG has no usable size.
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::flowdev(),
            layout: LayoutConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    op_fill: Option<String>,
    plugin_fill: Option<String>,
    line_color: Option<String>,
    text_color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    row_gap: Option<i32>,
    blank_row_gap: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
}

/// Reads a JSON config file; comments and trailing commas are allowed.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    match parsed.theme.as_deref() {
        None | Some("default") | Some("flowdev") => {}
        Some("modern") => config.theme = Theme::modern(),
        Some(other) => anyhow::bail!("unknown theme '{other}'"),
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.op_fill {
            config.theme.op_fill = v;
        }
        if let Some(v) = vars.plugin_fill {
            config.theme.plugin_fill = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.row_gap {
            config.layout.row_gap = v;
        }
        if let Some(v) = layout.blank_row_gap {
            config.layout.blank_row_gap = v;
        }
    }

    Ok(config)
}
