use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    /// Fill of the main box of a component.
    pub op_fill: String,
    pub plugin_fill: String,
    pub line_color: String,
    pub text_color: String,
}

impl Theme {
    /// Classic palette: light blue boxes with green plugins on white.
    pub fn flowdev() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_size: 16.0,
            background: "rgb(255,255,255)".to_string(),
            op_fill: "rgb(96,196,255)".to_string(),
            plugin_fill: "rgb(32,224,32)".to_string(),
            line_color: "rgb(0,0,0)".to_string(),
            text_color: "rgb(0,0,0)".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "ui-monospace, SFMono-Regular, Menlo, Consolas, monospace".to_string(),
            font_size: 16.0,
            background: "#FFFFFF".to_string(),
            op_fill: "#EEF2F8".to_string(),
            plugin_fill: "#DDF4E4".to_string(),
            line_color: "#7A8AA6".to_string(),
            text_color: "#1C2430".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::flowdev()
    }
}
