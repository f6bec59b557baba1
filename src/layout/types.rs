use serde::Serialize;

/// Pixel positioned diagram primitives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub width: i32,
    pub height: i32,
    pub arrows: Vec<ArrowLayout>,
    pub rects: Vec<RectLayout>,
    pub lines: Vec<LineLayout>,
    pub texts: Vec<TextLayout>,
}

/// Arrow shaft from `(x1, y1)` to `(x2, y2)`; the head is drawn as two
/// lines from the tips to `(x2, y2)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArrowLayout {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub x_tip1: i32,
    pub y_tip1: i32,
    pub x_tip2: i32,
    pub y_tip2: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RectLayout {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub is_plugin: bool,
}

impl RectLayout {
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

/// Divider between plugin entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineLayout {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// Single line of text; `width` is the length the glyphs are stretched to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextLayout {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub text: String,
}
