//! Restructured diagram tree, ready for layout.

/// Rows of shapes; a blank row is a spacer between unrelated parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeFlow {
    pub rows: Vec<Vec<Shape>>,
}

impl ShapeFlow {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Arrow(ArrowShape),
    Op(OpShape),
    Merge(MergeShape),
    Split(SplitShape),
    Label(LabelShape),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrowShape {
    pub data_type: String,
    pub has_src_op: bool,
    pub src_port: String,
    pub has_dst_op: bool,
    pub dst_port: String,
}

/// A box: the main rectangle plus plugin blocks stacked inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpShape {
    pub main: TextBox,
    pub plugins: Vec<PluginShape>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBox {
    pub lines: Vec<String>,
}

impl TextBox {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub(crate) fn max_len(&self) -> usize {
        self.lines.iter().map(|line| line.chars().count()).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginShape {
    pub title: String,
    pub entries: Vec<TextBox>,
}

/// Point where `size` arrows end in the same box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeShape {
    pub id: String,
    pub size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitShape {
    pub branches: Vec<Vec<Shape>>,
}

/// Marks a back reference to a box further up the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelShape {
    pub target: String,
}
