use crate::layout::Layout;
use crate::shape::{Shape, ShapeFlow};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Debug view of a layout run: the shape tree summary next to the geometry.
#[derive(Debug, Serialize)]
pub struct LayoutDump<'a> {
    pub rows: Vec<Vec<String>>,
    pub layout: &'a Layout,
}

impl<'a> LayoutDump<'a> {
    pub fn from_layout(layout: &'a Layout, flow: &ShapeFlow) -> Self {
        Self {
            rows: flow.rows.iter().map(|row| summarize_row(row)).collect(),
            layout,
        }
    }
}

fn summarize_row(row: &[Shape]) -> Vec<String> {
    row.iter().map(summarize).collect()
}

fn summarize(shape: &Shape) -> String {
    match shape {
        Shape::Arrow(arrow) => {
            let mut text = String::from("arrow");
            if !arrow.data_type.is_empty() {
                text.push(' ');
                text.push_str(&arrow.data_type);
            }
            text
        }
        Shape::Op(op) => format!("op {}", op.main.lines.join(" ")),
        Shape::Merge(merge) => format!("merge {} x{}", merge.id, merge.size),
        Shape::Label(label) => format!("label {}", label.target),
        Shape::Split(split) => {
            let branches: Vec<String> = split
                .branches
                .iter()
                .map(|b| summarize_row(b).join(", "))
                .collect();
            format!("split [{}]", branches.join(" | "))
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout, flow: &ShapeFlow) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, flow);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
