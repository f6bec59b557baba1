//! Assigns pixel coordinates to the shape tree.
//!
//! Everything sits on a fixed grid of 12 pixel wide and 24 pixel high
//! character cells. Rows are laid out top to bottom and shapes left to
//! right while a cursor is threaded through the tree.

mod arrow;
mod merge;
mod op;
pub(crate) mod types;

pub use types::*;

use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::error::FlowError;
use crate::log::debug;
use crate::shape::{Shape, ShapeFlow};

use merge::{MergeAccumulator, Move};

pub(crate) const CHAR_WIDTH: i32 = 12;
pub(crate) const LINE_HEIGHT: i32 = 24;

const ORIGIN_X: i32 = 2;
const ORIGIN_Y: i32 = 1;
const MARGIN_RIGHT: i32 = 2;
const MARGIN_BOTTOM: i32 = 3;

fn text_width(text: &str) -> i32 {
    text.chars().count() as i32 * CHAR_WIDTH
}

/// Lays out a restructured flow.
pub fn compute_layout(flow: &ShapeFlow, config: &LayoutConfig) -> Result<Layout, FlowError> {
    if flow.is_empty() {
        return Err(FlowError::Empty);
    }
    let mut layouter = FlowLayouter::new(config);
    let (xmax, ymax) = layouter.layout_rows(&flow.rows, ORIGIN_X, ORIGIN_Y)?;
    let mut layout = layouter.layout;
    layout.width = xmax + MARGIN_RIGHT;
    layout.height = ymax + MARGIN_BOTTOM;
    debug!(
        width = layout.width,
        height = layout.height,
        arrows = layout.arrows.len(),
        rects = layout.rects.len(),
        "computed layout"
    );
    Ok(layout)
}

/// State of one layout run.
struct FlowLayouter<'a> {
    config: &'a LayoutConfig,
    layout: Layout,
    merges: HashMap<String, MergeAccumulator>,
    /// Merge that got all its arrows; the next box is placed at it.
    completed: Option<MergeAccumulator>,
}

impl<'a> FlowLayouter<'a> {
    fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            layout: Layout::default(),
            merges: HashMap::new(),
            completed: None,
        }
    }

    fn push_text(&mut self, x: i32, y: i32, width: i32, text: impl Into<String>) -> usize {
        self.layout.texts.push(TextLayout {
            x,
            y,
            width,
            text: text.into(),
        });
        self.layout.texts.len() - 1
    }

    /// Lays out `rows` starting at `(x0, y0)` and returns the right and
    /// bottom extent of the content.
    fn layout_rows(&mut self, rows: &[Vec<Shape>], x0: i32, mut y0: i32) -> Result<(i32, i32), FlowError> {
        let mut xmax = 0;
        let mut ymax = 0;
        let mut last_move: Option<Move> = None;

        for row in rows {
            if row.is_empty() {
                y0 += self.config.blank_row_gap;
                continue;
            }
            let mut x = x0;
            let mut last_rect: Option<usize> = None;
            for shape in row {
                let mut y = y0;
                match shape {
                    Shape::Arrow(arrow) => {
                        let (xn, yn, arrow_move) = self.arrow(arrow, x, y);
                        x = xn;
                        y = yn;
                        last_move = Some(arrow_move);
                        last_rect = None;
                    }
                    Shape::Op(op) => {
                        let (rect, row_y0, xn, yn) = self.op(op, x, y);
                        last_rect = Some(rect);
                        y0 = row_y0;
                        x = xn;
                        y = yn;
                    }
                    Shape::Label(label) => {
                        (x, y) = self.label(&label.target, x, y);
                    }
                    Shape::Split(split) => {
                        (x, y) = self.layout_rows(&split.branches, x, y)?;
                        if let Some(idx) = last_rect.take() {
                            let rect = &mut self.layout.rects[idx];
                            if rect.bottom() < y {
                                rect.height = y - rect.y;
                            }
                        }
                    }
                    Shape::Merge(merge) => {
                        let arrow_move = last_move.take().ok_or_else(|| {
                            FlowError::structural(format!(
                                "merge '{}' is not preceded by an arrow",
                                merge.id
                            ))
                        })?;
                        self.completed = self.merge(merge, arrow_move, x, y);
                    }
                }
                ymax = ymax.max(y);
            }
            xmax = xmax.max(x);
            y0 = ymax + self.config.row_gap;
        }
        Ok((xmax, ymax))
    }

    /// `... back to: name` marker of a broken cycle.
    fn label(&mut self, target: &str, x: i32, y: i32) -> (i32, i32) {
        let text = format!("... back to: {target}");
        let width = text_width(&text);
        self.push_text(x, y + 6, width, text);
        (x + 2 * width + CHAR_WIDTH, y + 12)
    }
}
