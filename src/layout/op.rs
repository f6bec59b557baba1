use super::*;
use crate::shape::{OpShape, PluginShape};

const PADDING: i32 = 12;

fn plugin_width(plugin: &PluginShape) -> i32 {
    let title_width = if plugin.title.is_empty() {
        0
    } else {
        text_width(&plugin.title) + CHAR_WIDTH + PADDING
    };
    let entry_len = plugin.entries.iter().map(|e| e.max_len()).max().unwrap_or(0) as i32;
    title_width.max(entry_len * CHAR_WIDTH + PADDING)
}

impl FlowLayouter<'_> {
    /// Lays out a box with its plugins.
    ///
    /// A box right after a completed merge is anchored at the merge and
    /// stretched over all rows that lead into it. Returns the index of the
    /// main rect, the top the rest of the row continues from, and the new
    /// cursor position.
    pub(super) fn op(&mut self, op: &OpShape, x0: i32, y0: i32) -> (usize, i32, i32, i32) {
        let mut width = op.main.max_len() as i32 * CHAR_WIDTH + 2 * PADDING;
        for plugin in &op.plugins {
            width = width.max(plugin_width(plugin));
        }

        let (x0, y0, min_height) = match self.completed.take() {
            Some(merge) => (merge.x0, merge.y0, merge.yn - merge.y0),
            None => (x0, y0, 0),
        };

        let title_height = op.main.lines.len() as i32 * LINE_HEIGHT + PADDING;
        self.layout.rects.push(RectLayout {
            x: x0,
            y: y0 + 6,
            width,
            height: min_height.max(title_height),
            is_plugin: false,
        });
        let rect = self.layout.rects.len() - 1;

        for (k, line) in op.main.lines.iter().enumerate() {
            self.push_text(
                x0 + PADDING,
                y0 + PADDING + 18 + k as i32 * LINE_HEIGHT,
                text_width(line),
                line.as_str(),
            );
        }

        let mut y = y0 + 6 + title_height;
        let mut yn = y0 + self.layout.rects[rect].height + PADDING;
        for plugin in &op.plugins {
            y = self.plugin(plugin, width, x0, y);
        }
        if !op.plugins.is_empty() {
            y += 6;
            let main = &mut self.layout.rects[rect];
            main.height = (main.height + 6).max(y - y0);
            yn = yn.max(y0 + main.height + PADDING);
        }

        (rect, y0, x0 + width, yn)
    }

    /// Stacks one plugin block inside a box; returns its bottom.
    fn plugin(&mut self, plugin: &PluginShape, width: i32, x0: i32, y0: i32) -> i32 {
        let mut y = y0 + 3;
        let titled = !plugin.title.is_empty();
        if titled {
            let title = format!("{}:", plugin.title);
            self.push_text(x0 + 6, y + 18, text_width(&title), title);
            y += LINE_HEIGHT;
        }

        for (i, entry) in plugin.entries.iter().enumerate() {
            if i > 0 || titled {
                self.layout.lines.push(LineLayout {
                    x1: x0,
                    y1: y,
                    x2: x0 + width,
                    y2: y,
                });
                y += 3;
            }
            for line in &entry.lines {
                self.push_text(x0 + 6, y + 18, text_width(line), line.as_str());
                y += LINE_HEIGHT;
            }
        }
        y += 3;

        self.layout.rects.push(RectLayout {
            x: x0,
            y: y0,
            width,
            height: y - y0,
            is_plugin: true,
        });
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::TextBox;

    fn plugin(title: &str, entries: &[&str]) -> PluginShape {
        PluginShape {
            title: title.to_string(),
            entries: entries
                .iter()
                .map(|e| TextBox::new(vec![e.to_string()]))
                .collect(),
        }
    }

    #[test]
    fn box_width_follows_the_longest_line() {
        let config = LayoutConfig::default();
        let mut layouter = FlowLayouter::new(&config);
        let op = OpShape {
            main: TextBox::new(vec!["a".to_string(), "Adder".to_string()]),
            plugins: Vec::new(),
        };
        let (rect, y0, xn, yn) = layouter.op(&op, 10, 1);
        let rect = layouter.layout.rects[rect];
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (10, 7, 84, 60));
        assert_eq!((y0, xn, yn), (1, 94, 73));
        assert_eq!(layouter.layout.texts[1].y, 1 + 12 + 18 + 24);
    }

    #[test]
    fn plugins_stack_inside_the_box() {
        let config = LayoutConfig::default();
        let mut layouter = FlowLayouter::new(&config);
        let op = OpShape {
            main: TextBox::new(vec!["a".to_string()]),
            plugins: vec![plugin("logger", &["io.Writer"]), plugin("", &["q.X", "q.Y"])],
        };
        let (rect, _, xn, yn) = layouter.op(&op, 0, 0);

        // "logger:" needs 7 cells plus padding, "io.Writer" 9 cells.
        assert_eq!(xn, 9 * 12 + 12);
        let rects = &layouter.layout.rects;
        let logger = rects[1];
        assert!(logger.is_plugin);
        assert_eq!((logger.y, logger.height), (42, 3 + 24 + 3 + 24 + 3));
        let plain = rects[2];
        assert_eq!(plain.y, logger.bottom());
        assert_eq!(plain.height, 3 + 24 + 3 + 24 + 3);
        // Dividers: one under the title, one between the plain entries.
        assert_eq!(layouter.layout.lines.len(), 2);

        let main = rects[rect];
        assert_eq!(main.height, plain.bottom() + 6);
        assert_eq!(yn, main.height + 12);
    }

    #[test]
    fn completed_merge_anchors_the_box() {
        let config = LayoutConfig::default();
        let mut layouter = FlowLayouter::new(&config);
        layouter.completed = Some(MergeAccumulator {
            moves: Vec::new(),
            arrived: 2,
            x0: 300,
            y0: 1,
            yn: 114,
        });
        let op = OpShape {
            main: TextBox::new(vec!["m".to_string()]),
            plugins: Vec::new(),
        };
        let (rect, y0, xn, _) = layouter.op(&op, 50, 66);
        let rect = layouter.layout.rects[rect];
        assert_eq!((rect.x, rect.y, rect.height), (300, 7, 113));
        assert_eq!((y0, xn), (1, 336));
        assert!(layouter.completed.is_none());
    }
}
