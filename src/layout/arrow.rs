use super::*;
use crate::shape::ArrowShape;

/// Length of the arrow head along the shaft and across it.
const TIP: i32 = 8;

impl FlowLayouter<'_> {
    /// Lays out an arrow with its ports and data type.
    ///
    /// Ports without a neighbouring box are written before or after the
    /// arrow; ports next to a box go underneath the shaft. Returns the new
    /// cursor position and the movable arrow head.
    pub(super) fn arrow(&mut self, arrow: &ArrowShape, mut x: i32, y: i32) -> (i32, i32, Move) {
        let y = y + LINE_HEIGHT;
        let mut port_len = 0;

        let src_len = arrow.src_port.chars().count() as i32;
        if !arrow.has_src_op {
            if src_len > 0 {
                self.push_text(x + 1, y + 6, src_len * CHAR_WIDTH - 2, arrow.src_port.as_str());
            }
            x += src_len * CHAR_WIDTH;
        } else {
            port_len += src_len;
            if src_len > 0 {
                self.push_text(x + 6, y + 20, src_len * CHAR_WIDTH, arrow.src_port.as_str());
            }
        }

        let dst_len = arrow.dst_port.chars().count() as i32;
        if arrow.has_dst_op {
            port_len += dst_len;
        }

        let data_len = arrow.data_type.chars().count() as i32;
        let width = (port_len + 2).max(data_len + 2) * CHAR_WIDTH + 18;
        let data_text = (data_len > 0).then(|| {
            self.push_text(
                x + ((width - CHAR_WIDTH) - data_len * CHAR_WIDTH) / 2,
                y - TIP,
                data_len * CHAR_WIDTH,
                arrow.data_type.as_str(),
            )
        });

        let x2 = x + width;
        self.layout.arrows.push(ArrowLayout {
            x1: x,
            y1: y,
            x2,
            y2: y,
            x_tip1: x2 - TIP,
            y_tip1: y - TIP,
            x_tip2: x2 - TIP,
            y_tip2: y + TIP,
        });
        let arrow_idx = self.layout.arrows.len() - 1;
        x = x2;

        let mut dst_port_text = None;
        if !arrow.has_dst_op {
            if dst_len > 0 {
                self.push_text(x + 3, y + 6, dst_len * CHAR_WIDTH - 2, arrow.dst_port.as_str());
            }
            x += 3 + dst_len * CHAR_WIDTH;
        } else if dst_len > 0 {
            dst_port_text = Some(self.push_text(
                x - dst_len * CHAR_WIDTH - CHAR_WIDTH,
                y + 20,
                dst_len * CHAR_WIDTH,
                arrow.dst_port.as_str(),
            ));
        }

        let head = Move {
            arrow: arrow_idx,
            data_text,
            dst_port_text,
            yn: y + LINE_HEIGHT,
        };
        (x, y + 36, head)
    }
}
