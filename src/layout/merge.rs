use super::*;
use crate::log::debug;
use crate::shape::MergeShape;

/// Arrow head that may still be pulled to the right by a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Move {
    pub arrow: usize,
    pub data_text: Option<usize>,
    pub dst_port_text: Option<usize>,
    /// Bottom of the row the arrow is in.
    pub yn: i32,
}

/// Arrows collected so far for one merge point.
#[derive(Debug, Clone)]
pub(super) struct MergeAccumulator {
    pub moves: Vec<Move>,
    pub arrived: usize,
    pub x0: i32,
    pub y0: i32,
    pub yn: i32,
}

impl FlowLayouter<'_> {
    /// Records one more arrow for `merge`. Once all expected arrows are in,
    /// their heads are aligned at the rightmost one and the finished
    /// accumulator is returned.
    pub(super) fn merge(
        &mut self,
        merge: &MergeShape,
        head: Move,
        x: i32,
        y: i32,
    ) -> Option<MergeAccumulator> {
        let acc = self
            .merges
            .entry(merge.id.clone())
            .and_modify(|acc| {
                acc.x0 = acc.x0.max(x);
                acc.y0 = acc.y0.min(y);
                acc.yn = acc.yn.max(head.yn);
                acc.arrived += 1;
                acc.moves.push(head);
            })
            .or_insert_with(|| MergeAccumulator {
                moves: vec![head],
                arrived: 1,
                x0: x,
                y0: y,
                yn: head.yn,
            });
        if acc.arrived < merge.size {
            return None;
        }

        let acc = self.merges.remove(&merge.id)?;
        for head in &acc.moves {
            self.move_head_to(head, acc.x0);
        }
        debug!(id = %merge.id, x = acc.x0, arrows = acc.arrived, "merge complete");
        Some(acc)
    }

    fn move_head_to(&mut self, head: &Move, x: i32) {
        let arrow = &mut self.layout.arrows[head.arrow];
        let shift = x - arrow.x2;
        arrow.x2 = x;
        arrow.x_tip1 = x - 8;
        arrow.x_tip2 = x - 8;
        if let Some(idx) = head.dst_port_text {
            self.layout.texts[idx].x += shift;
        }
        if let Some(idx) = head.data_text {
            self.layout.texts[idx].x += shift / 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ArrowShape;

    #[test]
    fn merge_waits_for_all_arrows() {
        let config = LayoutConfig::default();
        let mut layouter = FlowLayouter::new(&config);
        let merge = MergeShape {
            id: "m".to_string(),
            size: 2,
        };
        let arrow = ArrowShape {
            data_type: "(d)".to_string(),
            has_src_op: true,
            has_dst_op: true,
            dst_port: "in".to_string(),
            ..ArrowShape::default()
        };

        let (x, _, first) = layouter.arrow(&arrow, 0, 0);
        assert!(layouter.merge(&merge, first, x, 0).is_none());

        let (x2, _, second) = layouter.arrow(&arrow, 60, 70);
        let done = layouter.merge(&merge, second, x2, 70).unwrap();
        assert_eq!(done.arrived, 2);
        assert_eq!((done.x0, done.y0), (x2, 0));
        assert_eq!(done.yn, 70 + 48);

        let arrows = &layouter.layout.arrows;
        assert_eq!(arrows[0].x2, x2);
        assert_eq!(arrows[0].x_tip1, x2 - 8);
        // Port label moves all the way, the data label half way.
        let shift = x2 - x;
        let dst = &layouter.layout.texts[first.dst_port_text.unwrap()];
        assert_eq!(dst.x, x - 24 - 12 + shift);
        let data = &layouter.layout.texts[first.data_text.unwrap()];
        assert_eq!(data.x, ((x - 12) - 36) / 2 + shift / 2);
        assert!(layouter.merges.is_empty());
    }

    #[test]
    fn three_arrivals_complete_one_accumulator() {
        let config = LayoutConfig::default();
        let mut layouter = FlowLayouter::new(&config);
        let merge = MergeShape {
            id: "m".to_string(),
            size: 3,
        };
        let arrow = ArrowShape {
            data_type: "(d)".to_string(),
            has_src_op: true,
            has_dst_op: true,
            dst_port: "in".to_string(),
            ..ArrowShape::default()
        };

        let mut ends = Vec::new();
        for (idx, (x, y)) in [(0, 0), (40, 70)].into_iter().enumerate() {
            let (xn, _, head) = layouter.arrow(&arrow, x, y);
            ends.push(xn);
            assert!(layouter.merge(&merge, head, xn, y).is_none());
            assert_eq!(layouter.merges["m"].arrived, idx + 1);
        }
        let (xn, _, head) = layouter.arrow(&arrow, 10, 140);
        let done = layouter.merge(&merge, head, xn, 140).unwrap();

        assert_eq!(done.arrived, 3);
        assert_eq!(done.moves.len(), 3);
        assert_eq!(done.x0, ends[1]);
        assert_eq!(done.y0, 0);
        assert_eq!(done.yn, 140 + 48);
        for arrow in &layouter.layout.arrows {
            assert_eq!(arrow.x2, done.x0);
            assert_eq!(arrow.x_tip1, done.x0 - 8);
            assert_eq!(arrow.x_tip2, done.x0 - 8);
        }
        assert!(layouter.merges.is_empty());
    }
}
