//! Row clusters: closed intervals of row indices that have to stay adjacent
//! in the diagram because merge arrows connect them.

/// Sorted, non-overlapping intervals `(min, max)` with `min < max`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clusters {
    ranges: Vec<(usize, usize)>,
}

impl Clusters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clusters for every run of adjacent non-blank rows.
    pub fn from_runs(blank: impl IntoIterator<Item = bool>) -> Self {
        let mut clusters = Self::new();
        let mut start: Option<usize> = None;
        let mut last = 0;
        for (idx, is_blank) in blank.into_iter().enumerate() {
            last = idx;
            match (is_blank, start) {
                (false, None) => start = Some(idx),
                (true, Some(min)) => {
                    clusters.add(min, idx - 1);
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(min) = start {
            clusters.add(min, last);
        }
        clusters
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ranges.iter().copied()
    }

    /// Adds the interval `[min, max]`, merging it with every interval it
    /// overlaps or touches at an endpoint.
    pub fn add(&mut self, min: usize, max: usize) {
        if min >= max {
            return;
        }
        for idx in 0..self.ranges.len() {
            let (cur_min, cur_max) = self.ranges[idx];
            if max < cur_min {
                self.ranges.insert(idx, (min, max));
                return;
            }
            if min >= cur_min && max <= cur_max {
                return;
            }
            if min < cur_min {
                self.ranges[idx] = (min, cur_max.max(max));
                self.coalesce_from(idx);
                return;
            }
            if min <= cur_max && max > cur_max {
                self.ranges[idx].1 = max;
                self.coalesce_from(idx);
                return;
            }
        }
        self.ranges.push((min, max));
    }

    fn coalesce_from(&mut self, idx: usize) {
        while idx + 1 < self.ranges.len() && self.ranges[idx + 1].0 <= self.ranges[idx].1 {
            let (_, next_max) = self.ranges.remove(idx + 1);
            self.ranges[idx].1 = self.ranges[idx].1.max(next_max);
        }
    }

    /// The interval containing `row`, or `(row, row)` if there is none.
    pub fn containing(&self, row: usize) -> (usize, usize) {
        for &(min, max) in &self.ranges {
            if row < min {
                break;
            }
            if row <= max {
                return (min, max);
            }
        }
        (row, row)
    }

    /// Renumbers the intervals after `row` was removed.
    pub fn shift_after_delete(&mut self, row: usize) {
        for range in &mut self.ranges {
            if range.1 >= row {
                range.1 = range.1.saturating_sub(1);
            }
            if range.0 > row {
                range.0 -= 1;
            }
        }
        self.ranges.retain(|(min, max)| min < max);
    }

    /// Renumbers the intervals after a row was inserted at `row`.
    pub fn shift_after_insert(&mut self, row: usize) {
        for range in &mut self.ranges {
            if range.0 >= row {
                range.0 += 1;
            }
            if range.1 + 1 >= row {
                range.1 += 1;
            }
        }
    }
}
