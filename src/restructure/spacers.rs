use super::*;
use crate::log::debug;

impl Restructurer {
    /// Inserts a blank row below every group of rows that is not connected
    /// to the rows beneath it.
    pub(super) fn insert_spacers(&mut self) {
        let Some(last) = self.rows.len().checked_sub(1) else {
            return;
        };
        let mut next = Some(last);
        while let Some(row) = next {
            let (min, max) = self.clusters.containing(row);
            if max < last && !self.rows[max].is_empty() && !self.rows[max + 1].is_empty() {
                self.rows.insert(max + 1, Vec::new());
                self.clusters.shift_after_insert(max + 1);
            }
            next = min.checked_sub(1);
        }
        debug!(rows = self.rows.len(), "inserted spacers");
    }
}
