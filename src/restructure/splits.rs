use super::*;
use crate::log::debug;

impl Restructurer {
    /// Moves everything that follows a reference or a declaration into the
    /// split of that declaration. Rows are visited bottom up and right to
    /// left so the earliest branch ends up first.
    pub(super) fn resolve_splits(&mut self) -> Result<(), FlowError> {
        let mut i = self.rows.len();
        while i > 0 {
            i -= 1;
            let mut j = self.rows[i].len();
            while j > 0 {
                j -= 1;
                match self.rows[i][j].marker() {
                    Marker::Merge(id) => {
                        if j + 1 < self.rows[i].len() {
                            let tail = self.rows[i].split_off(j + 1);
                            self.decls[id].split.insert(0, tail);
                        }
                    }
                    Marker::Split(id) => {
                        if j > 0 || self.rows[i].len() < 2 {
                            return Err(FlowError::structural(format!(
                                "reference to '{}' has to start a row and be followed by an arrow",
                                self.name(id)
                            )));
                        }
                        let mut row = self.rows.remove(i);
                        let tail = row.split_off(1);
                        self.decls[id].split.insert(0, tail);
                        self.clusters.shift_after_delete(i);
                    }
                    Marker::Decl(id) => {
                        if j + 1 < self.rows[i].len() {
                            let tail = self.rows[i].split_off(j + 1);
                            self.decls[id].split.insert(0, tail);
                        }
                        if self.decls[id].split.len() == 1 {
                            let branch = self.decls[id].split.remove(0);
                            self.rows[i].extend(branch);
                        }
                    }
                    Marker::Other => {}
                }
            }
        }
        debug!(rows = self.rows.len(), "resolved splits");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::SourceMap;
    use crate::parser::parse_flow;

    fn split_engine(source: &str) -> Restructurer {
        let map = SourceMap::new("test", source);
        let flow = parse_flow(&map).unwrap();
        let mut engine = Restructurer::classify(&flow, &map).unwrap();
        engine.resolve_splits().unwrap();
        engine
    }

    #[test]
    fn reference_rows_are_folded_into_the_declaration() {
        let engine = split_engine("in -> [a] -> out\n[a] -> out2\n[a] -> out3");
        assert_eq!(engine.rows.len(), 1);
        let a = &engine.decls[0];
        assert_eq!(a.split.len(), 3);
        assert!(a.split.iter().all(|branch| branch.len() == 1));
        let Part::Arrow(first) = &a.split[0][0] else {
            panic!("expected arrow");
        };
        assert_eq!(first.dst_port, "out");
        let Part::Arrow(last) = &a.split[2][0] else {
            panic!("expected arrow");
        };
        assert_eq!(last.dst_port, "out3");
    }

    #[test]
    fn deleted_rows_renumber_clusters() {
        let engine = split_engine("in -> [a] -> out\n[a] -> out2\nin3 -> [b] -> [c]\nin4 -> [c] -> out4");
        assert_eq!(engine.rows.len(), 3);
        assert_eq!(engine.clusters.iter().collect::<Vec<_>>(), [(1, 2)]);
    }

    #[test]
    fn tail_after_merge_becomes_a_branch() {
        let engine = split_engine("in -> [a] -> [b]\nin2 -> [c] -> [b] -> out");
        assert_eq!(engine.rows[1].len(), 4);
        let b = &engine.decls[1];
        // The only branch of `b` was flattened back into its row.
        assert!(b.split.is_empty());
        assert_eq!(engine.rows[0].len(), 5);
    }
}
