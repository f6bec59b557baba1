use super::*;
use crate::log::debug;

impl Restructurer {
    /// Moves every declaration with several incoming arrows (or with one
    /// incoming arrow from another row) behind the last reference to it.
    pub(super) fn resolve_merges(&mut self) -> Result<(), FlowError> {
        self.resolve_merges_in(Container::Top)?;
        debug!(rows = self.rows.len(), "resolved merges");
        Ok(())
    }

    fn resolve_merges_in(&mut self, container: Container) -> Result<(), FlowError> {
        let mut i = self.rows(container).len();
        while i > 0 {
            i -= 1;
            let mut j = self.rows(container)[i].len();
            while j > 0 {
                j -= 1;
                let Some(Marker::Decl(id)) = self.rows(container)[i].get(j).map(Part::marker) else {
                    continue;
                };
                if !self.decls[id].split.is_empty() {
                    self.resolve_merges_in(Container::Split(id))?;
                }

                let decl = &mut self.decls[id];
                if decl.merge_resolved || decl.expected == 0 || (decl.expected == 1 && j > 0) {
                    decl.merge_resolved = true;
                    continue;
                }
                decl.merge_resolved = true;
                let joined = MergeShape {
                    id: decl.name.clone(),
                    size: decl.expected,
                };

                let moved = self.rows_mut(container)[i].split_off(j);
                if j > 0 {
                    self.rows_mut(container)[i].push(Part::Joined(joined));
                } else {
                    self.rows_mut(container).remove(i);
                    if container == Container::Top {
                        self.clusters.shift_after_delete(i);
                    }
                }
                self.attach_after_last_merge(id, moved)?;
            }
        }
        Ok(())
    }

    fn attach_after_last_merge(&mut self, id: DeclId, moved: Row) -> Result<(), FlowError> {
        let Some((container, i, j)) = self.find_last_merge(Container::Top, id) else {
            return Err(FlowError::structural(format!(
                "no reference left to merge '{}' into",
                self.name(id)
            )));
        };
        let replace = self.decls[id].expected <= 1;
        let row = &mut self.rows_mut(container)[i];
        if replace {
            row.truncate(j);
        }
        row.extend(moved);
        Ok(())
    }

    fn find_last_merge(&self, container: Container, id: DeclId) -> Option<(Container, usize, usize)> {
        let rows = self.rows(container);
        for i in (0..rows.len()).rev() {
            for j in (0..rows[i].len()).rev() {
                match rows[i][j].marker() {
                    Marker::Merge(target) if target == id => return Some((container, i, j)),
                    Marker::Decl(decl) if !self.decls[decl].split.is_empty() => {
                        if let Some(found) = self.find_last_merge(Container::Split(decl), id) {
                            return Some(found);
                        }
                    }
                    _ => {}
                }
            }
        }
        None
    }
}
