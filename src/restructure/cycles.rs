use super::*;
use crate::log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnPath,
    Done,
}

/// Where a declaration sits: container, row and column.
type Position = (Container, usize, usize);

impl Restructurer {
    /// Replaces references back to a declaration that is still being drawn
    /// with a label, so the merge pass never waits for an arrow that can
    /// only be drawn after the merge itself.
    ///
    /// The walk is depth first over declarations. It follows a merge
    /// reference to the row where its target is declared, so circles that
    /// run through several rows are found as well.
    pub(super) fn break_cycles(&mut self) {
        let mut positions = vec![None; self.decls.len()];
        self.index_decls(Container::Top, &mut positions);
        let mut state = vec![Visit::New; self.decls.len()];
        for i in 0..self.rows.len() {
            self.walk_row(Container::Top, i, 0, &positions, &mut state);
        }
    }

    fn index_decls(&self, container: Container, positions: &mut [Option<Position>]) {
        for (i, row) in self.rows(container).iter().enumerate() {
            for (j, part) in row.iter().enumerate() {
                if let Marker::Decl(id) = part.marker() {
                    positions[id] = Some((container, i, j));
                    self.index_decls(Container::Split(id), positions);
                }
            }
        }
    }

    fn visit(&mut self, id: DeclId, positions: &[Option<Position>], state: &mut [Visit]) {
        state[id] = Visit::OnPath;
        if let Some((container, i, j)) = positions[id] {
            self.walk_row(container, i, j + 1, positions, state);
        }
        for k in 0..self.decls[id].split.len() {
            self.walk_row(Container::Split(id), k, 0, positions, state);
        }
        state[id] = Visit::Done;
    }

    /// Walks row `i` of `container` from column `start`. Everything behind a
    /// declaration belongs to that declaration, so the walk stops there.
    fn walk_row(
        &mut self,
        container: Container,
        i: usize,
        start: usize,
        positions: &[Option<Position>],
        state: &mut [Visit],
    ) {
        let mut j = start;
        while let Some(marker) = self.rows(container)[i].get(j).map(Part::marker) {
            match marker {
                Marker::Merge(id) if state[id] == Visit::OnPath => {
                    let decl = &mut self.decls[id];
                    decl.expected = decl.expected.saturating_sub(1);
                    debug!(name = %decl.name, "breaking circular reference");
                    let label = Part::Label(decl.name.clone());
                    self.rows_mut(container)[i][j] = label;
                }
                Marker::Merge(id) if state[id] == Visit::New => {
                    self.visit(id, positions, state);
                }
                Marker::Decl(id) => {
                    if state[id] == Visit::New {
                        self.visit(id, positions, state);
                    }
                    return;
                }
                _ => {}
            }
            j += 1;
        }
    }
}
