use super::*;
use crate::shape::{LabelShape, SplitShape};

impl Restructurer {
    /// Converts the intermediate tree into clean shapes.
    pub(super) fn clean(&mut self) -> Result<ShapeFlow, FlowError> {
        let rows = std::mem::take(&mut self.rows);
        Ok(ShapeFlow {
            rows: self.clean_rows(rows)?,
        })
    }

    fn clean_rows(&mut self, rows: Vec<Row>) -> Result<Vec<Vec<Shape>>, FlowError> {
        rows.into_iter().map(|row| self.clean_row(row)).collect()
    }

    fn clean_row(&mut self, row: Row) -> Result<Vec<Shape>, FlowError> {
        let len = row.len();
        let mut shapes = Vec::with_capacity(len + 1);
        let mut split = None;
        for (j, part) in row.into_iter().enumerate() {
            match part {
                Part::Arrow(arrow) => shapes.push(Shape::Arrow(arrow)),
                Part::Op(op) => shapes.push(Shape::Op(op)),
                Part::Joined(merge) => shapes.push(Shape::Merge(merge)),
                Part::Label(target) => shapes.push(Shape::Label(LabelShape { target })),
                Part::Branches(branches) => shapes.push(Shape::Split(SplitShape {
                    branches: self.clean_rows(branches)?,
                })),
                Part::Merge(id) => shapes.push(Shape::Merge(MergeShape {
                    id: self.decls[id].name.clone(),
                    size: self.decls[id].expected,
                })),
                Part::Decl(id) => {
                    let branches = std::mem::take(&mut self.decls[id].split);
                    shapes.push(Shape::Op(std::mem::take(&mut self.decls[id].op)));
                    if !branches.is_empty() {
                        if j + 1 < len {
                            return Err(FlowError::structural(format!(
                                "'{}' has a split but is not the last part of its row",
                                self.name(id)
                            )));
                        }
                        split = Some(Shape::Split(SplitShape {
                            branches: self.clean_rows(branches)?,
                        }));
                    }
                }
                Part::Split(id) => {
                    return Err(FlowError::structural(format!(
                        "unresolved reference to '{}' at the start of a row",
                        self.name(id)
                    )));
                }
            }
        }
        shapes.extend(split);
        Ok(shapes)
    }
}
