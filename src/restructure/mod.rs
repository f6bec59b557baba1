//! Turns the flat token stream into the shape tree.
//!
//! The work happens in six passes over an intermediate tree of [`Part`]s:
//! classify tokens, fold repeated references into splits, break circular
//! references, move merge targets below their last incoming arrow, insert
//! spacer rows between unrelated row groups, and finally convert everything
//! into clean [`Shape`]s.

mod classify;
mod clean;
mod cycles;
mod merges;
mod spacers;
mod splits;

use std::collections::HashMap;

use crate::cluster::Clusters;
use crate::error::FlowError;
use crate::ir::{Flow, Whereer};
use crate::log::debug;
use crate::shape::{ArrowShape, MergeShape, OpShape, Shape, ShapeFlow};

pub(crate) type DeclId = usize;
pub(crate) type Row = Vec<Part>;

/// Intermediate tree node. The `Decl`, `Merge` and `Split` placeholders
/// point into the declaration arena; the remaining kinds are already final.
#[derive(Debug, Clone)]
pub(crate) enum Part {
    Arrow(ArrowShape),
    Decl(DeclId),
    Merge(DeclId),
    Split(DeclId),
    Label(String),
    Op(OpShape),
    Joined(MergeShape),
    Branches(Vec<Row>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    Decl(DeclId),
    Merge(DeclId),
    Split(DeclId),
    Other,
}

impl Part {
    pub(crate) fn marker(&self) -> Marker {
        match self {
            Part::Decl(id) => Marker::Decl(*id),
            Part::Merge(id) => Marker::Merge(*id),
            Part::Split(id) => Marker::Split(*id),
            _ => Marker::Other,
        }
    }

    fn lift(shape: Shape) -> Part {
        match shape {
            Shape::Arrow(arrow) => Part::Arrow(arrow),
            Shape::Op(op) => Part::Op(op),
            Shape::Merge(merge) => Part::Joined(merge),
            Shape::Label(label) => Part::Label(label.target),
            Shape::Split(split) => Part::Branches(
                split
                    .branches
                    .into_iter()
                    .map(|row| row.into_iter().map(Part::lift).collect())
                    .collect(),
            ),
        }
    }
}

/// First occurrence of a component name.
#[derive(Debug, Clone)]
pub(crate) struct Declaration {
    pub name: String,
    pub src_pos: usize,
    pub vague_type: bool,
    /// Top level row of the first occurrence.
    pub row: usize,
    pub op: OpShape,
    /// Number of arrows that end in this component.
    pub expected: usize,
    pub merge_resolved: bool,
    pub split: Vec<Row>,
}

/// Which list of rows a pass is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    Top,
    Split(DeclId),
}

#[derive(Debug, Default)]
pub(crate) struct Restructurer {
    decls: Vec<Declaration>,
    by_name: HashMap<String, DeclId>,
    clusters: Clusters,
    rows: Vec<Row>,
}

impl Restructurer {
    fn rows(&self, container: Container) -> &Vec<Row> {
        match container {
            Container::Top => &self.rows,
            Container::Split(id) => &self.decls[id].split,
        }
    }

    fn rows_mut(&mut self, container: Container) -> &mut Vec<Row> {
        match container {
            Container::Top => &mut self.rows,
            Container::Split(id) => &mut self.decls[id].split,
        }
    }

    fn name(&self, id: DeclId) -> &str {
        &self.decls[id].name
    }

    fn from_shapes(flow: ShapeFlow) -> Self {
        let clusters = Clusters::from_runs(flow.rows.iter().map(|row| row.is_empty()));
        let rows = flow
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(Part::lift).collect())
            .collect();
        Self {
            clusters,
            rows,
            ..Self::default()
        }
    }

    fn finish(mut self) -> Result<ShapeFlow, FlowError> {
        self.resolve_splits()?;
        self.break_cycles();
        self.resolve_merges()?;
        self.insert_spacers();
        let flow = self.clean()?;
        debug!(rows = flow.rows.len(), "restructured flow");
        Ok(flow)
    }
}

/// Restructures a parsed flow into the shape tree.
///
/// Duplicate declarations and lone references are collected and returned
/// together as [`FlowError::Invalid`].
pub fn restructure(flow: &Flow, whereer: &dyn Whereer) -> Result<ShapeFlow, FlowError> {
    if flow.is_empty() {
        return Err(FlowError::Empty);
    }
    Restructurer::classify(flow, whereer)?.finish()
}

/// Runs the restructuring passes over an already restructured tree.
/// A clean tree comes back unchanged.
pub fn restructure_shapes(flow: ShapeFlow) -> Result<ShapeFlow, FlowError> {
    Restructurer::from_shapes(flow).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowIssue;
    use crate::ir::{Arrow, CompDecl, Component, Port, SourceMap, Token, TypeRef};
    use crate::parser::parse_flow;
    use crate::shape::{LabelShape, SplitShape};

    fn convert(source: &str) -> Result<ShapeFlow, FlowError> {
        let map = SourceMap::new("test", source);
        let flow = parse_flow(&map)?;
        restructure(&flow, &map)
    }

    fn describe(row: &[Shape]) -> Vec<String> {
        row.iter()
            .map(|shape| match shape {
                Shape::Arrow(_) => "->".to_string(),
                Shape::Op(op) => format!("[{}]", op.main.lines[0]),
                Shape::Merge(m) => format!("merge {}/{}", m.id, m.size),
                Shape::Split(s) => format!("split {}", s.branches.len()),
                Shape::Label(l) => format!("back to {}", l.target),
            })
            .collect()
    }

    #[test]
    fn simple_line() {
        let flow = convert("in (data)-> [a] -> out").unwrap();
        assert_eq!(flow.rows.len(), 1);
        assert_eq!(describe(&flow.rows[0]), ["->", "[a]", "->"]);
        let Shape::Arrow(first) = &flow.rows[0][0] else {
            panic!("expected arrow");
        };
        assert_eq!(first.data_type, "(data)");
        assert_eq!(first.src_port, "in");
        assert!(!first.has_src_op);
        assert!(first.has_dst_op);
    }

    #[test]
    fn duplicate_declaration_is_reported_once() {
        let err = convert("in -> [a A] -> [a B] -> out").unwrap_err();
        let FlowError::Invalid(issues) = err else {
            panic!("expected invalid flow");
        };
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            &issues[0],
            FlowIssue::DuplicateDeclaration { name, .. } if name == "a"
        ));
    }

    #[test]
    fn lone_reference_is_reported() {
        let map = SourceMap::new("test", "in -> [a] -> out\n[a]");
        let component = |pos| {
            Token::Component(Component {
                decl: CompDecl {
                    name: "a".to_string(),
                    type_ref: TypeRef::simple("a"),
                    vague_type: true,
                    src_pos: pos,
                },
                plugins: Vec::new(),
                src_pos: pos,
            })
        };
        let port = |name: &str, pos| Port {
            name: name.to_string(),
            index: None,
            src_pos: pos,
        };
        let flow = Flow::new(vec![
            vec![
                Token::Arrow(Arrow {
                    from_port: Some(port("in", 0)),
                    to_port: None,
                    data: Vec::new(),
                    src_pos: 0,
                }),
                component(6),
                Token::Arrow(Arrow {
                    from_port: None,
                    to_port: Some(port("out", 13)),
                    data: Vec::new(),
                    src_pos: 10,
                }),
            ],
            vec![component(17)],
        ]);
        let err = restructure(&flow, &map).unwrap_err();
        let FlowError::Invalid(issues) = err else {
            panic!("expected invalid flow");
        };
        assert_eq!(
            issues,
            vec![FlowIssue::LoneReference {
                name: "a".to_string(),
                location: "File 'test', line 2, column 1:\n[a]".to_string(),
            }]
        );
    }

    #[test]
    fn all_issues_are_collected() {
        let err = convert("in -> [a A] -> [a B] -> out\nin2 -> [b B] -> [b C] -> out2").unwrap_err();
        let FlowError::Invalid(issues) = err else {
            panic!("expected invalid flow");
        };
        assert_eq!(issues.len(), 2);
        assert!(issues[1].to_string().contains("line 2"));
    }

    #[test]
    fn three_way_merge() {
        let flow = convert(
            "in (d)-> [a] -> [m]\nin2 (d)-> [bbbbb] -> [m]\nin3 (d)-> [c] -> [m] -> out",
        )
        .unwrap();
        assert_eq!(flow.rows.len(), 3);
        assert_eq!(describe(&flow.rows[0]), ["->", "[a]", "->", "merge m/3"]);
        assert_eq!(describe(&flow.rows[1]), ["->", "[bbbbb]", "->", "merge m/3"]);
        assert_eq!(
            describe(&flow.rows[2]),
            ["->", "[c]", "->", "merge m/3", "[m]", "->"]
        );
    }

    #[test]
    fn back_reference_becomes_label() {
        let flow = convert("in (d)-> [a] -> [b] -> out\n[b] -> [a]").unwrap();
        assert_eq!(flow.rows.len(), 1);
        assert_eq!(
            describe(&flow.rows[0]),
            ["->", "[a]", "->", "[b]", "split 2"]
        );
        let Shape::Split(SplitShape { branches }) = &flow.rows[0][4] else {
            panic!("expected split");
        };
        assert_eq!(describe(&branches[0]), ["->"]);
        assert_eq!(describe(&branches[1]), ["->", "back to a"]);
        assert_eq!(
            branches[1][1],
            Shape::Label(LabelShape {
                target: "a".to_string()
            })
        );
    }

    #[test]
    fn circle_across_rows_is_broken() {
        let flow = convert("in -> [b] -> x\nin2 -> [a] -> [b]\n[b] -> [a]").unwrap();
        assert_eq!(flow.rows.len(), 2);
        assert_eq!(describe(&flow.rows[0]), ["->", "[b]", "split 2"]);
        assert_eq!(describe(&flow.rows[1]), ["->", "merge a/2"]);
        let Shape::Split(SplitShape { branches }) = &flow.rows[0][2] else {
            panic!("expected split");
        };
        assert_eq!(describe(&branches[0]), ["->"]);
        assert_eq!(
            describe(&branches[1]),
            ["->", "merge a/2", "[a]", "->", "back to b"]
        );
    }

    #[test]
    fn circles_through_merges_never_leave_dangling_references() {
        let sources = [
            "in -> [c] -> out\np1 -> [b] -> [c] -> [b] -> o1",
            "in -> [a] -> [b] -> out\nin2 -> [c] -> [b]\n[b] -> [c]",
            "in -> [a] -> [b] -> [c] -> out\n[c] -> [a]\n[b] -> [a]",
        ];
        for source in sources {
            if let Err(err) = convert(source) {
                panic!("{source}: {err}");
            }
        }
    }

    #[test]
    fn single_branch_split_is_flattened() {
        let flow = convert("in -> [a] -> out\n[a] -> [b] -> out2").unwrap();
        // `a` has two outputs, so it ends in a split.
        assert_eq!(describe(&flow.rows[0]), ["->", "[a]", "split 2"]);

        let flow = convert("in -> [a]\n[a] -> [b] -> out").unwrap();
        assert_eq!(flow.rows.len(), 1);
        assert_eq!(describe(&flow.rows[0]), ["->", "[a]", "->", "[b]", "->"]);
    }

    #[test]
    fn unrelated_lines_get_a_spacer() {
        let flow = convert("in (d)-> [a] -> out\nin2 (d)-> [b] -> out2").unwrap();
        assert_eq!(flow.rows.len(), 3);
        assert!(flow.rows[1].is_empty());
    }

    #[test]
    fn merged_rows_stay_together() {
        let flow = convert("in -> [a] -> [c]\nin2 -> [b] -> [c] -> out\nin3 -> [d] -> out3").unwrap();
        assert_eq!(flow.rows.len(), 4);
        assert!(!flow.rows[0].is_empty());
        assert!(!flow.rows[1].is_empty());
        assert!(flow.rows[2].is_empty());
    }

    #[test]
    fn restructuring_a_clean_tree_is_a_noop() {
        let sources = [
            "in (data)-> [a] -> out",
            "in (d)-> [a] -> [m]\nin2 (d)-> [bbbbb] -> [m]\nin3 (d)-> [c] -> [m] -> out",
            "in (d)-> [a] -> [b] -> out\n[b] -> [a]",
            "in (d)-> [a] -> out\nin2 (d)-> [b] -> out2",
            "in -> [b] -> x\nin2 -> [a] -> [b]\n[b] -> [a]",
        ];
        for source in sources {
            let flow = convert(source).unwrap();
            let again = restructure_shapes(flow.clone()).unwrap();
            assert_eq!(again, flow, "{source}");
        }
    }

    #[test]
    fn empty_flow_is_rejected() {
        let map = SourceMap::new("test", "");
        let err = restructure(&Flow::default(), &map).unwrap_err();
        assert!(matches!(err, FlowError::Empty));
    }
}
