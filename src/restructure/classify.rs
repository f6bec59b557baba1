use super::*;
use crate::log::debug;
use crate::error::FlowIssue;
use crate::ir::{Arrow, Component, Port, Token};
use crate::shape::{PluginShape, TextBox};

impl Restructurer {
    /// Converts every token into a part and records declarations, merges
    /// and the clusters the merges imply.
    pub(super) fn classify(flow: &Flow, whereer: &dyn Whereer) -> Result<Self, FlowError> {
        let mut engine = Self::default();
        let mut issues = Vec::new();

        for (i, line) in flow.lines.iter().enumerate() {
            let last = line.len().saturating_sub(1);
            let mut row = Vec::with_capacity(line.len());
            for (j, token) in line.iter().enumerate() {
                match token {
                    Token::Arrow(arrow) => {
                        row.push(Part::Arrow(arrow_shape(arrow, j > 0, j < last)));
                    }
                    Token::Component(comp) => {
                        let name = &comp.decl.name;
                        let Some(&id) = engine.by_name.get(name) else {
                            let id = engine.declare(comp, i, j > 0);
                            row.push(Part::Decl(id));
                            continue;
                        };
                        let decl = &mut engine.decls[id];
                        if !comp.decl.vague_type && !decl.vague_type {
                            issues.push(FlowIssue::DuplicateDeclaration {
                                name: name.clone(),
                                first: whereer.where_is(decl.src_pos),
                                second: whereer.where_is(comp.src_pos),
                            });
                        } else if j > 0 {
                            decl.expected += 1;
                            engine.clusters.add(decl.row, i);
                            row.push(Part::Merge(id));
                        } else if j < last {
                            row.push(Part::Split(id));
                        } else {
                            issues.push(FlowIssue::LoneReference {
                                name: name.clone(),
                                location: whereer.where_is(comp.src_pos),
                            });
                        }
                    }
                }
            }
            engine.rows.push(row);
        }

        if !issues.is_empty() {
            return Err(FlowError::Invalid(issues));
        }
        debug!(
            declarations = engine.decls.len(),
            clusters = engine.clusters.len(),
            "classified flow"
        );
        Ok(engine)
    }

    fn declare(&mut self, comp: &Component, row: usize, has_input: bool) -> DeclId {
        let id = self.decls.len();
        self.decls.push(Declaration {
            name: comp.decl.name.clone(),
            src_pos: comp.src_pos,
            vague_type: comp.decl.vague_type,
            row,
            op: op_shape(comp),
            expected: usize::from(has_input),
            merge_resolved: false,
            split: Vec::new(),
        });
        self.by_name.insert(comp.decl.name.clone(), id);
        id
    }
}

fn port_label(port: Option<&Port>) -> String {
    port.map(Port::label).unwrap_or_default()
}

pub(crate) fn arrow_shape(arrow: &Arrow, has_src_op: bool, has_dst_op: bool) -> ArrowShape {
    ArrowShape {
        data_type: arrow.data_label(),
        has_src_op,
        src_port: port_label(arrow.from_port.as_ref()),
        has_dst_op,
        dst_port: port_label(arrow.to_port.as_ref()),
    }
}

pub(crate) fn op_shape(comp: &Component) -> OpShape {
    let plugins = comp
        .plugins
        .iter()
        .map(|plugin| PluginShape {
            title: plugin.name.clone(),
            entries: plugin
                .types
                .iter()
                .map(|type_ref| TextBox::new(vec![type_ref.to_string()]))
                .collect(),
        })
        .collect();
    OpShape {
        main: TextBox::new(comp.decl.title()),
        plugins,
    }
}
