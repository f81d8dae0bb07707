// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Derives the units, contents, type and totalization of virtual tags from
//! their operands.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::quantity::Unit;
use crate::tags::{BinaryOp, Inferred, Operand, TagIndex, TagRef, UnaryOp, VirtualTag};
use crate::{ContentsType, Error, TagType};

/// The operand graph of the virtual tags in an index.  An edge goes from a
/// virtual tag to each virtual tag it reads.
struct OperandGraph<'a> {
    graph: DiGraph<&'a str, ()>,
    indices: HashMap<&'a str, NodeIndex>,
}

impl<'a> OperandGraph<'a> {
    fn try_new(index: &TagIndex<'a>) -> Result<Self, Error> {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();
        for vtag in index.virtual_tags() {
            indices.insert(vtag.id(), graph.add_node(vtag.id()));
        }
        for vtag in index.virtual_tags() {
            for operand in vtag.operand_ids() {
                match index.get(operand) {
                    Some(TagRef::Virtual(dependency)) => {
                        graph.update_edge(
                            indices[vtag.id()],
                            indices[dependency.id()],
                            (),
                        );
                    }
                    Some(TagRef::Tag(_)) => {}
                    None => {
                        return Err(Error::malformed_document(format!(
                            "Virtual tag {} references unknown tag {operand}.",
                            vtag.id()
                        )))
                    }
                }
            }
        }
        Ok(Self { graph, indices })
    }

    /// Returns the virtual tags so that every virtual tag comes after the
    /// virtual tags it reads.
    fn dependency_order(&self) -> Result<Vec<&'a str>, Error> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(order) => Ok(order.into_iter().rev().map(|i| self.graph[i]).collect()),
            Err(cycle) => Err(self.describe_cycle(cycle.node_id())),
        }
    }

    fn describe_cycle(&self, start: NodeIndex) -> Error {
        // visit in insertion order, so that the reported cycle is stable
        let mut roots = self.indices.values().copied().collect::<Vec<_>>();
        roots.sort();
        for root in roots {
            if let Some(cycle) = self.find_cycle(root, vec![]) {
                return Error::cycle_detected(format!(
                    "Cycle detected: {}",
                    cycle
                        .iter()
                        .map(|i| self.graph[*i])
                        .collect::<Vec<_>>()
                        .join(" -> ")
                ));
            }
        }
        Error::internal(format!(
            "Cycle reported at {} but not found.",
            self.graph[start]
        ))
    }

    fn find_cycle(&self, node: NodeIndex, mut path: Vec<NodeIndex>) -> Option<Vec<NodeIndex>> {
        path.push(node);
        let mut successors = self.graph.neighbors(node).collect::<Vec<_>>();
        successors.sort();
        for successor in successors {
            if let Some(first) = path.iter().position(|i| *i == successor) {
                let mut cycle = path[first..].to_vec();
                cycle.push(successor);
                return Some(cycle);
            }
            if let Some(cycle) = self.find_cycle(successor, path.clone()) {
                return Some(cycle);
            }
        }
        None
    }
}

/// The attributes an operand contributes to inference.
struct OperandInfo {
    units: Option<Unit>,
    contents: Option<ContentsType>,
    tag_type: Option<TagType>,
    totalized: Option<bool>,
}

/// Checks that the virtual tags in `index` form a DAG and derives their
/// attributes, in dependency order.
///
/// The result maps virtual tag IDs to their derived attributes.
pub(crate) fn infer_virtual_tags(index: &TagIndex<'_>) -> Result<HashMap<String, Inferred>, Error> {
    let order = OperandGraph::try_new(index)?.dependency_order()?;
    let mut inferred: HashMap<String, Inferred> = HashMap::new();

    for id in order {
        let Some(TagRef::Virtual(vtag)) = index.get(id) else {
            return Err(Error::internal(format!("Virtual tag {id} vanished from index.")));
        };
        let operands = vtag
            .operands()
            .iter()
            .map(|operand| operand_info(index, &inferred, operand))
            .collect::<Vec<_>>();
        let result = infer(vtag, operands)?;
        inferred.insert(id.to_string(), result);
    }

    tracing::debug!("Derived attributes of {} virtual tags.", inferred.len());
    Ok(inferred)
}

fn operand_info(
    index: &TagIndex<'_>,
    inferred: &HashMap<String, Inferred>,
    operand: &Operand,
) -> OperandInfo {
    match operand {
        Operand::Constant { units, .. } => OperandInfo {
            units: units.clone(),
            contents: None,
            tag_type: None,
            totalized: None,
        },
        Operand::Tag(id) => match index.get(id) {
            Some(TagRef::Tag(tag)) => OperandInfo {
                units: tag.units().cloned(),
                contents: Some(tag.contents()),
                tag_type: Some(tag.tag_type()),
                totalized: Some(tag.totalized()),
            },
            Some(TagRef::Virtual(vtag)) => {
                let derived = inferred.get(id).cloned().unwrap_or_default();
                OperandInfo {
                    units: vtag.declared_units().cloned().or(derived.units),
                    contents: Some(vtag.declared_contents().unwrap_or(derived.contents)),
                    tag_type: vtag.declared_tag_type().or(derived.tag_type),
                    totalized: Some(derived.totalized),
                }
            }
            // unresolved operands are rejected while building the operand graph
            None => OperandInfo {
                units: None,
                contents: None,
                tag_type: None,
                totalized: None,
            },
        },
    }
}

fn infer(vtag: &VirtualTag, operands: Vec<OperandInfo>) -> Result<Inferred, Error> {
    let unary = vtag.operator().unary_ops();
    let units = operands
        .iter()
        .enumerate()
        .map(|(i, info)| match unary.get(i) {
            Some(UnaryOp::Not) => Some(Unit::dimensionless()),
            _ => info.units.clone(),
        })
        .collect::<Vec<_>>();

    let mut result_units = units.first().cloned().flatten();
    for (rhs, op) in units.into_iter().skip(1).zip(vtag.operator().binary_ops()) {
        result_units = combine_units(vtag, result_units, rhs, *op)?;
    }

    let series = operands
        .iter()
        .filter(|info| info.totalized.is_some())
        .collect::<Vec<_>>();

    let mut all_contents = series.iter().filter_map(|info| info.contents);
    let contents = match all_contents.next() {
        Some(first) if all_contents.all(|c| c == first) => first,
        _ => ContentsType::Unspecified,
    };

    let types = series.iter().map(|info| info.tag_type).collect::<Vec<_>>();
    let tag_type = match types.first().copied().flatten() {
        Some(first) if types.iter().all(|t| *t == Some(first)) => Some(first),
        Some(first)
            if types
                .iter()
                .all(|t| t.is_some_and(|t| t.is_compatible_with(&first))) =>
        {
            Some(TagType::Flow)
        }
        _ => None,
    };

    let flags = series
        .iter()
        .filter_map(|info| info.totalized)
        .collect::<Vec<_>>();
    if flags.iter().any(|t| *t) && !flags.iter().all(|t| *t) {
        tracing::warn!(
            "Operands of virtual tag {} are not all totalized; treating it as not totalized.",
            vtag.id()
        );
    }
    let totalized = !flags.is_empty() && flags.iter().all(|t| *t);

    Ok(Inferred {
        units: result_units,
        contents,
        tag_type,
        totalized,
    })
}

fn combine_units(
    vtag: &VirtualTag,
    lhs: Option<Unit>,
    rhs: Option<Unit>,
    op: BinaryOp,
) -> Result<Option<Unit>, Error> {
    match op {
        BinaryOp::Add | BinaryOp::Sub => match (lhs, rhs) {
            (Some(lhs), Some(rhs)) if lhs != rhs => Err(Error::unit_mismatch(format!(
                "Virtual tag {} combines {lhs} and {rhs} with `{op}`.",
                vtag.id()
            ))),
            (lhs, rhs) => Ok(lhs.or(rhs)),
        },
        BinaryOp::Mul | BinaryOp::Div => match (lhs, rhs) {
            (None, None) => Ok(None),
            (lhs, rhs) => {
                let (lhs, rhs) = (lhs.unwrap_or_default(), rhs.unwrap_or_default());
                Ok(Some(if op == BinaryOp::Mul {
                    &lhs * &rhs
                } else {
                    &lhs / &rhs
                }))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{Operator, Tag};

    fn flow(id: &str, units: &str, contents: ContentsType, totalized: bool) -> Tag {
        Tag::new(id, TagType::Flow, Unit::parse(units).unwrap(), contents).with_totalized(totalized)
    }

    fn index<'a>(tags: &'a [Tag], vtags: &'a [VirtualTag]) -> TagIndex<'a> {
        let mut index = TagIndex::default();
        for tag in tags {
            index.insert(TagRef::Tag(tag)).unwrap();
        }
        for vtag in vtags {
            index.insert(TagRef::Virtual(vtag)).unwrap();
        }
        index
    }

    #[test]
    fn test_inference() -> Result<(), Error> {
        let tags = [
            flow("Gas1", "SCFM", ContentsType::Biogas, false),
            flow("Gas2", "SCFM", ContentsType::Biogas, false),
            Tag::new("Power", TagType::Current, Unit::parse("kW")?, ContentsType::Electricity),
        ];
        let vtags = [
            // declared after the virtual tag it reads
            VirtualTag::new(
                "PowerPerGas",
                vec![Operand::tag("Power"), Operand::tag("GasTotal")],
                Operator::binary(BinaryOp::Div),
            )?,
            VirtualTag::new(
                "GasTotal",
                vec![Operand::tag("Gas1"), Operand::tag("Gas2")],
                Operator::binary(BinaryOp::Add),
            )?,
            VirtualTag::new(
                "GasOff",
                vec![Operand::tag("Gas1")],
                Operator::unary(UnaryOp::Not),
            )?
            .with_tag_type(TagType::RunStatus),
        ];
        let inferred = infer_virtual_tags(&index(&tags, &vtags))?;

        let total = &inferred["GasTotal"];
        assert_eq!(total.units, Unit::parse("SCFM")?);
        assert_eq!(total.contents, ContentsType::Biogas);
        assert_eq!(total.tag_type, Some(TagType::Flow));
        assert!(!total.totalized);

        let ratio = &inferred["PowerPerGas"];
        assert_eq!(ratio.units, Unit::parse("kW/SCFM")?);
        assert_eq!(ratio.contents, ContentsType::Unspecified);
        assert_eq!(ratio.tag_type, None);

        assert_eq!(inferred["GasOff"].units, Some(Unit::dimensionless()));
        Ok(())
    }

    #[test]
    fn test_unit_mismatch() -> Result<(), Error> {
        let tags = [
            flow("Gas", "SCFM", ContentsType::Biogas, true),
            flow("Water", "MGD", ContentsType::DrinkingWater, true),
        ];
        let vtags = [VirtualTag::new(
            "Nonsense",
            vec![Operand::tag("Gas"), Operand::tag("Water")],
            Operator::binary(BinaryOp::Sub),
        )?];
        assert!(infer_virtual_tags(&index(&tags, &vtags)).is_err_and(|e| e
            == Error::unit_mismatch("Virtual tag Nonsense combines SCFM and MGD with `-`.")));
        Ok(())
    }

    #[test]
    fn test_cycle() -> Result<(), Error> {
        let tags = [flow("A", "MGD", ContentsType::DrinkingWater, false)];
        let vtags = [
            VirtualTag::new(
                "V1",
                vec![Operand::tag("A"), Operand::tag("V2")],
                Operator::binary(BinaryOp::Add),
            )?,
            VirtualTag::new(
                "V2",
                vec![Operand::tag("V1")],
                Operator::unary(UnaryOp::Negate),
            )?,
        ];
        assert!(infer_virtual_tags(&index(&tags, &vtags))
            .is_err_and(|e| e == Error::cycle_detected("Cycle detected: V1 -> V2 -> V1")));
        Ok(())
    }

    #[test]
    fn test_unknown_operand() -> Result<(), Error> {
        let vtags = [VirtualTag::new(
            "Lost",
            vec![Operand::tag("Nowhere")],
            Operator::unary(UnaryOp::Noop),
        )?];
        assert!(infer_virtual_tags(&index(&[], &vtags)).is_err_and(|e| e
            == Error::malformed_document("Virtual tag Lost references unknown tag Nowhere.")));
        Ok(())
    }
}
