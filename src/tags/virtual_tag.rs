// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Virtual tags, i.e. series derived from tags and other virtual tags.

use crate::quantity::Unit;
use crate::tags::Operator;
use crate::{ContentsType, Error, TagType};

/// An operand of a virtual tag.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// The ID of a tag or of another virtual tag.
    Tag(String),
    /// A fixed value, used at every timestep.
    Constant { value: f64, units: Option<Unit> },
}

impl Operand {
    pub fn tag(id: impl Into<String>) -> Self {
        Operand::Tag(id.into())
    }

    pub fn constant(value: f64, units: Option<Unit>) -> Self {
        Operand::Constant { value, units }
    }

    /// Returns the referenced ID, unless the operand is a constant.
    pub fn tag_id(&self) -> Option<&str> {
        match self {
            Operand::Tag(id) => Some(id),
            Operand::Constant { .. } => None,
        }
    }
}

/// The attributes of a virtual tag that are derived from its operands.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Inferred {
    pub(crate) units: Option<Unit>,
    pub(crate) contents: ContentsType,
    pub(crate) tag_type: Option<TagType>,
    pub(crate) totalized: bool,
}

/// A series derived from tags and other virtual tags through an [`Operator`].
///
/// Units, contents and tag type can be declared.  Those that aren't are
/// derived from the operands when the virtual tag becomes part of a graph.
#[derive(Clone, Debug, PartialEq)]
pub struct VirtualTag {
    id: String,
    operands: Vec<Operand>,
    operator: Operator,
    units: Option<Unit>,
    contents: Option<ContentsType>,
    tag_type: Option<TagType>,
    parent_id: Option<String>,
    pub(crate) inferred: Inferred,
}

impl VirtualTag {
    /// Creates a new virtual tag.
    ///
    /// Returns an error if the operator doesn't fit the number of operands, or
    /// if the virtual tag lists itself as an operand.
    pub fn new(
        id: impl Into<String>,
        operands: Vec<Operand>,
        mut operator: Operator,
    ) -> Result<Self, Error> {
        let id = id.into();
        operator.normalize(&id, operands.len())?;
        if operands.iter().any(|op| op.tag_id() == Some(id.as_str())) {
            return Err(Error::cycle_detected(format!(
                "Cycle detected: {id} -> {id}"
            )));
        }
        Ok(Self {
            id,
            operands,
            operator,
            units: None,
            contents: None,
            tag_type: None,
            parent_id: None,
            inferred: Inferred::default(),
        })
    }

    pub fn with_units(mut self, units: Unit) -> Self {
        self.units = Some(units);
        self
    }

    pub fn with_contents(mut self, contents: ContentsType) -> Self {
        self.contents = Some(contents);
        self
    }

    pub fn with_tag_type(mut self, tag_type: TagType) -> Self {
        self.tag_type = Some(tag_type);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Returns the IDs of the tags and virtual tags this virtual tag reads.
    pub fn operand_ids(&self) -> impl Iterator<Item = &str> {
        self.operands.iter().filter_map(Operand::tag_id)
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Returns the declared units, or the units derived from the operands.
    pub fn units(&self) -> Option<&Unit> {
        self.units.as_ref().or(self.inferred.units.as_ref())
    }

    /// Returns the declared contents, or the contents shared by all operands.
    pub fn contents(&self) -> ContentsType {
        self.contents.unwrap_or(self.inferred.contents)
    }

    /// Returns the declared tag type, or the type shared by all operands.
    pub fn tag_type(&self) -> Option<TagType> {
        self.tag_type.or(self.inferred.tag_type)
    }

    /// Returns true if all operands are totalized.
    pub fn totalized(&self) -> bool {
        self.inferred.totalized
    }

    /// Returns the ID of the owning node or connection, or `None` for
    /// document-level virtual tags.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn declared_units(&self) -> Option<&Unit> {
        self.units.as_ref()
    }

    pub fn declared_contents(&self) -> Option<ContentsType> {
        self.contents
    }

    pub fn declared_tag_type(&self) -> Option<TagType> {
        self.tag_type
    }

    pub(crate) fn set_parent_id(&mut self, parent_id: Option<&str>) {
        self.parent_id = parent_id.map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{BinaryOp, UnaryOp};

    #[test]
    fn test_new() -> Result<(), Error> {
        let vtag = VirtualTag::new(
            "GasPerPower",
            vec![
                Operand::tag("BiogasFlow"),
                Operand::tag("PowerGen"),
                Operand::constant(24.0, Unit::parse("hr/day")?),
            ],
            Operator::binary(BinaryOp::Div),
        )?
        .with_contents(ContentsType::Biogas);

        assert_eq!(
            vtag.operand_ids().collect::<Vec<_>>(),
            vec!["BiogasFlow", "PowerGen"]
        );
        assert_eq!(vtag.operator().binary_ops(), &[BinaryOp::Div, BinaryOp::Div]);
        assert_eq!(vtag.contents(), ContentsType::Biogas);
        assert_eq!(vtag.declared_units(), None);
        assert_eq!(vtag.tag_type(), None);
        assert_eq!(vtag.parent_id(), None);
        Ok(())
    }

    #[test]
    fn test_invalid() {
        assert!(VirtualTag::new(
            "Loop",
            vec![Operand::tag("A"), Operand::tag("Loop")],
            Operator::binary(BinaryOp::Add),
        )
        .is_err_and(|e| e == Error::cycle_detected("Cycle detected: Loop -> Loop")));

        assert!(VirtualTag::new(
            "TwoDeltas",
            vec![Operand::tag("A"), Operand::tag("B")],
            Operator::unary(UnaryOp::Delta),
        )
        .is_err_and(|e| e
            == Error::invalid_operation(
                "Virtual tag TwoDeltas has 1 unary operators for 2 operands."
            )));
    }
}
