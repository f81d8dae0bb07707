// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Methods for validating the tags and virtual tags of a document.

use std::collections::HashMap;

use crate::tags::{inference, Inferred, TagIndex};
use crate::Error;

use super::GraphValidator;

impl<'a> GraphValidator<'a> {
    /// Validates that tag and virtual tag IDs are unique across the document.
    pub(super) fn validate_tag_namespace(&self) -> Result<TagIndex<'a>, Error> {
        self.root.tag_index()
    }

    /// Validates that every virtual tag operand resolves, that the operand
    /// graph is acyclic and that the operators combine compatible units.
    ///
    /// Returns the attributes derived for each virtual tag.
    pub(super) fn validate_virtual_tags(
        &self,
        index: &TagIndex<'a>,
    ) -> Result<HashMap<String, Inferred>, Error> {
        inference::infer_virtual_tags(index)
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_utils::FacilityBuilder;
    use crate::graph_traits::{insert_tag, insert_virtual_tag};
    use crate::quantity::Unit;
    use crate::tags::{BinaryOp, Operand, Operator, Tag, UnaryOp, VirtualTag};
    use crate::{ContentsType, Error, ErrorKind, TagType};

    #[test]
    fn test_tag_namespace() -> Result<(), Error> {
        let mut plant = FacilityBuilder::wwtp()?;
        insert_tag(
            plant.node_at_mut(&["WWTP", "Cogen"])?,
            Tag::new("GasFlow1", TagType::Flow, None, ContentsType::Biogas),
        )?;

        assert!(plant.validate().is_err_and(|e| e
            == Error::duplicate_id(
                "Tag id GasFlow1 is used by both a tag of Cogen and a tag of DigesterGas."
            )));
        Ok(())
    }

    #[test]
    fn test_virtual_tags() -> Result<(), Error> {
        let plant = FacilityBuilder::wwtp()?;
        let sum = plant.get_virtual_tag_recursive("GasFlowSum")?;
        assert_eq!(sum.units(), Unit::parse("SCFM")?.as_ref());
        assert_eq!(sum.contents(), ContentsType::Biogas);
        assert_eq!(sum.tag_type(), Some(TagType::Flow));
        assert!(!sum.totalized());

        let mut broken = plant.clone();
        insert_virtual_tag(
            broken.node_at_mut(&["WWTP", "Cogen"])?,
            VirtualTag::new(
                "CogenLoad",
                vec![Operand::tag("CogenPower")],
                Operator::unary(UnaryOp::Noop),
            )?,
        )?;
        assert!(broken.validate().is_err_and(|e| e
            == Error::malformed_document(
                "Virtual tag CogenLoad references unknown tag CogenPower."
            )));

        let mut broken = plant.clone();
        insert_virtual_tag(
            broken.node_at_mut(&["WWTP", "Cogen"])?,
            VirtualTag::new(
                "Nonsense",
                vec![Operand::tag("GasFlow1"), Operand::tag("Digester1Level")],
                Operator::binary(BinaryOp::Sub),
            )?,
        )?;
        assert!(broken
            .validate()
            .is_err_and(|e| e.kind() == ErrorKind::UnitMismatch));
        Ok(())
    }
}
