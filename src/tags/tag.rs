// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Tags, i.e. references to real sensor or data columns.

use crate::quantity::Unit;
use crate::{ContentsType, Error, TagType};

/// Identifies which of the parallel physical units of a node or connection a
/// reading belongs to.
///
/// `Total` marks an aggregate reading over all units, which must not be added
/// to the per-unit readings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitId {
    Total,
    Unit(u32),
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitId::Total => write!(f, "total"),
            UnitId::Unit(id) => write!(f, "{id}"),
        }
    }
}

impl std::str::FromStr for UnitId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "total" {
            return Ok(UnitId::Total);
        }
        s.parse::<u32>()
            .map(UnitId::Unit)
            .map_err(|_| Error::malformed_document(format!("Invalid unit id: {s}")))
    }
}

impl From<u32> for UnitId {
    fn from(id: u32) -> Self {
        UnitId::Unit(id)
    }
}

/// A reference to one real-world sensor or data column.
#[derive(Clone, Debug, PartialEq)]
pub struct Tag {
    id: String,
    tag_type: TagType,
    units: Option<Unit>,
    contents: ContentsType,
    totalized: bool,
    source_unit_id: Option<UnitId>,
    dest_unit_id: Option<UnitId>,
    parent_id: Option<String>,
}

impl Tag {
    /// Creates a new tag.  The tag gets its parent when it is added to a node
    /// or connection.
    pub fn new(
        id: impl Into<String>,
        tag_type: TagType,
        units: Option<Unit>,
        contents: ContentsType,
    ) -> Self {
        Self {
            id: id.into(),
            tag_type,
            units,
            contents,
            totalized: false,
            source_unit_id: None,
            dest_unit_id: None,
            parent_id: None,
        }
    }

    /// Marks the tag as a cumulative counter.
    pub fn with_totalized(mut self, totalized: bool) -> Self {
        self.totalized = totalized;
        self
    }

    pub fn with_source_unit_id(mut self, unit_id: impl Into<UnitId>) -> Self {
        self.source_unit_id = Some(unit_id.into());
        self
    }

    pub fn with_dest_unit_id(mut self, unit_id: impl Into<UnitId>) -> Self {
        self.dest_unit_id = Some(unit_id.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }

    pub fn units(&self) -> Option<&Unit> {
        self.units.as_ref()
    }

    pub fn contents(&self) -> ContentsType {
        self.contents
    }

    pub fn totalized(&self) -> bool {
        self.totalized
    }

    pub fn source_unit_id(&self) -> Option<UnitId> {
        self.source_unit_id
    }

    pub fn dest_unit_id(&self) -> Option<UnitId> {
        self.dest_unit_id
    }

    /// Returns the ID of the node or connection that owns the tag.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Returns true if the tag is an aggregate over all parallel units.
    pub fn is_aggregate(&self) -> bool {
        self.source_unit_id == Some(UnitId::Total) || self.dest_unit_id == Some(UnitId::Total)
    }

    /// Returns true if either unit qualifier of the tag is `unit_id`.
    pub fn has_unit_id(&self, unit_id: UnitId) -> bool {
        self.source_unit_id == Some(unit_id) || self.dest_unit_id == Some(unit_id)
    }

    pub(crate) fn set_parent_id(&mut self, parent_id: &str) {
        self.parent_id = Some(parent_id.to_string());
    }

    pub(crate) fn clear_dest_unit_id(&mut self) {
        self.dest_unit_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id() -> Result<(), Error> {
        assert_eq!("total".parse::<UnitId>()?, UnitId::Total);
        assert_eq!("3".parse::<UnitId>()?, UnitId::Unit(3));
        assert_eq!(UnitId::Total.to_string(), "total");
        assert!("Total"
            .parse::<UnitId>()
            .is_err_and(|e| e == Error::malformed_document("Invalid unit id: Total")));
        Ok(())
    }

    #[test]
    fn test_tag() -> Result<(), Error> {
        let tag = Tag::new(
            "PumpFlow1",
            TagType::Flow,
            Unit::parse("MGD")?,
            ContentsType::UntreatedSewage,
        )
        .with_totalized(true)
        .with_source_unit_id(UnitId::Unit(1));

        assert_eq!(tag.id(), "PumpFlow1");
        assert!(tag.totalized());
        assert_eq!(tag.source_unit_id(), Some(UnitId::Unit(1)));
        assert_eq!(tag.dest_unit_id(), None);
        assert_eq!(tag.parent_id(), None);
        assert!(tag.has_unit_id(UnitId::Unit(1)));
        assert!(!tag.is_aggregate());

        let total = Tag::new("PumpFlowTotal", TagType::Flow, None, ContentsType::UntreatedSewage)
            .with_dest_unit_id(UnitId::Total);
        assert!(total.is_aggregate());
        Ok(())
    }
}
