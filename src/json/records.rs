// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! The document representation of tags and virtual tags.

use serde::{Deserialize, Serialize};

use crate::quantity::Unit;
use crate::tags::{BinaryOp, Operand, Operator, Tag, UnaryOp, UnitId, VirtualTag};
use crate::{ContentsType, Error, ParserConfig, TagType};

/// A unit ID as written in a document: a number, `"total"`, or a number in a
/// string.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub(super) enum UnitIdRecord {
    Number(u32),
    Text(String),
}

impl TryFrom<UnitIdRecord> for UnitId {
    type Error = Error;

    fn try_from(record: UnitIdRecord) -> Result<Self, Self::Error> {
        match record {
            UnitIdRecord::Number(id) => Ok(UnitId::Unit(id)),
            UnitIdRecord::Text(text) => text.parse(),
        }
    }
}

impl From<UnitId> for UnitIdRecord {
    fn from(unit_id: UnitId) -> Self {
        match unit_id {
            UnitId::Total => UnitIdRecord::Text(unit_id.to_string()),
            UnitId::Unit(id) => UnitIdRecord::Number(id),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub(super) struct TagRecord {
    #[serde(rename = "type")]
    tag_type: String,
    #[serde(default)]
    units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contents: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_unit_id: Option<UnitIdRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dest_unit_id: Option<UnitIdRecord>,
    #[serde(default)]
    totalized: bool,
}

impl TagRecord {
    /// Builds a tag.  Tags without contents take `owner_contents` if the
    /// configuration allows it.
    pub(super) fn into_tag(
        self,
        id: &str,
        owner_contents: Option<ContentsType>,
        config: &ParserConfig,
    ) -> Result<Tag, Error> {
        let tag_type = self.tag_type.parse::<TagType>()?;
        let units = Unit::parse(self.units.as_deref().unwrap_or_default())?;
        let contents = match self.contents {
            Some(contents) => contents.parse()?,
            None if tag_type.is_contentless() => ContentsType::Unspecified,
            None => match owner_contents.filter(|_| config.infer_tag_contents) {
                Some(contents) => {
                    tracing::trace!("Tag {id} takes the contents {contents} of its owner.");
                    contents
                }
                None if config.strict_tag_contents => {
                    return Err(Error::malformed_document(format!(
                        "Can't determine the contents of tag {id}."
                    )))
                }
                None => ContentsType::Unspecified,
            },
        };

        let mut tag = Tag::new(id, tag_type, units, contents).with_totalized(self.totalized);
        if let Some(unit_id) = self.source_unit_id {
            tag = tag.with_source_unit_id(UnitId::try_from(unit_id)?);
        }
        if let Some(unit_id) = self.dest_unit_id {
            tag = tag.with_dest_unit_id(UnitId::try_from(unit_id)?);
        }
        Ok(tag)
    }

    pub(super) fn from_tag(tag: &Tag) -> Self {
        Self {
            tag_type: tag.tag_type().to_string(),
            units: tag.units().map(Unit::to_string),
            // always written, so that reading it back doesn't infer anything
            contents: Some(tag.contents().to_string()),
            source_unit_id: tag.source_unit_id().map(UnitIdRecord::from),
            dest_unit_id: tag.dest_unit_id().map(UnitIdRecord::from),
            totalized: tag.totalized(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub(super) enum OperandRecord {
    Tag(String),
    Constant {
        value: f64,
        #[serde(default)]
        units: Option<String>,
    },
}

/// One operator name for every operand (or gap between operands), or one
/// name per operand (or gap).
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub(super) enum OpList {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize, Serialize)]
pub(super) struct VirtualTagRecord {
    tags: Vec<OperandRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unary_operations: Option<OpList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    binary_operations: Option<OpList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contents: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    tag_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
}

impl VirtualTagRecord {
    /// Builds a virtual tag, and returns it with the parent ID named in the
    /// record.
    ///
    /// `type` holds the tag type.  Older documents put the operator there
    /// instead, which is accepted when `operations` is missing.
    pub(super) fn into_virtual_tag(self, id: &str) -> Result<(VirtualTag, Option<String>), Error> {
        let mut operations = self.operations;
        let mut tag_type = None;
        if let Some(text) = self.tag_type {
            match text.parse::<TagType>() {
                Ok(parsed) => tag_type = Some(parsed),
                Err(_) if operations.is_none() && is_operator_name(&text) => {
                    tracing::warn!("Virtual tag {id} names its operator in `type`.");
                    operations = Some(text);
                }
                Err(err) => return Err(err),
            }
        }

        let operands = self
            .tags
            .into_iter()
            .map(|operand| match operand {
                OperandRecord::Tag(id) => Ok(Operand::Tag(id)),
                OperandRecord::Constant { value, units } => Ok(Operand::constant(
                    value,
                    Unit::parse(units.as_deref().unwrap_or_default())?,
                )),
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let operator = match (operations, self.unary_operations, self.binary_operations) {
            (Some(name), None, None) => Operator::parse(&name, operands.len())?,
            (Some(_), _, _) => {
                return Err(Error::malformed_document(format!(
                    "Virtual tag {id} has both `operations` and per-operand operations."
                )))
            }
            (None, None, None) => {
                return Err(Error::malformed_document(format!(
                    "Virtual tag {id} has no operations."
                )))
            }
            (None, unary, binary) => Operator::new(
                unary_ops(unary, operands.len())?,
                binary_ops(binary)?,
            ),
        };

        let mut vtag = VirtualTag::new(id, operands, operator)?;
        if let Some(units) = self.units.as_deref().map(Unit::parse).transpose()?.flatten() {
            vtag = vtag.with_units(units);
        }
        if let Some(contents) = self.contents {
            vtag = vtag.with_contents(contents.parse()?);
        }
        if let Some(tag_type) = tag_type {
            vtag = vtag.with_tag_type(tag_type);
        }
        Ok((vtag, self.parent_id))
    }

    /// Writes a virtual tag.  Only declared attributes are written.
    pub(super) fn from_virtual_tag(vtag: &VirtualTag, with_parent: bool) -> Self {
        let operator = vtag.operator();
        let names = |names: Vec<&str>| {
            (!names.is_empty()).then(|| OpList::Many(names.into_iter().map(str::to_string).collect()))
        };
        let (operations, unary_operations, binary_operations) = match operator.single_name() {
            Some(name) => (Some(name.to_string()), None, None),
            None => (
                None,
                names(operator.unary_ops().iter().map(UnaryOp::as_str).collect()),
                names(operator.binary_ops().iter().map(BinaryOp::as_str).collect()),
            ),
        };

        Self {
            tags: vtag
                .operands()
                .iter()
                .map(|operand| match operand {
                    Operand::Tag(id) => OperandRecord::Tag(id.clone()),
                    Operand::Constant { value, units } => OperandRecord::Constant {
                        value: *value,
                        units: units.as_ref().map(Unit::to_string),
                    },
                })
                .collect(),
            operations,
            unary_operations,
            binary_operations,
            units: vtag.declared_units().map(Unit::to_string),
            contents: vtag.declared_contents().map(|c| c.to_string()),
            tag_type: vtag.declared_tag_type().map(|t| t.to_string()),
            parent_id: vtag
                .parent_id()
                .filter(|_| with_parent)
                .map(str::to_string),
        }
    }
}

fn is_operator_name(name: &str) -> bool {
    UnaryOp::from_name(name).is_some() || BinaryOp::from_name(name).is_some()
}

fn unary_ops(list: Option<OpList>, operand_count: usize) -> Result<Vec<UnaryOp>, Error> {
    let parse = |name: &str| {
        UnaryOp::from_name(name)
            .ok_or_else(|| Error::unknown_type(format!("Unknown unary operator: {name}")))
    };
    match list {
        None => Ok(vec![]),
        Some(OpList::One(name)) => Ok(vec![parse(&name)?; operand_count]),
        Some(OpList::Many(names)) => names.iter().map(|name| parse(name)).collect(),
    }
}

fn binary_ops(list: Option<OpList>) -> Result<Vec<BinaryOp>, Error> {
    let parse = |name: &str| {
        BinaryOp::from_name(name)
            .ok_or_else(|| Error::unknown_type(format!("Unknown binary operator: {name}")))
    };
    match list {
        None => Ok(vec![]),
        Some(OpList::One(name)) => Ok(vec![parse(&name)?]),
        Some(OpList::Many(names)) => names.iter().map(|name| parse(name)).collect(),
    }
}
