// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! A document-wide lookup of tags and virtual tags by ID.

use std::collections::HashMap;

use crate::quantity::Unit;
use crate::tags::{Tag, VirtualTag};
use crate::{ContentsType, Error, TagType};

/// A tag or a virtual tag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TagRef<'a> {
    Tag(&'a Tag),
    Virtual(&'a VirtualTag),
}

impl<'a> TagRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            TagRef::Tag(tag) => tag.id(),
            TagRef::Virtual(vtag) => vtag.id(),
        }
    }

    pub fn units(&self) -> Option<&'a Unit> {
        match self {
            TagRef::Tag(tag) => tag.units(),
            TagRef::Virtual(vtag) => vtag.units(),
        }
    }

    pub fn contents(&self) -> ContentsType {
        match self {
            TagRef::Tag(tag) => tag.contents(),
            TagRef::Virtual(vtag) => vtag.contents(),
        }
    }

    pub fn tag_type(&self) -> Option<TagType> {
        match self {
            TagRef::Tag(tag) => Some(tag.tag_type()),
            TagRef::Virtual(vtag) => vtag.tag_type(),
        }
    }

    pub fn totalized(&self) -> bool {
        match self {
            TagRef::Tag(tag) => tag.totalized(),
            TagRef::Virtual(vtag) => vtag.totalized(),
        }
    }

    pub fn parent_id(&self) -> Option<&'a str> {
        match self {
            TagRef::Tag(tag) => tag.parent_id(),
            TagRef::Virtual(vtag) => vtag.parent_id(),
        }
    }
}

/// Every tag and virtual tag of a graph, by ID.
///
/// Tag and virtual tag IDs share one namespace across the whole document, so
/// a `TagIndex` can only be built from a graph without duplicates.  It is the
/// lookup context for deriving virtual tag attributes and for evaluating
/// virtual tags; build one with
/// [`Node::tag_index`][crate::Node::tag_index].
#[derive(Clone, Debug, Default)]
pub struct TagIndex<'a> {
    order: Vec<&'a str>,
    entries: HashMap<&'a str, TagRef<'a>>,
}

impl<'a> TagIndex<'a> {
    pub(crate) fn insert(&mut self, entry: TagRef<'a>) -> Result<(), Error> {
        let id = entry.id();
        if let Some(existing) = self.entries.get(id) {
            return Err(Error::duplicate_id(format!(
                "Tag id {id} is used by both {} and {}.",
                describe_owner(existing),
                describe_owner(&entry)
            )));
        }
        self.order.push(id);
        self.entries.insert(id, entry);
        Ok(())
    }

    /// Returns the tag or virtual tag with the given ID.
    pub fn get(&self, id: &str) -> Option<TagRef<'a>> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns all tags and virtual tags, in graph order.
    pub fn iter(&self) -> impl Iterator<Item = TagRef<'a>> + '_ {
        self.order.iter().filter_map(|id| self.entries.get(id).copied())
    }

    /// Returns all virtual tags, in graph order.
    pub fn virtual_tags(&self) -> impl Iterator<Item = &'a VirtualTag> + '_ {
        self.iter().filter_map(|entry| match entry {
            TagRef::Virtual(vtag) => Some(vtag),
            TagRef::Tag(_) => None,
        })
    }
}

fn describe_owner(entry: &TagRef<'_>) -> String {
    let kind = match entry {
        TagRef::Tag(_) => "a tag",
        TagRef::Virtual(_) => "a virtual tag",
    };
    match entry.parent_id() {
        Some(parent) => format!("{kind} of {parent}"),
        None => format!("{kind} of the document"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{Operand, Operator, UnaryOp};

    #[test]
    fn test_index() -> Result<(), Error> {
        let mut flow = Tag::new("Flow", TagType::Flow, None, ContentsType::Biogas);
        flow.set_parent_id("Pipe1");
        let mut other = Tag::new("Flow", TagType::Flow, None, ContentsType::Biogas);
        other.set_parent_id("Pipe2");
        let vtag = VirtualTag::new(
            "FlowDelta",
            vec![Operand::tag("Flow")],
            Operator::unary(UnaryOp::Delta),
        )?;

        let mut index = TagIndex::default();
        index.insert(TagRef::Tag(&flow))?;
        index.insert(TagRef::Virtual(&vtag))?;

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("Flow"), Some(TagRef::Tag(&flow)));
        assert_eq!(index.get("Level"), None);
        assert_eq!(
            index.virtual_tags().map(VirtualTag::id).collect::<Vec<_>>(),
            vec!["FlowDelta"]
        );
        assert!(index.insert(TagRef::Tag(&other)).is_err_and(|e| e
            == Error::duplicate_id("Tag id Flow is used by both a tag of Pipe1 and a tag of Pipe2.")));
        Ok(())
    }
}
