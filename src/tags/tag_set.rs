// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! The tags and virtual tags owned by a single node or connection.

use crate::tags::{Tag, VirtualTag};
use crate::Error;

/// Tags and virtual tags of one owner, in the order they were added.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagSet {
    tags: Vec<Tag>,
    virtual_tags: Vec<VirtualTag>,
}

impl TagSet {
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn virtual_tags(&self) -> &[VirtualTag] {
        &self.virtual_tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.virtual_tags.is_empty()
    }

    pub fn get_tag(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id() == id)
    }

    pub fn get_virtual_tag(&self, id: &str) -> Option<&VirtualTag> {
        self.virtual_tags.iter().find(|t| t.id() == id)
    }

    /// Returns true if a tag or virtual tag with the given ID exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get_tag(id).is_some() || self.get_virtual_tag(id).is_some()
    }

    pub(crate) fn virtual_tags_mut(&mut self) -> impl Iterator<Item = &mut VirtualTag> {
        self.virtual_tags.iter_mut()
    }

    pub(crate) fn insert_tag(&mut self, owner: &str, mut tag: Tag) -> Result<(), Error> {
        if self.contains(tag.id()) {
            return Err(Error::duplicate_id(format!(
                "Tag with id {} already exists in {owner}.",
                tag.id()
            )));
        }
        tag.set_parent_id(owner);
        self.tags.push(tag);
        Ok(())
    }

    pub(crate) fn insert_virtual_tag(
        &mut self,
        owner: Option<&str>,
        mut vtag: VirtualTag,
    ) -> Result<(), Error> {
        if self.contains(vtag.id()) {
            return Err(Error::duplicate_id(format!(
                "Virtual tag with id {} already exists in {}.",
                vtag.id(),
                owner.unwrap_or("the document")
            )));
        }
        vtag.set_parent_id(owner);
        self.virtual_tags.push(vtag);
        Ok(())
    }

    /// Removes a tag.  Fails if a virtual tag of the same owner reads it.
    pub(crate) fn remove_tag(&mut self, owner: &str, id: &str) -> Result<Tag, Error> {
        let Some(position) = self.tags.iter().position(|t| t.id() == id) else {
            return Err(Error::object_not_found(format!(
                "Tag with id {id} not found in {owner}."
            )));
        };
        self.check_unreferenced(id)?;
        Ok(self.tags.remove(position))
    }

    /// Removes a virtual tag.  Fails if another virtual tag of the same owner
    /// reads it.
    pub(crate) fn remove_virtual_tag(&mut self, owner: &str, id: &str) -> Result<VirtualTag, Error> {
        let Some(position) = self.virtual_tags.iter().position(|t| t.id() == id) else {
            return Err(Error::object_not_found(format!(
                "Virtual tag with id {id} not found in {owner}."
            )));
        };
        self.check_unreferenced(id)?;
        Ok(self.virtual_tags.remove(position))
    }

    /// Moves the tags and owned virtual tags to an owner with a new ID.
    pub(crate) fn set_owner(&mut self, owner: &str) {
        for tag in &mut self.tags {
            tag.set_parent_id(owner);
        }
        for vtag in &mut self.virtual_tags {
            if vtag.parent_id().is_some() {
                vtag.set_parent_id(Some(owner));
            }
        }
    }

    /// Removes every tag and virtual tag whose ID is in `ids`, without any
    /// checks.
    pub(crate) fn purge(&mut self, ids: &std::collections::HashSet<String>) {
        self.tags.retain(|t| !ids.contains(t.id()));
        self.virtual_tags.retain(|t| !ids.contains(t.id()));
    }

    fn check_unreferenced(&self, id: &str) -> Result<(), Error> {
        if let Some(reader) = self
            .virtual_tags
            .iter()
            .find(|v| v.operand_ids().any(|op| op == id))
        {
            return Err(Error::dangling_reference(format!(
                "{id} is an operand of virtual tag {}.",
                reader.id()
            )));
        }
        Ok(())
    }
}
