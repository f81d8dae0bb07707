// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! This module contains the trait shared by everything in the graph that can
//! own tags: nodes and connections.

use crate::tags::{Tag, TagSet, VirtualTag};
use crate::Error;

pub(crate) mod private {
    use crate::tags::{Tag, TagSet};

    /// Keeps [`TagOwner`][super::TagOwner] implementable only inside this
    /// crate.
    pub trait Sealed {
        fn tag_set_mut(&mut self) -> &mut TagSet;

        /// Adjusts a tag before it is stored in this owner.
        fn prepare_tag(&self, tag: Tag) -> Tag {
            tag
        }
    }
}

/**
The tag ownership interface of [`Node`][crate::Node]s and
[`Connection`][crate::Connection]s.

A tag belongs to exactly one owner.  Adding a tag moves it into its owner and
sets its parent ID.  Tags and virtual tags share one namespace.

On a [`Node`][crate::Node] every change is checked against the whole
hierarchy below the node, as in [`Node::try_update`][crate::Node::try_update]:
IDs must be unique, operands must resolve, virtual tags must not read
themselves, and a tag can't be removed while a virtual tag reads it.  A
failed change leaves the node as it was.  A standalone
[`Connection`][crate::Connection] only checks its own tags.  Tags of nodes
and connections inside a graph are changed through the path-addressed
methods of the root, such as [`Node::add_tag_at`][crate::Node::add_tag_at].

```
use wrrf_facility_graph::{ContentsType, Node, NodeType, Tag, TagOwner, TagType};

let mut pump = Node::with_contents("Pump1", NodeType::Pump, vec![ContentsType::UntreatedSewage]);
pump.add_tag(Tag::new("Pump1Runtime", TagType::RunTime, None, ContentsType::Unspecified))
    .unwrap();

assert_eq!(pump.get_tag("Pump1Runtime").and_then(Tag::parent_id), Some("Pump1"));
assert!(pump
    .add_tag(Tag::new("Pump1Runtime", TagType::RunTime, None, ContentsType::Unspecified))
    .is_err());
```
*/
pub trait TagOwner: private::Sealed {
    /// Returns the ID of the owner.
    fn id(&self) -> &str;

    /// Returns the tags and virtual tags of the owner.
    fn tag_set(&self) -> &TagSet;

    fn tags(&self) -> &[Tag] {
        self.tag_set().tags()
    }

    fn virtual_tags(&self) -> &[VirtualTag] {
        self.tag_set().virtual_tags()
    }

    fn get_tag(&self, id: &str) -> Option<&Tag> {
        self.tag_set().get_tag(id)
    }

    fn get_virtual_tag(&self, id: &str) -> Option<&VirtualTag> {
        self.tag_set().get_virtual_tag(id)
    }

    /// Adds a tag.  Fails with `DuplicateId` if the ID is taken.
    fn add_tag(&mut self, tag: Tag) -> Result<(), Error> {
        insert_tag(self, tag)
    }

    /// Removes a tag.  Fails with `DanglingReference` if a virtual tag reads
    /// it.
    fn remove_tag(&mut self, id: &str) -> Result<Tag, Error> {
        take_tag(self, id)
    }

    /// Adds a virtual tag.  Fails with `DuplicateId` if the ID is taken.
    fn add_virtual_tag(&mut self, vtag: VirtualTag) -> Result<(), Error> {
        insert_virtual_tag(self, vtag)
    }

    /// Removes a virtual tag.  Fails with `DanglingReference` if another
    /// virtual tag reads it.
    fn remove_virtual_tag(&mut self, id: &str) -> Result<VirtualTag, Error> {
        take_virtual_tag(self, id)
    }
}

// The functions below change a single owner's tags without looking at the
// rest of the document.  Callers validate the document afterwards.

pub(crate) fn insert_tag<O: TagOwner + ?Sized>(owner: &mut O, tag: Tag) -> Result<(), Error> {
    let owner_id = owner.id().to_string();
    let tag = owner.prepare_tag(tag);
    owner.tag_set_mut().insert_tag(&owner_id, tag)
}

pub(crate) fn insert_virtual_tag<O: TagOwner + ?Sized>(
    owner: &mut O,
    vtag: VirtualTag,
) -> Result<(), Error> {
    let owner_id = owner.id().to_string();
    owner
        .tag_set_mut()
        .insert_virtual_tag(Some(owner_id.as_str()), vtag)
}

pub(crate) fn take_tag<O: TagOwner + ?Sized>(owner: &mut O, id: &str) -> Result<Tag, Error> {
    let owner_id = owner.id().to_string();
    owner.tag_set_mut().remove_tag(&owner_id, id)
}

pub(crate) fn take_virtual_tag<O: TagOwner + ?Sized>(
    owner: &mut O,
    id: &str,
) -> Result<VirtualTag, Error> {
    let owner_id = owner.id().to_string();
    owner.tag_set_mut().remove_virtual_tag(&owner_id, id)
}
