// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! A hierarchical graph of the process units of a water resource recovery
//! facility, and the connections between them.

mod composition;
mod creation;
mod mutation;
mod query;
mod retrieval;
mod validation;

pub mod iterators;
mod traversal;

#[cfg(test)]
pub(crate) mod test_utils;

pub use query::{ObjectRef, ObjectType, Query};

use crate::attributes::Attributes;
use crate::graph_traits::{insert_tag, insert_virtual_tag, private::Sealed, TagOwner};
use crate::tags::{Tag, TagSet, VirtualTag};
use crate::{ConnectionType, ContentsType, Error, NodeType};

/**
A process unit, or a composite container of process units.

Composite nodes (`Network`, `Facility`, `ModularUnit`) own an ordered list of
child nodes and the connections between them.  Node and connection IDs are
unique within the composite that holds them, but the same ID may be reused at
a different depth.  The root of a parsed document is a composite node too.

Nodes are addressed by their path of IDs from the node an operation is called
on.  An empty path is the node itself.

```
use wrrf_facility_graph::{ContentsType, Node, NodeType};

let mut plant = Node::network("WWTP");
plant.add_node(Node::with_contents("Digester", NodeType::Digestion, vec![ContentsType::Biogas]))
    .unwrap();

assert_eq!(plant.node_at(&["Digester"]).unwrap().node_type(), NodeType::Digestion);
assert!(plant.add_node(Node::network("Digester")).is_err());
```
*/
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    id: String,
    node_type: NodeType,
    input_contents: Vec<ContentsType>,
    output_contents: Vec<ContentsType>,
    attributes: Attributes,
    tags: TagSet,
    nodes: Vec<Node>,
    connections: Vec<Connection>,
}

/// A directed, optionally bidirectional, flow of one contents type between
/// two nodes.
///
/// `source` and `destination` are node IDs, resolved from the composite that
/// holds the connection and then from its ancestors.  When an endpoint is a
/// composite, `exit_point` and `entry_point` name the child of that endpoint
/// where the flow actually leaves or enters.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    id: String,
    connection_type: ConnectionType,
    source: String,
    destination: String,
    contents: ContentsType,
    bidirectional: bool,
    exit_point: Option<String>,
    entry_point: Option<String>,
    attributes: Attributes,
    tags: TagSet,
}

impl Sealed for Node {
    fn tag_set_mut(&mut self) -> &mut TagSet {
        &mut self.tags
    }

    // A node-level reading has no destination unit.
    fn prepare_tag(&self, mut tag: Tag) -> Tag {
        tag.clear_dest_unit_id();
        tag
    }
}

impl TagOwner for Node {
    fn id(&self) -> &str {
        &self.id
    }

    fn tag_set(&self) -> &TagSet {
        &self.tags
    }

    fn add_tag(&mut self, tag: Tag) -> Result<(), Error> {
        self.try_update(|node| insert_tag(node, tag))
    }

    fn remove_tag(&mut self, id: &str) -> Result<Tag, Error> {
        self.remove_tag_at(&[], id)
    }

    fn add_virtual_tag(&mut self, vtag: VirtualTag) -> Result<(), Error> {
        self.try_update(|node| insert_virtual_tag(node, vtag))
    }

    fn remove_virtual_tag(&mut self, id: &str) -> Result<VirtualTag, Error> {
        self.remove_virtual_tag_at(&[], id)
    }
}

impl Sealed for Connection {
    fn tag_set_mut(&mut self) -> &mut TagSet {
        &mut self.tags
    }
}

impl TagOwner for Connection {
    fn id(&self) -> &str {
        &self.id
    }

    fn tag_set(&self) -> &TagSet {
        &self.tags
    }
}
