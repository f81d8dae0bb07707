// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

/*!
# WRRF Facility Graph

This is a library for representing the process units of water resource
recovery facilities, and the pipes, wires and deliveries between them, as a
hierarchical graph.

## Nodes and connections

The main struct is [`Node`].  A node is either a process unit (a pump, a
digester, a battery, ...) or a composite (`Network`, `Facility`,
`ModularUnit`) that holds child nodes and the [`Connection`]s between them.
Connections may reach nodes held by any ancestor of their composite, and may
name the child of a composite endpoint where the flow actually leaves
(`exit_point`) or enters (`entry_point`).

Documents are read with [`parse`], which returns the root network of the
document, and written back with [`serialize`].

## Tags

Nodes and connections own [`Tag`]s, which describe the sensors and data
columns of the facility, and [`VirtualTag`]s, which derive new series from
tags and other virtual tags through an [`Operator`].  The [`TagOwner`] trait
gives access to both.

Units, contents and tag type of a virtual tag are derived from its operands
when the document is validated, and virtual tag series can be computed with
[`Node::evaluate`].

## Validation

Parsed documents, and every change made through
[`try_update`][Node::try_update], are checked to make sure that:

- All connection endpoints and entry and exit points exist.
- Tag and virtual tag IDs are unique across the document.
- All virtual tag operands exist.
- No virtual tag depends on itself.
- Virtual tag operators combine compatible units.

If any of the checks fail, an [`Error`] describes the first problem found.

## Queries

[`Node::select_objs`] returns the nodes, connections, tags and virtual tags
that match a [`Query`].
*/

mod attributes;
pub use attributes::Attributes;

mod categories;
pub use categories::{ConnectionType, ContentsType, NodeType, TagType};

mod config;
pub use config::{ParserConfig, SerializerConfig, DEFAULT_ROOT_ID};

mod error;
pub use error::{Error, ErrorKind};

mod graph;
pub use graph::{iterators, Connection, Node, ObjectRef, ObjectType, Query};

mod graph_traits;
pub use graph_traits::TagOwner;

mod json;
pub use json::{from_value, merge_document, parse, parse_with_config, serialize, to_value};

mod quantity;
pub use quantity::{parse_quantity, DesignRange, Quantity, Unit};

mod registry;

mod tags;
pub use tags::{
    BinaryOp, Operand, Operator, SeriesSource, Tag, TagIndex, TagRef, TagSet, UnaryOp, UnitId,
    VirtualTag,
};
