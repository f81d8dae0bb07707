// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Filtered selection of nodes, connections, tags and virtual tags.

use crate::graph_traits::TagOwner;
use crate::tags::{Tag, UnitId, VirtualTag};
use crate::{Connection, ConnectionType, ContentsType, Node, NodeType, TagType};

/// The kinds of object a [`Query`] can select.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Node,
    Connection,
    Tag,
    VirtualTag,
}

/// An object selected by a [`Query`], borrowed from the graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObjectRef<'a> {
    Node(&'a Node),
    Connection(&'a Connection),
    Tag(&'a Tag),
    VirtualTag(&'a VirtualTag),
}

impl<'a> ObjectRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            ObjectRef::Node(node) => node.id(),
            ObjectRef::Connection(connection) => connection.id(),
            ObjectRef::Tag(tag) => tag.id(),
            ObjectRef::VirtualTag(vtag) => vtag.id(),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectRef::Node(_) => ObjectType::Node,
            ObjectRef::Connection(_) => ObjectType::Connection,
            ObjectRef::Tag(_) => ObjectType::Tag,
            ObjectRef::VirtualTag(_) => ObjectType::VirtualTag,
        }
    }

    pub fn as_node(&self) -> Option<&'a Node> {
        match self {
            ObjectRef::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_connection(&self) -> Option<&'a Connection> {
        match self {
            ObjectRef::Connection(connection) => Some(connection),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&'a Tag> {
        match self {
            ObjectRef::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn as_virtual_tag(&self) -> Option<&'a VirtualTag> {
        match self {
            ObjectRef::VirtualTag(vtag) => Some(vtag),
            _ => None,
        }
    }
}

/**
A conjunction of filters over the objects of a graph.

Every filter is optional.  A filter that doesn't apply to a kind of object
excludes that kind: `node_type` selects nodes of that type and the tags they
own, `source_id` selects connections and the tags they own, and `tag_type`
selects only tags and virtual tags.

```
use wrrf_facility_graph::{NodeType, ObjectType, Query};

let digester_tags = Query::new()
    .node_type(NodeType::Digestion)
    .obj_type(ObjectType::Tag)
    .recurse(true);
# let _ = digester_tags;
```
*/
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    id: Option<String>,
    source_id: Option<String>,
    dest_id: Option<String>,
    entry_point_id: Option<String>,
    exit_point_id: Option<String>,
    contents_type: Option<ContentsType>,
    node_type: Option<NodeType>,
    connection_type: Option<ConnectionType>,
    source_node_type: Option<NodeType>,
    dest_node_type: Option<NodeType>,
    tag_type: Option<TagType>,
    unit_id: Option<UnitId>,
    source_unit_id: Option<UnitId>,
    dest_unit_id: Option<UnitId>,
    obj_type: Option<ObjectType>,
    recurse: bool,
}

impl Query {
    /// Creates a query that matches everything at the current level.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Matches connections from the given node, and their tags.
    ///
    /// Bidirectional connections also match in reverse.  With `recurse`, a
    /// connection's exit point matches too.
    pub fn source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    /// Matches connections into the given node, and their tags.
    ///
    /// Bidirectional connections also match in reverse.  With `recurse`, a
    /// connection's entry point matches too.
    pub fn dest_id(mut self, id: impl Into<String>) -> Self {
        self.dest_id = Some(id.into());
        self
    }

    pub fn entry_point_id(mut self, id: impl Into<String>) -> Self {
        self.entry_point_id = Some(id.into());
        self
    }

    pub fn exit_point_id(mut self, id: impl Into<String>) -> Self {
        self.exit_point_id = Some(id.into());
        self
    }

    /// Matches nodes with the contents on either side, connections carrying
    /// them, and tags measuring them.
    pub fn contents_type(mut self, contents: ContentsType) -> Self {
        self.contents_type = Some(contents);
        self
    }

    pub fn node_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    pub fn connection_type(mut self, connection_type: ConnectionType) -> Self {
        self.connection_type = Some(connection_type);
        self
    }

    pub fn source_node_type(mut self, node_type: NodeType) -> Self {
        self.source_node_type = Some(node_type);
        self
    }

    pub fn dest_node_type(mut self, node_type: NodeType) -> Self {
        self.dest_node_type = Some(node_type);
        self
    }

    pub fn tag_type(mut self, tag_type: TagType) -> Self {
        self.tag_type = Some(tag_type);
        self
    }

    /// Matches tags with the unit on either side.  `UnitId::Total` matches
    /// only aggregate tags.
    pub fn unit_id(mut self, unit_id: impl Into<UnitId>) -> Self {
        self.unit_id = Some(unit_id.into());
        self
    }

    pub fn source_unit_id(mut self, unit_id: impl Into<UnitId>) -> Self {
        self.source_unit_id = Some(unit_id.into());
        self
    }

    pub fn dest_unit_id(mut self, unit_id: impl Into<UnitId>) -> Self {
        self.dest_unit_id = Some(unit_id.into());
        self
    }

    pub fn obj_type(mut self, obj_type: ObjectType) -> Self {
        self.obj_type = Some(obj_type);
        self
    }

    /// Also searches every composite below the current level.
    pub fn recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    fn wants(&self, obj_type: ObjectType) -> bool {
        self.obj_type.map_or(true, |t| t == obj_type)
    }

    fn has_connection_filters(&self) -> bool {
        self.source_id.is_some()
            || self.dest_id.is_some()
            || self.entry_point_id.is_some()
            || self.exit_point_id.is_some()
            || self.connection_type.is_some()
            || self.source_node_type.is_some()
            || self.dest_node_type.is_some()
    }

    fn has_tag_filters(&self) -> bool {
        self.tag_type.is_some()
            || self.unit_id.is_some()
            || self.source_unit_id.is_some()
            || self.dest_unit_id.is_some()
    }

    fn matches_id(&self, id: &str) -> bool {
        self.id.as_deref().map_or(true, |wanted| wanted == id)
    }
}

/// A query in progress.  Connection endpoints are resolved from `root`.
struct Selection<'a, 'q> {
    root: &'a Node,
    query: &'q Query,
    found: Vec<ObjectRef<'a>>,
}

/// Query evaluation.
impl Node {
    /// Returns every node, connection, tag and virtual tag that matches all
    /// the filters of `query`.
    ///
    /// This node's own tags come first.  Then, for each child node in
    /// declared order, the node followed by its tags and virtual tags; then
    /// each connection followed by its tags and virtual tags.  With
    /// `recurse`, the matches inside each composite child follow, depth-first
    /// in declared order.  No match is an empty result, not an error.
    pub fn select_objs(&self, query: &Query) -> Vec<ObjectRef<'_>> {
        let mut selection = Selection {
            root: self,
            query,
            found: vec![],
        };
        selection.owner_tags(self, OwnerRef::Node(self));
        selection.level(vec![], self);
        selection.found
    }
}

/// The owner of the tags being matched, with the scope of a connection.
#[derive(Clone, Copy)]
enum OwnerRef<'a, 's> {
    Node(&'a Node),
    Connection(&'a Connection, &'s [&'a str]),
}

impl<'a> Selection<'a, '_> {
    fn level(&mut self, scope: Vec<&'a str>, composite: &'a Node) {
        for node in composite.nodes() {
            if self.query.wants(ObjectType::Node) && self.node_matches(node) {
                self.found.push(ObjectRef::Node(node));
            }
            self.owner_tags(node, OwnerRef::Node(node));
        }
        for connection in composite.connections() {
            if self.query.wants(ObjectType::Connection) && self.connection_matches(&scope, connection) {
                self.found.push(ObjectRef::Connection(connection));
            }
            self.owner_tags(connection, OwnerRef::Connection(connection, &scope));
        }
        if self.query.recurse {
            for node in composite.nodes().iter().filter(|n| n.is_composite()) {
                let mut child_scope = scope.clone();
                child_scope.push(node.id());
                self.level(child_scope, node);
            }
        }
    }

    fn owner_tags(&mut self, owner: &'a dyn TagOwner, owner_ref: OwnerRef<'a, '_>) {
        let wants_tags = self.query.wants(ObjectType::Tag);
        let wants_vtags = self.query.wants(ObjectType::VirtualTag);
        if !(wants_tags || wants_vtags) || !self.owner_matches(owner_ref) {
            return;
        }
        if wants_tags {
            for tag in owner.tags() {
                if self.tag_matches(tag) {
                    self.found.push(ObjectRef::Tag(tag));
                }
            }
        }
        if wants_vtags {
            for vtag in owner.virtual_tags() {
                if self.virtual_tag_matches(vtag) {
                    self.found.push(ObjectRef::VirtualTag(vtag));
                }
            }
        }
    }

    fn node_matches(&self, node: &Node) -> bool {
        let q = self.query;
        !q.has_connection_filters()
            && !q.has_tag_filters()
            && q.matches_id(node.id())
            && q.node_type.map_or(true, |t| t == node.node_type())
            && q.contents_type.map_or(true, |c| {
                node.input_contents().contains(&c) || node.output_contents().contains(&c)
            })
    }

    fn connection_matches(&self, scope: &[&'a str], connection: &Connection) -> bool {
        let q = self.query;
        q.node_type.is_none()
            && !q.has_tag_filters()
            && q.matches_id(connection.id())
            && q.contents_type.map_or(true, |c| c == connection.contents())
            && self.connection_context_matches(scope, connection)
    }

    /// The filters a connection passes on to the tags it owns.
    fn connection_context_matches(&self, scope: &[&'a str], connection: &Connection) -> bool {
        let q = self.query;
        if q.node_type.is_some()
            || !q.connection_type.map_or(true, |t| t == connection.connection_type())
            || !matches_opt(&q.entry_point_id, connection.entry_point())
            || !matches_opt(&q.exit_point_id, connection.exit_point())
        {
            return false;
        }

        let (source, destination) = (connection.source(), connection.destination());
        let (exit, entry) = (connection.exit_point(), connection.entry_point());
        let end_matches = |wanted: &Option<String>, end: &str, point: Option<&str>| match wanted {
            None => true,
            Some(id) => id == end || (q.recurse && point == Some(id.as_str())),
        };
        let forward = end_matches(&q.source_id, source, exit) && end_matches(&q.dest_id, destination, entry);
        let reverse = connection.is_bidirectional()
            && end_matches(&q.source_id, destination, entry)
            && end_matches(&q.dest_id, source, exit);
        if !(forward || reverse) {
            return false;
        }

        let end_type = |id: &str| {
            self.root
                .resolve(scope, id)
                .and_then(|path| self.root.node_at(&path).ok())
                .map(Node::node_type)
        };
        q.source_node_type
            .map_or(true, |t| end_type(source) == Some(t))
            && q.dest_node_type
                .map_or(true, |t| end_type(destination) == Some(t))
    }

    fn owner_matches(&self, owner: OwnerRef<'a, '_>) -> bool {
        match owner {
            OwnerRef::Node(node) => {
                !self.query.has_connection_filters()
                    && self.query.node_type.map_or(true, |t| t == node.node_type())
            }
            OwnerRef::Connection(connection, scope) => {
                self.connection_context_matches(scope, connection)
            }
        }
    }

    fn tag_matches(&self, tag: &Tag) -> bool {
        let q = self.query;
        q.matches_id(tag.id())
            && q.contents_type.map_or(true, |c| c == tag.contents())
            && q.tag_type.map_or(true, |t| t == tag.tag_type())
            && q.unit_id.map_or(true, |u| tag.has_unit_id(u))
            && q.source_unit_id.map_or(true, |u| tag.source_unit_id() == Some(u))
            && q.dest_unit_id.map_or(true, |u| tag.dest_unit_id() == Some(u))
    }

    fn virtual_tag_matches(&self, vtag: &VirtualTag) -> bool {
        let q = self.query;
        q.unit_id.is_none()
            && q.source_unit_id.is_none()
            && q.dest_unit_id.is_none()
            && q.matches_id(vtag.id())
            && q.contents_type.map_or(true, |c| c == vtag.contents())
            && q.tag_type.map_or(true, |t| vtag.tag_type() == Some(t))
    }
}

fn matches_opt(wanted: &Option<String>, actual: Option<&str>) -> bool {
    wanted.as_deref().map_or(true, |w| actual == Some(w))
}
