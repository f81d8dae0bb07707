// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Methods for changing the structure of a [`Node`] hierarchy.
//!
//! Every method either applies completely or leaves the graph unchanged.

use std::collections::HashSet;

use crate::graph_traits::{insert_tag, insert_virtual_tag, take_tag, take_virtual_tag};
use crate::registry;
use crate::tags::{Tag, TagRef, TagSet, VirtualTag};
use crate::{Connection, Error, Node};

/// Structural changes.
impl Node {
    /// Adds a child node.
    ///
    /// Fails with `InvalidOperation` if this node isn't composite, and with
    /// `DuplicateId` if a child node or connection with the same ID exists.
    /// The tags the new node brings along are checked like any other change,
    /// see [`Node::try_update`].
    pub fn add_node(&mut self, node: Node) -> Result<(), Error> {
        self.try_update(|graph| graph.push_node(node))
    }

    /// Adds a child node without looking at the rest of the document.  The
    /// parser adds nodes before the rest of the document exists.
    pub(crate) fn push_node(&mut self, node: Node) -> Result<(), Error> {
        self.ensure_composite()?;
        self.ensure_free_id(&node.id)?;
        tracing::debug!("Adding node {} to {}.", node.id, self.id);
        self.nodes.push(node);
        Ok(())
    }

    /// Adds a connection between children of this node.
    ///
    /// `source` and `destination` must be children of this node, and the
    /// entry and exit points, if any, children of those.
    pub fn add_connection(&mut self, connection: Connection) -> Result<(), Error> {
        self.add_connection_at(&[], connection)
    }

    /// Adds a connection to the composite at `scope`.
    ///
    /// The endpoints are resolved from that composite outward, so they may be
    /// children of any of its ancestors up to this node.
    pub fn add_connection_at(&mut self, scope: &[&str], connection: Connection) -> Result<(), Error> {
        self.try_update(|graph| {
            let composite = graph.node_at(scope)?;
            composite.ensure_composite()?;
            composite.ensure_free_id(&connection.id)?;
            graph.check_endpoints(scope, &connection)?;

            let composite = graph.node_at_mut(scope)?;
            tracing::debug!("Adding connection {} to {}.", connection.id, composite.id);
            composite.connections.push(connection);
            Ok(())
        })
    }

    /// Adds a connection without resolving its endpoints.  The parser adds
    /// connections before the rest of the document exists.
    pub(crate) fn push_connection(&mut self, connection: Connection) -> Result<(), Error> {
        self.ensure_composite()?;
        self.ensure_free_id(&connection.id)?;
        self.connections.push(connection);
        Ok(())
    }

    /// Adds a virtual tag that belongs to the document rather than to a node
    /// or connection.
    pub(crate) fn insert_document_virtual_tag(&mut self, vtag: VirtualTag) -> Result<(), Error> {
        self.tags.insert_virtual_tag(None, vtag)
    }

    /// Removes a child node.  See [`Node::remove_node_at`].
    pub fn remove_node(&mut self, id: &str, cascade: bool) -> Result<Node, Error> {
        self.remove_node_at(&[id], cascade)
    }

    /// Removes the node at `path` and returns it.
    ///
    /// Fails with `DanglingReference` if a connection outside the removed
    /// node has it (or anything inside it) as an endpoint, entry point or
    /// exit point, or if a virtual tag outside it reads one of its tags.  With
    /// `cascade`, those connections and virtual tags are removed as well.
    ///
    /// Only connections and virtual tags below this node are looked at, so
    /// nodes of a graph are removed through its root.
    pub fn remove_node_at(&mut self, path: &[&str], cascade: bool) -> Result<Node, Error> {
        let Some((last, scope)) = path.split_last() else {
            return Err(Error::invalid_operation(format!(
                "Node {} can't remove itself.",
                self.id
            )));
        };
        let target = self.node_at(path)?;

        let mut doomed = vec![];
        for (connection_scope, composite) in self.scopes() {
            if connection_scope.starts_with(path) {
                continue;
            }
            for connection in &composite.connections {
                let ends = self.endpoints(&connection_scope, connection);
                let touches = [
                    &ends.source,
                    &ends.destination,
                    &ends.exit_point,
                    &ends.entry_point,
                ]
                .into_iter()
                .flatten()
                .any(|end| end.starts_with(path));
                if !touches {
                    continue;
                }
                if !cascade {
                    return Err(Error::dangling_reference(format!(
                        "Node {last} is referenced by connection {}.",
                        connection.id
                    )));
                }
                doomed.push((
                    connection_scope.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                    connection,
                ));
            }
        }

        let mut removed_tags = tag_ids(target.all_tags(true));
        for (_, connection) in &doomed {
            removed_tags.extend(tag_ids(set_entries(&connection.tags)));
        }
        let dependents = self.dependent_virtual_tags(&removed_tags, cascade)?;
        let doomed = doomed
            .into_iter()
            .map(|(connection_scope, connection)| (connection_scope, connection.id.clone()))
            .collect::<Vec<_>>();

        let parent = self.node_at_mut(scope)?;
        let position = parent
            .nodes
            .iter()
            .position(|n| n.id == *last)
            .ok_or_else(|| Error::internal(format!("Node {last} disappeared during removal.")))?;
        let node = parent.nodes.remove(position);
        for (connection_scope, id) in doomed {
            let connection_scope = connection_scope.iter().map(String::as_str).collect::<Vec<_>>();
            tracing::debug!("Cascading removal of {last} to connection {id}.");
            self.node_at_mut(&connection_scope)?
                .connections
                .retain(|c| c.id != id);
        }
        self.purge_tags(&dependents);
        tracing::debug!("Removed node {last}.");
        Ok(node)
    }

    /// Removes a connection of this node.  See
    /// [`Node::remove_connection_at`].
    pub fn remove_connection(&mut self, id: &str, cascade: bool) -> Result<Connection, Error> {
        self.remove_connection_at(&[], id, cascade)
    }

    /// Removes a connection of the composite at `scope` and returns it.
    ///
    /// Fails with `DanglingReference` if a virtual tag elsewhere reads one of
    /// the connection's tags, unless `cascade` is set, in which case those
    /// virtual tags are removed as well.
    pub fn remove_connection_at(
        &mut self,
        scope: &[&str],
        id: &str,
        cascade: bool,
    ) -> Result<Connection, Error> {
        let connection = self.node_at(scope)?.get_connection(id)?;
        let removed_tags = tag_ids(set_entries(&connection.tags));
        let dependents = self.dependent_virtual_tags(&removed_tags, cascade)?;

        let composite = self.node_at_mut(scope)?;
        let position = composite
            .connections
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::internal(format!("Connection {id} disappeared during removal.")))?;
        let connection = composite.connections.remove(position);
        self.purge_tags(&dependents);
        tracing::debug!("Removed connection {id}.");
        Ok(connection)
    }

    /// Rebinds the exit and entry points of a connection of the composite at
    /// `scope`.  The new points must be children of the resolved endpoints.
    pub fn set_connection_points(
        &mut self,
        scope: &[&str],
        id: &str,
        exit_point: Option<&str>,
        entry_point: Option<&str>,
    ) -> Result<(), Error> {
        let mut candidate = self.node_at(scope)?.get_connection(id)?.clone();
        candidate.set_points(exit_point.map(str::to_string), entry_point.map(str::to_string));
        self.check_endpoints(scope, &candidate)?;

        let composite = self.node_at_mut(scope)?;
        if let Some(connection) = composite.connections.iter_mut().find(|c| c.id == id) {
            *connection = candidate;
        }
        Ok(())
    }

    /// Applies `update` to a copy of this graph, and replaces the graph with
    /// the copy if it passes [`Node::validate`].
    ///
    /// Virtual tag attributes are derived again before the copy is committed.
    /// On error the graph is left as it was.
    pub fn try_update<T>(
        &mut self,
        update: impl FnOnce(&mut Node) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut candidate = self.clone();
        let result = update(&mut candidate)?;
        candidate.finalize()?;
        tracing::debug!("Committed update of {}.", self.id);
        *self = candidate;
        Ok(result)
    }

    /// Registers a batch of virtual tags with the node or connection at
    /// `owner`, or with the document when `owner` is empty.
    ///
    /// The batch is validated together with the rest of the graph.  If any of
    /// the virtual tags is invalid, e.g. because the batch forms a cycle, none
    /// of them is registered.
    pub fn add_virtual_tags(
        &mut self,
        owner: &[&str],
        vtags: impl IntoIterator<Item = VirtualTag>,
    ) -> Result<(), Error> {
        self.try_update(|graph| {
            for vtag in vtags {
                if owner.is_empty() {
                    graph.insert_document_virtual_tag(vtag)?;
                } else {
                    insert_virtual_tag(graph.owner_mut(owner)?, vtag)?;
                }
            }
            Ok(())
        })
    }

    /// Adds a tag to the node or connection at `owner`.  An empty path is
    /// this node.
    ///
    /// Fails with `DuplicateId` if any tag or virtual tag of the document
    /// already has the ID.
    pub fn add_tag_at(&mut self, owner: &[&str], tag: Tag) -> Result<(), Error> {
        self.try_update(|graph| insert_tag(graph.owner_mut(owner)?, tag))
    }

    /// Adds a virtual tag to the node or connection at `owner`, or to the
    /// document when `owner` is empty.  See [`Node::add_virtual_tags`].
    pub fn add_virtual_tag_at(&mut self, owner: &[&str], vtag: VirtualTag) -> Result<(), Error> {
        self.add_virtual_tags(owner, [vtag])
    }

    /// Removes a tag of the node or connection at `owner` and returns it.
    ///
    /// Fails with `DanglingReference` if a virtual tag anywhere in the
    /// document reads it.
    pub fn remove_tag_at(&mut self, owner: &[&str], id: &str) -> Result<Tag, Error> {
        self.try_update(|graph| {
            let tag = take_tag(graph.owner_mut(owner)?, id)?;
            graph.dependent_virtual_tags(&HashSet::from([id.to_string()]), false)?;
            Ok(tag)
        })
    }

    /// Removes a virtual tag of the node or connection at `owner`, or of the
    /// document when `owner` is empty, and returns it.
    ///
    /// Fails with `DanglingReference` if another virtual tag anywhere in the
    /// document reads it.
    pub fn remove_virtual_tag_at(&mut self, owner: &[&str], id: &str) -> Result<VirtualTag, Error> {
        self.try_update(|graph| {
            let vtag = take_virtual_tag(graph.owner_mut(owner)?, id)?;
            graph.dependent_virtual_tags(&HashSet::from([id.to_string()]), false)?;
            Ok(vtag)
        })
    }

    pub(super) fn ensure_composite(&self) -> Result<(), Error> {
        if !self.is_composite() {
            return Err(Error::invalid_operation(format!(
                "Node {} of type {} can't hold nodes or connections.",
                self.id, self.node_type
            )));
        }
        Ok(())
    }

    fn ensure_free_id(&self, id: &str) -> Result<(), Error> {
        if registry::is_reserved_key(id) {
            return Err(Error::invalid_operation(format!(
                "`{id}` is a reserved key and can't be used as an ID."
            )));
        }
        if self.nodes.iter().any(|n| n.id == id) || self.connections.iter().any(|c| c.id == id) {
            return Err(Error::duplicate_id(format!(
                "{id} already exists in {}.",
                self.id
            )));
        }
        if self.attributes.get(id).is_some() {
            return Err(Error::duplicate_id(format!(
                "{id} is already an attribute of {}.",
                self.id
            )));
        }
        Ok(())
    }

    /// Returns the IDs of the virtual tags outside `removed` that read a tag
    /// in `removed`, directly or through other virtual tags.  Without
    /// `cascade`, finding one is an error.
    fn dependent_virtual_tags(
        &self,
        removed: &HashSet<String>,
        cascade: bool,
    ) -> Result<HashSet<String>, Error> {
        let vtags = self
            .all_tags(true)
            .into_iter()
            .filter_map(|entry| match entry {
                TagRef::Virtual(vtag) => Some(vtag),
                TagRef::Tag(_) => None,
            })
            .collect::<Vec<_>>();

        let mut dependents = HashSet::new();
        loop {
            let mut changed = false;
            for vtag in &vtags {
                if removed.contains(vtag.id()) || dependents.contains(vtag.id()) {
                    continue;
                }
                let Some(operand) = vtag
                    .operand_ids()
                    .find(|op| removed.contains(*op) || dependents.contains(*op))
                else {
                    continue;
                };
                if !cascade {
                    return Err(Error::dangling_reference(format!(
                        "{operand} is an operand of virtual tag {}.",
                        vtag.id()
                    )));
                }
                tracing::debug!("Cascading removal of {operand} to virtual tag {}.", vtag.id());
                dependents.insert(vtag.id().to_string());
                changed = true;
            }
            if !changed {
                return Ok(dependents);
            }
        }
    }

    /// Removes every tag and virtual tag with an ID in `ids`, at any depth.
    fn purge_tags(&mut self, ids: &HashSet<String>) {
        if ids.is_empty() {
            return;
        }
        self.for_each_tag_set_mut(&mut |set| set.purge(ids));
    }

    /// Calls `f` with the tags of this node, of every node below it and of
    /// every connection below it.
    pub(crate) fn for_each_tag_set_mut(&mut self, f: &mut impl FnMut(&mut TagSet)) {
        f(&mut self.tags);
        for connection in &mut self.connections {
            f(&mut connection.tags);
        }
        for node in &mut self.nodes {
            node.for_each_tag_set_mut(f);
        }
    }
}

fn set_entries(set: &TagSet) -> Vec<TagRef<'_>> {
    set.tags()
        .iter()
        .map(TagRef::Tag)
        .chain(set.virtual_tags().iter().map(TagRef::Virtual))
        .collect()
}

fn tag_ids(entries: Vec<TagRef<'_>>) -> HashSet<String> {
    entries.iter().map(|e| e.id().to_string()).collect()
}
