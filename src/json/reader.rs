// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Reads a JSON document into a [`Node`] hierarchy.

use std::cell::RefCell;
use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::attributes::Attributes;
use crate::graph_traits::{insert_tag, insert_virtual_tag};
use crate::registry::{self, CONNECTION_KEYS, NODE_KEYS};
use crate::tags::{Tag, VirtualTag};
use crate::{Connection, ConnectionType, ContentsType, Error, Node, NodeType, ParserConfig};

use super::records::{TagRecord, VirtualTagRecord};

const DOCUMENT_KEYS: &[&str] = &["nodes", "connections", "tags", "virtual_tags"];

/// An object that child entries are looked up in.  Entries missing from a
/// composite's own object are looked up in the objects of its ancestors, so
/// both nested and flat documents can be read.
struct Scope<'v, 'p> {
    id: String,
    entries: &'v Map<String, Value>,
    used: RefCell<HashSet<String>>,
    parent: Option<&'p Scope<'v, 'p>>,
}

impl<'v, 'p> Scope<'v, 'p> {
    fn new(
        id: impl Into<String>,
        entries: &'v Map<String, Value>,
        parent: Option<&'p Scope<'v, 'p>>,
    ) -> Self {
        Self {
            id: id.into(),
            entries,
            used: RefCell::new(HashSet::new()),
            parent,
        }
    }

    fn lookup(&self, id: &str) -> Option<&'v Value> {
        match self.entries.get_key_value(id) {
            Some((key, value)) => {
                self.used.borrow_mut().insert(key.clone());
                Some(value)
            }
            None => self.parent.and_then(|parent| parent.lookup(id)),
        }
    }

    fn is_used(&self, key: &str) -> bool {
        self.used.borrow().contains(key)
    }
}

pub(super) struct Reader<'c> {
    config: &'c ParserConfig,
}

impl<'c> Reader<'c> {
    pub(super) fn new(config: &'c ParserConfig) -> Self {
        Self { config }
    }

    /// Reads a whole document and validates it.
    pub(super) fn read_document(&self, value: &Value) -> Result<Node, Error> {
        let mut root = self.read_entities(value)?;
        root.finalize()?;
        tracing::debug!(
            "Read document {} with {} nodes and {} connections.",
            root.id(),
            root.descendants().count(),
            root.all_connections(true).len()
        );
        Ok(root)
    }

    /// Reads the nodes, connections and tags of a document without checking
    /// that its references resolve.
    pub(super) fn read_entities(&self, value: &Value) -> Result<Node, Error> {
        let Value::Object(doc) = value else {
            return Err(Error::malformed_document(
                "A facility document must be a JSON object.",
            ));
        };
        for key in ["nodes", "connections"] {
            if !doc.contains_key(key) {
                return Err(Error::malformed_document(format!(
                    "Document has no `{key}` list."
                )));
            }
        }

        let mut root = Node::network(self.config.root_id.as_str());
        let scope = Scope::new(self.config.root_id.as_str(), doc, None);
        self.read_children(&mut root, &scope)?;

        for tag in self.read_tags(doc.get("tags"), root.id(), None)? {
            insert_tag(&mut root, tag)?;
        }
        for (vtag, parent_id) in self.read_virtual_tags(doc.get("virtual_tags"), root.id())? {
            attach_document_virtual_tag(&mut root, vtag, parent_id)?;
        }

        for key in doc.keys() {
            if !DOCUMENT_KEYS.contains(&key.as_str()) && !scope.is_used(key) {
                tracing::warn!("Ignoring top-level entry {key}, which nothing refers to.");
            }
        }
        Ok(root)
    }

    /// Reads the nodes and connections listed in a composite's entry.
    fn read_children(&self, composite: &mut Node, scope: &Scope<'_, '_>) -> Result<(), Error> {
        for id in id_list(scope.entries, "nodes", &scope.id)? {
            let node = self.read_node(id, scope)?;
            composite.push_node(node)?;
        }
        for id in id_list(scope.entries, "connections", &scope.id)? {
            let connection = self.read_connection(id, scope)?;
            composite.push_connection(connection)?;
        }
        Ok(())
    }

    fn read_node(&self, id: &str, scope: &Scope<'_, '_>) -> Result<Node, Error> {
        let entry = entry(id, "node", scope)?;
        let has_children = entry.contains_key("nodes") || entry.contains_key("connections");
        let node_type = match entry.get("type") {
            Some(Value::String(name)) => name.parse::<NodeType>()?,
            Some(other) => {
                return Err(Error::malformed_document(format!(
                    "Type of node {id} must be a string, not {other}."
                )))
            }
            None if has_children => NodeType::Network,
            None => return Err(Error::unknown_type(format!("Node {id} has no type."))),
        };
        if has_children && !node_type.is_composite() {
            return Err(Error::malformed_document(format!(
                "Node {id} of type {node_type} can't contain nodes or connections."
            )));
        }

        let (input, output) = match (
            entry.get("input_contents"),
            entry.get("output_contents"),
            entry.get("contents"),
        ) {
            (None, None, None) => (vec![], vec![]),
            (None, None, Some(contents)) => {
                let contents = contents_list(contents, id)?;
                (contents.clone(), contents)
            }
            (input, output, _) => (
                input.map(|c| contents_list(c, id)).transpose()?.unwrap_or_default(),
                output.map(|c| contents_list(c, id)).transpose()?.unwrap_or_default(),
            ),
        };

        let mut node = Node::new(id, node_type, input, output);
        let attributes = if node.is_composite() {
            let child_scope = Scope::new(id, entry, Some(scope));
            self.read_children(&mut node, &child_scope)?;
            collect_attributes(entry, NODE_KEYS, Some(&child_scope))
        } else {
            collect_attributes(entry, NODE_KEYS, None)
        };
        node.set_attributes(attributes)?;

        let owner_contents = match (node.input_contents(), node.output_contents()) {
            ([input], [output]) if input == output => Some(*input),
            _ => None,
        };
        for tag in self.read_tags(entry.get("tags"), id, owner_contents)? {
            insert_tag(&mut node, tag)?;
        }
        for (vtag, _) in self.read_virtual_tags(entry.get("virtual_tags"), id)? {
            insert_virtual_tag(&mut node, vtag)?;
        }
        tracing::trace!("Read node {id} of type {node_type}.");
        Ok(node)
    }

    fn read_connection(&self, id: &str, scope: &Scope<'_, '_>) -> Result<Connection, Error> {
        let entry = entry(id, "connection", scope)?;
        let connection_type = match entry.get("type") {
            Some(Value::String(name)) => name.parse::<ConnectionType>()?,
            Some(other) => {
                return Err(Error::malformed_document(format!(
                    "Type of connection {id} must be a string, not {other}."
                )))
            }
            None => return Err(Error::unknown_type(format!("Connection {id} has no type."))),
        };
        let contents = match entry.get("contents") {
            Some(Value::String(name)) => name.parse::<ContentsType>()?,
            Some(Value::Array(list)) if list.len() == 1 => match &list[0] {
                Value::String(name) => name.parse::<ContentsType>()?,
                other => {
                    return Err(Error::malformed_document(format!(
                        "Contents of connection {id} must be a string, not {other}."
                    )))
                }
            },
            Some(other) => {
                return Err(Error::malformed_document(format!(
                    "Contents of connection {id} must be a single contents type, not {other}."
                )))
            }
            None => connection_type.default_contents().ok_or_else(|| {
                Error::malformed_document(format!("Connection {id} has no contents."))
            })?,
        };
        let bidirectional = match entry.get("bidirectional") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(bidirectional)) => *bidirectional,
            Some(other) => {
                return Err(Error::malformed_document(format!(
                    "`bidirectional` of connection {id} must be a boolean, not {other}."
                )))
            }
        };

        let mut connection = Connection::new(
            id,
            connection_type,
            required_str(entry, "source", id)?,
            required_str(entry, "destination", id)?,
            contents,
        )
        .with_bidirectional(bidirectional);
        connection.set_points(
            optional_str(entry, "exit_point", id)?.map(str::to_string),
            optional_str(entry, "entry_point", id)?.map(str::to_string),
        );
        connection.set_attributes(collect_attributes(entry, CONNECTION_KEYS, None))?;

        for tag in self.read_tags(entry.get("tags"), id, Some(contents))? {
            insert_tag(&mut connection, tag)?;
        }
        for (vtag, _) in self.read_virtual_tags(entry.get("virtual_tags"), id)? {
            insert_virtual_tag(&mut connection, vtag)?;
        }
        tracing::trace!(
            "Read connection {id} from {} to {}.",
            connection.source(),
            connection.destination()
        );
        Ok(connection)
    }

    fn read_tags(
        &self,
        value: Option<&Value>,
        owner: &str,
        owner_contents: Option<ContentsType>,
    ) -> Result<Vec<Tag>, Error> {
        let Some(value) = value else {
            return Ok(vec![]);
        };
        let Value::Object(tags) = value else {
            return Err(Error::malformed_document(format!(
                "`tags` of {owner} must be an object."
            )));
        };
        tags.iter()
            .map(|(id, value)| {
                let record: TagRecord = serde_json::from_value(value.clone()).map_err(|err| {
                    Error::malformed_document(format!("Invalid tag {id} of {owner}: {err}"))
                })?;
                record.into_tag(id, owner_contents, self.config)
            })
            .collect()
    }

    fn read_virtual_tags(
        &self,
        value: Option<&Value>,
        owner: &str,
    ) -> Result<Vec<(VirtualTag, Option<String>)>, Error> {
        let Some(value) = value else {
            return Ok(vec![]);
        };
        let Value::Object(vtags) = value else {
            return Err(Error::malformed_document(format!(
                "`virtual_tags` of {owner} must be an object."
            )));
        };
        vtags
            .iter()
            .map(|(id, value)| {
                let record: VirtualTagRecord =
                    serde_json::from_value(value.clone()).map_err(|err| {
                        Error::malformed_document(format!(
                            "Invalid virtual tag {id} of {owner}: {err}"
                        ))
                    })?;
                record.into_virtual_tag(id)
            })
            .collect()
    }
}

/// Adds a top-level virtual tag to the document, the root network, or the
/// node or connection its `parent_id` names.
fn attach_document_virtual_tag(
    root: &mut Node,
    vtag: VirtualTag,
    parent_id: Option<String>,
) -> Result<(), Error> {
    let Some(parent_id) = parent_id else {
        return root.insert_document_virtual_tag(vtag);
    };
    if parent_id == root.id() {
        return insert_virtual_tag(root, vtag);
    }

    let path = root
        .scopes()
        .find_map(|(scope, composite)| {
            let owns = composite.nodes().iter().any(|n| n.id() == parent_id)
                || composite.connections().iter().any(|c| c.id() == parent_id);
            owns.then(|| {
                let mut path: Vec<String> = scope.iter().map(|s| s.to_string()).collect();
                path.push(parent_id.clone());
                path
            })
        })
        .ok_or_else(|| {
            Error::malformed_document(format!(
                "Virtual tag {} names unknown parent {parent_id}.",
                vtag.id()
            ))
        })?;
    let path: Vec<&str> = path.iter().map(String::as_str).collect();
    insert_virtual_tag(root.owner_mut(&path)?, vtag)
}

/// Finds the entry of a listed child.
fn entry<'v>(
    id: &str,
    kind: &str,
    scope: &Scope<'v, '_>,
) -> Result<&'v Map<String, Value>, Error> {
    if registry::is_reserved_key(id) {
        return Err(Error::malformed_document(format!(
            "`{id}` is a reserved key and can't be used as an ID."
        )));
    }
    match scope.lookup(id) {
        Some(Value::Object(entry)) => Ok(entry),
        Some(other) => Err(Error::malformed_document(format!(
            "Entry of {kind} {id} must be an object, not {other}."
        ))),
        None => Err(Error::malformed_document(format!(
            "Missing entry for {kind} {id} listed in {}.",
            scope.id
        ))),
    }
}

fn id_list<'v>(
    entries: &'v Map<String, Value>,
    key: &str,
    owner: &str,
) -> Result<Vec<&'v str>, Error> {
    match entries.get(key) {
        None => Ok(vec![]),
        Some(Value::Array(ids)) => ids
            .iter()
            .map(|id| {
                id.as_str().ok_or_else(|| {
                    Error::malformed_document(format!(
                        "`{key}` of {owner} must be a list of IDs, but has {id}."
                    ))
                })
            })
            .collect(),
        Some(other) => Err(Error::malformed_document(format!(
            "`{key}` of {owner} must be a list of IDs, not {other}."
        ))),
    }
}

fn contents_list(value: &Value, id: &str) -> Result<Vec<ContentsType>, Error> {
    match value {
        Value::String(name) => Ok(vec![name.parse()?]),
        Value::Array(names) => names
            .iter()
            .map(|name| match name {
                Value::String(name) => name.parse(),
                other => Err(Error::malformed_document(format!(
                    "Contents of node {id} must be strings, not {other}."
                ))),
            })
            .collect(),
        other => Err(Error::malformed_document(format!(
            "Contents of node {id} must be a list, not {other}."
        ))),
    }
}

fn required_str<'v>(entry: &'v Map<String, Value>, key: &str, id: &str) -> Result<&'v str, Error> {
    optional_str(entry, key, id)?.ok_or_else(|| {
        Error::malformed_document(format!("Connection {id} has no {key}."))
    })
}

fn optional_str<'v>(
    entry: &'v Map<String, Value>,
    key: &str,
    id: &str,
) -> Result<Option<&'v str>, Error> {
    match entry.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(other) => Err(Error::malformed_document(format!(
            "`{key}` of {id} must be a string, not {other}."
        ))),
    }
}

/// Collects the entries of an object that aren't core keys or child entries.
fn collect_attributes(
    entry: &Map<String, Value>,
    core: &[&str],
    children: Option<&Scope<'_, '_>>,
) -> Attributes {
    entry
        .iter()
        .filter(|(key, _)| !core.contains(&key.as_str()))
        .filter(|(key, _)| !children.is_some_and(|scope| scope.is_used(key.as_str())))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
