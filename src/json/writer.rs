// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Writes a [`Node`] hierarchy as a nested JSON document.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{ContentsType, Connection, Error, Node, TagOwner};

use super::records::{TagRecord, VirtualTagRecord};

/// Writes the document rooted at `root`.
///
/// Every composite's children are written inside the composite's own object.
/// The root's tags and virtual tags go to the top-level `tags` and
/// `virtual_tags` objects, and virtual tags there carry a `parent_id` when
/// they belong to the root network itself.
pub(super) fn write_document(root: &Node) -> Result<Value, Error> {
    let mut doc = Map::new();
    doc.insert("nodes".into(), id_list(root.nodes().iter().map(Node::id)));
    doc.insert(
        "connections".into(),
        id_list(root.connections().iter().map(Connection::id)),
    );
    if !root.virtual_tags().is_empty() {
        let mut vtags = Map::new();
        for vtag in root.virtual_tags() {
            vtags.insert(
                vtag.id().to_string(),
                to_value(vtag.id(), VirtualTagRecord::from_virtual_tag(vtag, true))?,
            );
        }
        doc.insert("virtual_tags".into(), Value::Object(vtags));
    }
    if !root.tags().is_empty() {
        doc.insert("tags".into(), write_tags(root)?);
    }
    write_children(root, &mut doc)?;

    tracing::debug!("Wrote document {} with {} top-level entries.", root.id(), doc.len());
    Ok(Value::Object(doc))
}

fn write_children(composite: &Node, map: &mut Map<String, Value>) -> Result<(), Error> {
    for node in composite.nodes() {
        map.insert(node.id().to_string(), write_node(node)?);
    }
    for connection in composite.connections() {
        map.insert(connection.id().to_string(), write_connection(connection)?);
    }
    Ok(())
}

fn write_node(node: &Node) -> Result<Value, Error> {
    let mut map = Map::new();
    map.insert("type".into(), node.node_type().to_string().into());
    if node.input_contents() == node.output_contents() {
        if !node.input_contents().is_empty() {
            map.insert("contents".into(), contents_list(node.input_contents()));
        }
    } else {
        map.insert("input_contents".into(), contents_list(node.input_contents()));
        map.insert("output_contents".into(), contents_list(node.output_contents()));
    }
    for (key, value) in node.attributes().iter() {
        map.insert(key.clone(), value.clone());
    }
    if node.is_composite() {
        map.insert("nodes".into(), id_list(node.nodes().iter().map(Node::id)));
        map.insert(
            "connections".into(),
            id_list(node.connections().iter().map(Connection::id)),
        );
        write_children(node, &mut map)?;
    }
    write_tag_sets(node, &mut map)?;
    Ok(Value::Object(map))
}

fn write_connection(connection: &Connection) -> Result<Value, Error> {
    let mut map = Map::new();
    map.insert("type".into(), connection.connection_type().to_string().into());
    map.insert("source".into(), connection.source().into());
    map.insert("destination".into(), connection.destination().into());
    map.insert("contents".into(), connection.contents().to_string().into());
    if connection.is_bidirectional() {
        map.insert("bidirectional".into(), true.into());
    }
    if let Some(exit_point) = connection.exit_point() {
        map.insert("exit_point".into(), exit_point.into());
    }
    if let Some(entry_point) = connection.entry_point() {
        map.insert("entry_point".into(), entry_point.into());
    }
    for (key, value) in connection.attributes().iter() {
        map.insert(key.clone(), value.clone());
    }
    write_tag_sets(connection, &mut map)?;
    Ok(Value::Object(map))
}

fn write_tag_sets(owner: &dyn TagOwner, map: &mut Map<String, Value>) -> Result<(), Error> {
    if !owner.tags().is_empty() {
        map.insert("tags".into(), write_tags(owner)?);
    }
    if !owner.virtual_tags().is_empty() {
        let mut vtags = Map::new();
        for vtag in owner.virtual_tags() {
            vtags.insert(
                vtag.id().to_string(),
                to_value(vtag.id(), VirtualTagRecord::from_virtual_tag(vtag, false))?,
            );
        }
        map.insert("virtual_tags".into(), Value::Object(vtags));
    }
    Ok(())
}

fn write_tags(owner: &dyn TagOwner) -> Result<Value, Error> {
    let mut tags = Map::new();
    for tag in owner.tags() {
        tags.insert(tag.id().to_string(), to_value(tag.id(), TagRecord::from_tag(tag))?);
    }
    Ok(Value::Object(tags))
}

fn to_value(id: &str, record: impl Serialize) -> Result<Value, Error> {
    serde_json::to_value(record)
        .map_err(|err| Error::internal(format!("Can't write tag {id}: {err}")))
}

fn id_list<'a>(ids: impl Iterator<Item = &'a str>) -> Value {
    Value::Array(ids.map(Value::from).collect())
}

fn contents_list(contents: &[ContentsType]) -> Value {
    Value::Array(contents.iter().map(|c| Value::from(c.as_str())).collect())
}
