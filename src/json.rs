// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Reading and writing facility documents.
//!
//! A document is a JSON object with top-level `nodes` and `connections` lists
//! of IDs, each of which has an entry of the same name.  The entry of a
//! composite node lists its own children the same way.  A child's entry is
//! looked up in its composite's object first and then in the objects of the
//! composite's ancestors, so documents may be nested or flat.  Documents are
//! always written nested.

mod reader;
mod records;
mod writer;

use serde_json::Value;

use crate::{Error, Node, ParserConfig, SerializerConfig};

use reader::Reader;

/// Parses a facility document with the default [`ParserConfig`].
pub fn parse(text: &str) -> Result<Node, Error> {
    parse_with_config(text, &ParserConfig::default())
}

/// Parses a facility document.
///
/// The returned root is a `Network` node named by
/// [`root_id`][ParserConfig::root_id] that holds the top-level nodes and
/// connections.  The whole document is validated before it is returned.
pub fn parse_with_config(text: &str, config: &ParserConfig) -> Result<Node, Error> {
    let value: Value = serde_json::from_str(text)?;
    from_value(&value, config)
}

/// Reads a facility document that has already been parsed as JSON.
pub fn from_value(value: &Value, config: &ParserConfig) -> Result<Node, Error> {
    Reader::new(config).read_document(value)
}

/// Reads a partial document and merges its top-level nodes and connections
/// into `root`, replacing those with the same IDs.  See [`Node::merge`].
///
/// The partial document is only checked together with `root`, so its
/// connections may reach nodes that only `root` has.  On error `root` is
/// left as it was.
pub fn merge_document(root: &mut Node, text: &str, config: &ParserConfig) -> Result<(), Error> {
    let value: Value = serde_json::from_str(text)?;
    let other = Reader::new(config).read_entities(&value)?;
    tracing::debug!("Merging document into {}.", root.id());
    root.merge(other)
}

/// Writes a facility document.  Parsing the result gives back an equal
/// [`Node`].
pub fn serialize(root: &Node, config: &SerializerConfig) -> Result<String, Error> {
    let value = to_value(root)?;
    let text = if config.pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    text.map_err(|err| Error::internal(format!("Can't write document {}: {err}", root.id())))
}

/// Writes a facility document as a JSON value.
pub fn to_value(root: &Node) -> Result<Value, Error> {
    writer::write_document(root)
}
