// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Methods for creating [`Node`]s and [`Connection`]s, and for reading their
//! own fields.

use serde_json::Value;

use crate::attributes::Attributes;
use crate::quantity::{DesignRange, Quantity};
use crate::registry;
use crate::tags::TagSet;
use crate::{ConnectionType, ContentsType, Error, NodeType};

use super::{Connection, Node};

/// `Node` instantiation.
impl Node {
    /// Creates a node without children, tags or attributes.
    pub fn new(
        id: impl Into<String>,
        node_type: NodeType,
        input_contents: Vec<ContentsType>,
        output_contents: Vec<ContentsType>,
    ) -> Self {
        Self {
            id: id.into(),
            node_type,
            input_contents,
            output_contents,
            attributes: Attributes::new(),
            tags: TagSet::default(),
            nodes: vec![],
            connections: vec![],
        }
    }

    /// Creates a node whose input and output contents are the same.
    pub fn with_contents(
        id: impl Into<String>,
        node_type: NodeType,
        contents: Vec<ContentsType>,
    ) -> Self {
        Self::new(id, node_type, contents.clone(), contents)
    }

    /// Creates an empty `Network` node.
    pub fn network(id: impl Into<String>) -> Self {
        Self::new(id, NodeType::Network, vec![], vec![])
    }

    /// Adds an attribute, checking it against the known fields of the node
    /// type.
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Result<Self, Error> {
        self.set_attribute(key, value)?;
        Ok(self)
    }

    /// Sets an attribute, checking it against the known fields of the node
    /// type.  Returns the previous value.
    pub fn set_attribute(
        &mut self,
        key: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, Error> {
        let key = key.into();
        if registry::NODE_KEYS.contains(&key.as_str()) {
            return Err(Error::invalid_operation(format!(
                "`{key}` is a reserved key and can't be an attribute of node {}.",
                self.id
            )));
        }
        if self.child_exists(&key) {
            return Err(Error::duplicate_id(format!(
                "Attribute `{key}` of node {} has the same name as one of its children.",
                self.id
            )));
        }
        let mut attributes = self.attributes.clone();
        let previous = attributes.insert(key, value);
        registry::check_node_attributes(&self.id, self.node_type, &attributes)?;
        self.attributes = attributes;
        Ok(previous)
    }

    pub(crate) fn set_attributes(&mut self, attributes: Attributes) -> Result<(), Error> {
        registry::check_node_attributes(&self.id, self.node_type, &attributes)?;
        self.attributes = attributes;
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn input_contents(&self) -> &[ContentsType] {
        &self.input_contents
    }

    pub fn output_contents(&self) -> &[ContentsType] {
        &self.output_contents
    }

    /// Returns true if the node can hold child nodes and connections.
    pub fn is_composite(&self) -> bool {
        self.node_type.is_composite()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the number of identical parallel units the node stands for.
    /// Defaults to 1.
    pub fn num_units(&self) -> u64 {
        self.attributes
            .get("num_units")
            .and_then(Value::as_u64)
            .unwrap_or(1)
    }

    /// Returns the design flow range of the node, if known.
    pub fn flow_range(&self) -> Result<Option<DesignRange>, Error> {
        match self.attributes.range("flowrate")? {
            Some(range) => Ok(Some(range)),
            None => self.attributes.range("flow_rate"),
        }
    }

    /// Returns the elevation of the node.  The legacy `elevation (meters)`
    /// field is read when `elevation` is missing.
    pub fn elevation(&self) -> Result<Option<Quantity>, Error> {
        self.attributes
            .quantity("elevation", Some(("elevation (meters)", "m")))
    }

    /// Returns the volume of the node.  The legacy `volume (cubic meters)`
    /// field is read when `volume` is missing.
    pub fn volume(&self) -> Result<Option<Quantity>, Error> {
        self.attributes
            .quantity("volume", Some(("volume (cubic meters)", "m^3")))
    }

    fn child_exists(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id) || self.connections.iter().any(|c| c.id == id)
    }
}

/// `Connection` instantiation.
impl Connection {
    /// Creates a one-way connection without entry or exit points.
    pub fn new(
        id: impl Into<String>,
        connection_type: ConnectionType,
        source: impl Into<String>,
        destination: impl Into<String>,
        contents: ContentsType,
    ) -> Self {
        Self {
            id: id.into(),
            connection_type,
            source: source.into(),
            destination: destination.into(),
            contents,
            bidirectional: false,
            exit_point: None,
            entry_point: None,
            attributes: Attributes::new(),
            tags: TagSet::default(),
        }
    }

    /// Allows flow in both directions.
    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// Sets the child of the (composite) source that the flow leaves from.
    pub fn with_exit_point(mut self, exit_point: impl Into<String>) -> Self {
        self.exit_point = Some(exit_point.into());
        self
    }

    /// Sets the child of the (composite) destination that the flow enters.
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }

    /// Adds an attribute, checking it against the known fields of the
    /// connection type.
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Result<Self, Error> {
        self.set_attribute(key, value)?;
        Ok(self)
    }

    /// Sets an attribute, checking it against the known fields of the
    /// connection type.  Returns the previous value.
    pub fn set_attribute(
        &mut self,
        key: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, Error> {
        let key = key.into();
        if registry::CONNECTION_KEYS.contains(&key.as_str()) {
            return Err(Error::invalid_operation(format!(
                "`{key}` is a reserved key and can't be an attribute of connection {}.",
                self.id
            )));
        }
        let mut attributes = self.attributes.clone();
        let previous = attributes.insert(key, value);
        registry::check_connection_attributes(&self.id, self.connection_type, &attributes)?;
        self.attributes = attributes;
        Ok(previous)
    }

    pub(crate) fn set_attributes(&mut self, attributes: Attributes) -> Result<(), Error> {
        registry::check_connection_attributes(&self.id, self.connection_type, &attributes)?;
        self.attributes = attributes;
        Ok(())
    }

    pub(crate) fn set_points(&mut self, exit_point: Option<String>, entry_point: Option<String>) {
        self.exit_point = exit_point;
        self.entry_point = entry_point;
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn connection_type(&self) -> ConnectionType {
        self.connection_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn contents(&self) -> ContentsType {
        self.contents
    }

    pub fn is_bidirectional(&self) -> bool {
        self.bidirectional
    }

    pub fn exit_point(&self) -> Option<&str> {
        self.exit_point.as_deref()
    }

    pub fn entry_point(&self) -> Option<&str> {
        self.entry_point.as_deref()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the design flow range of the connection, if known.
    pub fn flow_range(&self) -> Result<Option<DesignRange>, Error> {
        match self.attributes.range("flowrate")? {
            Some(range) => Ok(Some(range)),
            None => self.attributes.range("flow_rate"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::quantity::Unit;

    #[test]
    fn test_node() -> Result<(), Error> {
        let tank = Node::with_contents("Tank1", NodeType::Tank, vec![ContentsType::Biogas])
            .with_attribute("num_units", json!(2))?
            .with_attribute("volume (cubic meters)", json!(1500.0))?
            .with_attribute("elevation", json!({"value": 12.0, "units": "ft"}))?;

        assert_eq!(tank.id(), "Tank1");
        assert_eq!(tank.input_contents(), tank.output_contents());
        assert!(!tank.is_composite());
        assert_eq!(tank.num_units(), 2);
        assert_eq!(
            tank.volume()?,
            Some(Quantity::new(Some(1500.0), Unit::parse("m^3")?))
        );
        assert_eq!(
            tank.elevation()?,
            Some(Quantity::new(Some(12.0), Unit::parse("ft")?))
        );
        assert_eq!(tank.flow_range()?, None);

        assert!(Node::network("Plant")
            .with_attribute("num_units", json!("two"))
            .is_err_and(|e| e
                == Error::malformed_document(
                    "Field `num_units` of node Plant must be a non-negative integer."
                )));
        Ok(())
    }

    #[test]
    fn test_connection() -> Result<(), Error> {
        let pipe = Connection::new(
            "GasPipe",
            ConnectionType::Pipe,
            "Digester",
            "Cogen",
            ContentsType::Biogas,
        )
        .with_exit_point("Digester2")
        .with_attribute(
            "flowrate",
            json!({"min": 10, "max": 50, "avg": null, "units": "SCFM"}),
        )?;

        assert!(!pipe.is_bidirectional());
        assert_eq!(pipe.exit_point(), Some("Digester2"));
        assert_eq!(pipe.entry_point(), None);

        let range = pipe.flow_range()?.unwrap_or_default();
        assert_eq!(range.max.value(), Some(50.0));
        assert!(range.design.is_unknown());
        Ok(())
    }
}
