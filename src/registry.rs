// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! The attribute fields each node and connection type is known to carry, and
//! the JSON shape expected for each of them.
//!
//! Attributes are passed through untouched, but a known field with the wrong
//! shape makes a document malformed.

use serde_json::Value;

use crate::{ConnectionType, Error, NodeType};

use crate::attributes::Attributes;

/// Keys of a node entry that aren't attributes.
pub(crate) const NODE_KEYS: &[&str] = &[
    "type",
    "contents",
    "input_contents",
    "output_contents",
    "nodes",
    "connections",
    "tags",
    "virtual_tags",
];

/// Keys of a connection entry that aren't attributes.
pub(crate) const CONNECTION_KEYS: &[&str] = &[
    "type",
    "source",
    "destination",
    "contents",
    "bidirectional",
    "exit_point",
    "entry_point",
    "tags",
    "virtual_tags",
];

/// Returns whether `key` is a field of node or connection entries.  Child
/// entries share their composite's object with these fields, so such a key
/// can't be used as a node or connection ID.
pub(crate) fn is_reserved_key(key: &str) -> bool {
    NODE_KEYS.contains(&key) || CONNECTION_KEYS.contains(&key)
}

/// The JSON shape of an attribute field.  `null` is accepted for every shape
/// and means the value is unknown.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum FieldShape {
    /// A non-negative integer.
    Count,
    Number,
    Flag,
    Text,
    TextList,
    /// `{"value": <number>, "units": <string>}`
    Quantity,
    /// `{"min": .., "max": .., "design": .., "units": ..}`, where the legacy
    /// `avg` key may stand in for `design`.
    Range,
    /// Any object.
    Mapping,
}

impl FieldShape {
    pub(crate) fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            FieldShape::Count => value.is_u64(),
            FieldShape::Number => value.is_number(),
            FieldShape::Flag => value.is_boolean(),
            FieldShape::Text => value.is_string(),
            FieldShape::TextList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            FieldShape::Quantity => value.as_object().is_some_and(|map| {
                map.iter().all(|(key, v)| match key.as_str() {
                    "value" => v.is_null() || v.is_number(),
                    "units" => v.is_null() || v.is_string(),
                    _ => false,
                })
            }),
            FieldShape::Range => value.as_object().is_some_and(|map| {
                map.iter().all(|(key, v)| match key.as_str() {
                    "min" | "max" | "design" | "avg" => v.is_null() || v.is_number(),
                    "units" => v.is_null() || v.is_string(),
                    _ => false,
                })
            }),
            FieldShape::Mapping => value.is_object(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FieldShape::Count => "a non-negative integer",
            FieldShape::Number => "a number",
            FieldShape::Flag => "a boolean",
            FieldShape::Text => "a string",
            FieldShape::TextList => "a list of strings",
            FieldShape::Quantity => "an object with `value` and `units`",
            FieldShape::Range => "an object with `min`, `max`, `design` and `units`",
            FieldShape::Mapping => "an object",
        }
    }
}

const COMMON_NODE_FIELDS: &[(&str, FieldShape)] = &[
    ("num_units", FieldShape::Count),
    ("elevation", FieldShape::Quantity),
    ("elevation (meters)", FieldShape::Number),
    ("volume", FieldShape::Quantity),
    ("volume (cubic meters)", FieldShape::Number),
    ("flowrate", FieldShape::Range),
    ("flow_rate", FieldShape::Range),
];

fn node_type_fields(node_type: NodeType) -> &'static [(&'static str, FieldShape)] {
    match node_type {
        NodeType::Pump => &[
            ("pump_type", FieldShape::Text),
            ("power_rating", FieldShape::Quantity),
            ("horsepower", FieldShape::Number),
        ],
        NodeType::Battery => &[
            ("energy_capacity", FieldShape::Quantity),
            ("charge_rate", FieldShape::Quantity),
            ("discharge_rate", FieldShape::Quantity),
            ("rte", FieldShape::Number),
            ("leakage", FieldShape::Quantity),
        ],
        NodeType::Digestion => &[("digester_type", FieldShape::Text)],
        NodeType::Cogeneration | NodeType::Boiler => &[
            ("generation_capacity", FieldShape::Range),
            ("gen_capacity", FieldShape::Range),
        ],
        NodeType::Clarification | NodeType::Thickening => {
            &[("settling_time", FieldShape::Quantity)]
        }
        NodeType::Filtration | NodeType::RoMembrane => &[
            ("settling_time", FieldShape::Quantity),
            ("dosing_rate", FieldShape::Mapping),
            ("area", FieldShape::Quantity),
            ("permeability", FieldShape::Quantity),
            ("selectivity", FieldShape::Quantity),
        ],
        NodeType::Chlorination
        | NodeType::Disinfection
        | NodeType::Reactor
        | NodeType::StaticMixer => &[
            ("residence_time", FieldShape::Quantity),
            ("dosing_rate", FieldShape::Mapping),
            ("pH", FieldShape::Number),
        ],
        NodeType::UvSystem => &[
            ("residence_time", FieldShape::Quantity),
            ("area", FieldShape::Quantity),
            ("intensity", FieldShape::Quantity),
        ],
        NodeType::Joint | NodeType::Reducer | NodeType::Splitter => &[
            ("inflow", FieldShape::TextList),
            ("outflow", FieldShape::TextList),
        ],
        NodeType::Network
        | NodeType::Facility
        | NodeType::ModularUnit
        | NodeType::Tank
        | NodeType::Reservoir
        | NodeType::Screening
        | NodeType::Conditioning
        | NodeType::Aeration
        | NodeType::Flaring => &[],
    }
}

fn connection_type_fields(connection_type: ConnectionType) -> &'static [(&'static str, FieldShape)] {
    match connection_type {
        ConnectionType::Pipe => &[
            ("flowrate", FieldShape::Range),
            ("flow_rate", FieldShape::Range),
            ("pressure", FieldShape::Range),
            ("diameter", FieldShape::Quantity),
            ("friction_coeff", FieldShape::Number),
            ("heating_values", FieldShape::Mapping),
        ],
        ConnectionType::Wire | ConnectionType::Wireless => &[],
        ConnectionType::Delivery => &[("flowrate", FieldShape::Range)],
    }
}

/// Returns the expected shape of a known attribute field of the given node
/// type.
pub(crate) fn node_field_shape(node_type: NodeType, field: &str) -> Option<FieldShape> {
    COMMON_NODE_FIELDS
        .iter()
        .chain(node_type_fields(node_type))
        .find(|(name, _)| *name == field)
        .map(|(_, shape)| *shape)
}

/// Returns the expected shape of a known attribute field of the given
/// connection type.
pub(crate) fn connection_field_shape(
    connection_type: ConnectionType,
    field: &str,
) -> Option<FieldShape> {
    connection_type_fields(connection_type)
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, shape)| *shape)
}

fn check_fields(
    owner: &str,
    attributes: &Attributes,
    shape_of: impl Fn(&str) -> Option<FieldShape>,
) -> Result<(), Error> {
    for (field, value) in attributes.iter() {
        if let Some(shape) = shape_of(field) {
            if !shape.accepts(value) {
                return Err(Error::malformed_document(format!(
                    "Field `{field}` of {owner} must be {}.",
                    shape.describe()
                )));
            }
        }
    }
    Ok(())
}

/// Checks the known attributes of a node.
pub(crate) fn check_node_attributes(
    id: &str,
    node_type: NodeType,
    attributes: &Attributes,
) -> Result<(), Error> {
    check_fields(&format!("node {id}"), attributes, |field| {
        node_field_shape(node_type, field)
    })
}

/// Checks the known attributes of a connection.
pub(crate) fn check_connection_attributes(
    id: &str,
    connection_type: ConnectionType,
    attributes: &Attributes,
) -> Result<(), Error> {
    check_fields(&format!("connection {id}"), attributes, |field| {
        connection_field_shape(connection_type, field)
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_shapes() {
        assert!(FieldShape::Count.accepts(&json!(3)));
        assert!(!FieldShape::Count.accepts(&json!(-1)));
        assert!(!FieldShape::Count.accepts(&json!("3")));
        assert!(FieldShape::Count.accepts(&Value::Null));

        assert!(FieldShape::Quantity.accepts(&json!({"value": 12.5, "units": "m"})));
        assert!(FieldShape::Quantity.accepts(&json!({"value": null, "units": "m"})));
        assert!(!FieldShape::Quantity.accepts(&json!({"value": "high"})));
        assert!(!FieldShape::Quantity.accepts(&json!(12.5)));

        assert!(FieldShape::Range.accepts(&json!({
            "min": 1, "max": 10, "avg": null, "units": "MGD"
        })));
        assert!(!FieldShape::Range.accepts(&json!({"mean": 3})));

        assert!(FieldShape::TextList.accepts(&json!(["a", "b"])));
        assert!(!FieldShape::TextList.accepts(&json!(["a", 1])));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(
            node_field_shape(NodeType::Pump, "num_units"),
            Some(FieldShape::Count)
        );
        assert_eq!(
            node_field_shape(NodeType::Pump, "pump_type"),
            Some(FieldShape::Text)
        );
        assert_eq!(node_field_shape(NodeType::Tank, "pump_type"), None);
        assert_eq!(
            connection_field_shape(ConnectionType::Pipe, "diameter"),
            Some(FieldShape::Quantity)
        );
        assert_eq!(connection_field_shape(ConnectionType::Wire, "diameter"), None);
    }

    #[test]
    fn test_check_attributes() -> Result<(), Error> {
        let mut attributes = Attributes::new();
        attributes.insert("num_units", json!(2));
        attributes.insert("manufacturer", json!({"name": "ACME"}));
        check_node_attributes("Pump1", NodeType::Pump, &attributes)?;

        attributes.insert("num_units", json!("two"));
        assert!(
            check_node_attributes("Pump1", NodeType::Pump, &attributes).is_err_and(|e| e
                == Error::malformed_document(
                    "Field `num_units` of node Pump1 must be a non-negative integer."
                ))
        );

        let mut attributes = Attributes::new();
        attributes.insert("diameter", json!(0.5));
        assert!(
            check_connection_attributes("PipeA", ConnectionType::Pipe, &attributes).is_err()
        );
        // unknown to wires, so passed through
        check_connection_attributes("WireA", ConnectionType::Wire, &attributes)?;
        Ok(())
    }
}
