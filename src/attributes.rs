// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Type-specific attributes of nodes and connections.

use serde_json::{Map, Value};

use crate::quantity::{parse_quantity, DesignRange, Quantity};
use crate::Error;

/// The attributes of a node or connection that the graph itself doesn't
/// interpret, e.g. the diameter of a pipe or the number of parallel units of
/// a pump station.
///
/// Attributes keep the order in which they were inserted, so that documents
/// are written back the way they were read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    /// Creates an empty set of attributes.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Reads a `{"value": .., "units": ..}` attribute.
    ///
    /// When the attribute is missing, `legacy_key` is tried as a plain number
    /// in `legacy_units`.
    pub fn quantity(
        &self,
        key: &str,
        legacy: Option<(&str, &str)>,
    ) -> Result<Option<Quantity>, Error> {
        match self.0.get(key) {
            Some(Value::Object(map)) => {
                let value = map.get("value").and_then(Value::as_f64);
                let units = map.get("units").and_then(Value::as_str).unwrap_or("");
                Ok(Some(parse_quantity(value, units)?))
            }
            Some(Value::Null) => Ok(None),
            Some(other) => Err(Error::malformed_document(format!(
                "Attribute `{key}` is not a quantity: {other}"
            ))),
            None => match legacy {
                Some((legacy_key, legacy_units)) => match self.0.get(legacy_key) {
                    Some(value) if value.is_number() || value.is_null() => {
                        Ok(Some(parse_quantity(value.as_f64(), legacy_units)?))
                    }
                    Some(other) => Err(Error::malformed_document(format!(
                        "Attribute `{legacy_key}` is not a number: {other}"
                    ))),
                    None => Ok(None),
                },
                None => Ok(None),
            },
        }
    }

    /// Reads a `{"min": .., "max": .., "design": .., "units": ..}` attribute.
    /// The legacy `avg` key is read when `design` is missing.
    pub fn range(&self, key: &str) -> Result<Option<DesignRange>, Error> {
        match self.0.get(key) {
            Some(Value::Object(map)) => {
                let units = map.get("units").and_then(Value::as_str).unwrap_or("");
                let bound = |name: &str| map.get(name).and_then(Value::as_f64);
                Ok(Some(DesignRange {
                    min: parse_quantity(bound("min"), units)?,
                    max: parse_quantity(bound("max"), units)?,
                    design: parse_quantity(bound("design").or_else(|| bound("avg")), units)?,
                }))
            }
            Some(Value::Null) | None => Ok(None),
            Some(other) => Err(Error::malformed_document(format!(
                "Attribute `{key}` is not a range: {other}"
            ))),
        }
    }
}

impl FromIterator<(String, Value)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::quantity::Unit;

    #[test]
    fn test_quantity() -> Result<(), Error> {
        let attributes: Attributes = [
            ("elevation".to_string(), json!({"value": 12.0, "units": "m"})),
            ("volume (cubic meters)".to_string(), json!(250.0)),
            ("area".to_string(), json!("large")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            attributes.quantity("elevation", Some(("elevation (meters)", "m")))?,
            Some(parse_quantity(Some(12.0), "m")?)
        );
        assert_eq!(
            attributes.quantity("volume", Some(("volume (cubic meters)", "m^3")))?,
            Some(parse_quantity(Some(250.0), "cubic meters")?)
        );
        assert_eq!(attributes.quantity("diameter", None)?, None);
        assert!(attributes
            .quantity("area", None)
            .is_err_and(|e| e == Error::malformed_document(
                "Attribute `area` is not a quantity: \"large\""
            )));
        Ok(())
    }

    #[test]
    fn test_range() -> Result<(), Error> {
        let mut attributes = Attributes::new();
        attributes.insert(
            "flowrate",
            json!({"min": 1.0, "max": null, "avg": 3.5, "units": "MGD"}),
        );

        let range = attributes.range("flowrate")?.unwrap();
        assert_eq!(range.min.value(), Some(1.0));
        assert!(range.max.is_unknown());
        assert_eq!(range.design.value(), Some(3.5));
        assert_eq!(range.design.units(), Unit::parse("MGD")?.as_ref());
        assert_eq!(attributes.range("flow_rate")?, None);
        Ok(())
    }

    #[test]
    fn test_insertion_order() {
        let mut attributes = Attributes::new();
        attributes.insert("zeta", json!(1));
        attributes.insert("alpha", json!(2));
        attributes.insert("mid", json!(3));
        attributes.remove("alpha");
        let keys = attributes.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["zeta", "mid"]);
    }
}
