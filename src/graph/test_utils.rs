// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! This module is only compiled when running unit tests and contains features
//! that are shared by the tests of the `graph` and `json` modules.
//!
//! - the `FacilityBuilder`, which can declaratively build nested facility
//!   graphs for use in tests.
//! - `FacilityBuilder::wwtp`, the sample plant most tests run against.

use crate::graph_traits::{insert_tag, insert_virtual_tag};
use crate::quantity::Unit;
use crate::tags::{BinaryOp, Operand, Operator, Tag, UnitId, VirtualTag};
use crate::{
    Connection, ConnectionType, ContentsType, Error, Node, NodeType, TagType, DEFAULT_ROOT_ID,
};

/// A builder for nested facility graphs.
///
/// Every method takes the path of the composite (or owner) it works on, from
/// the root.  The graph is validated only in `build`.
pub(crate) struct FacilityBuilder {
    root: Node,
}

impl FacilityBuilder {
    /// Creates a builder with an empty root network.
    pub(crate) fn new() -> Self {
        Self {
            root: Node::network(DEFAULT_ROOT_ID),
        }
    }

    /// Adds a node to the composite at `scope`.
    pub(crate) fn node(mut self, scope: &[&str], node: Node) -> Result<Self, Error> {
        self.root.node_at_mut(scope)?.push_node(node)?;
        Ok(self)
    }

    /// Adds a connection to the composite at `scope`.
    pub(crate) fn connection(mut self, scope: &[&str], connection: Connection) -> Result<Self, Error> {
        self.root.add_connection_at(scope, connection)?;
        Ok(self)
    }

    /// Adds a tag to the node or connection at `owner`.
    pub(crate) fn tag(mut self, owner: &[&str], tag: Tag) -> Result<Self, Error> {
        insert_tag(self.root.owner_mut(owner)?, tag)?;
        Ok(self)
    }

    /// Adds a virtual tag to the node or connection at `owner`, or to the
    /// document when `owner` is empty.
    pub(crate) fn virtual_tag(mut self, owner: &[&str], vtag: VirtualTag) -> Result<Self, Error> {
        if owner.is_empty() {
            self.root.insert_document_virtual_tag(vtag)?;
        } else {
            insert_virtual_tag(self.root.owner_mut(owner)?, vtag)?;
        }
        Ok(self)
    }

    /// Validates the graph and derives the virtual tag attributes.
    pub(crate) fn build(self) -> Result<Node, Error> {
        let mut root = self.root;
        root.finalize()?;
        Ok(root)
    }

    /// A wastewater plant with a nested digester complex.
    ///
    /// ```text
    /// ParentNetwork
    /// ├── Sewer ──SewerToPlant──▶ WWTP (entry: Influent)
    /// ├── WWTP
    /// │   ├── Influent ──InfluentToDigesters──▶ Digesters (entry: Digester1)
    /// │   ├── Digesters
    /// │   │   ├── Digester1 ◀──GasBalance──▶ Digester2
    /// │   │   └── Digester2
    /// │   ├── Digesters (exit: Digester2) ──DigesterGas──▶ Cogen
    /// │   └── Cogen ──PowerOut──▶ Battery1 (resolved in the root)
    /// ├── Battery1
    /// └── WWTP (exit: Cogen) ◀──GridTie──▶ Battery1
    /// ```
    pub(crate) fn wwtp() -> Result<Node, Error> {
        use ContentsType::{Biogas, Electricity, ThickenedPrimarySludge, UntreatedSewage};

        let gas_flow = |id: &str, unit_id: UnitId| -> Result<Tag, Error> {
            Ok(Tag::new(id, TagType::Flow, Unit::parse("SCFM")?, Biogas).with_source_unit_id(unit_id))
        };
        let level = |id: &str| -> Result<Tag, Error> {
            Ok(Tag::new(id, TagType::Level, Unit::parse("ft")?, ThickenedPrimarySludge))
        };

        Self::new()
            .node(&[], Node::with_contents("Sewer", NodeType::Reservoir, vec![UntreatedSewage]))?
            .node(
                &[],
                Node::new("WWTP", NodeType::Facility, vec![UntreatedSewage], vec![Biogas, Electricity]),
            )?
            .node(&[], Node::with_contents("Battery1", NodeType::Battery, vec![Electricity]))?
            .node(&["WWTP"], Node::with_contents("Influent", NodeType::Pump, vec![UntreatedSewage]))?
            .node(
                &["WWTP"],
                Node::new("Digesters", NodeType::ModularUnit, vec![ThickenedPrimarySludge], vec![Biogas]),
            )?
            .node(&["WWTP"], Node::new("Cogen", NodeType::Cogeneration, vec![Biogas], vec![Electricity]))?
            .node(
                &["WWTP", "Digesters"],
                Node::new("Digester1", NodeType::Digestion, vec![ThickenedPrimarySludge], vec![Biogas]),
            )?
            .node(
                &["WWTP", "Digesters"],
                Node::new("Digester2", NodeType::Digestion, vec![ThickenedPrimarySludge], vec![Biogas]),
            )?
            .connection(
                &[],
                Connection::new("SewerToPlant", ConnectionType::Pipe, "Sewer", "WWTP", UntreatedSewage)
                    .with_entry_point("Influent"),
            )?
            .connection(
                &[],
                Connection::new("GridTie", ConnectionType::Wire, "WWTP", "Battery1", Electricity)
                    .with_exit_point("Cogen")
                    .with_bidirectional(true),
            )?
            .connection(
                &["WWTP"],
                Connection::new(
                    "InfluentToDigesters",
                    ConnectionType::Pipe,
                    "Influent",
                    "Digesters",
                    ThickenedPrimarySludge,
                )
                .with_entry_point("Digester1"),
            )?
            .connection(
                &["WWTP"],
                Connection::new("DigesterGas", ConnectionType::Pipe, "Digesters", "Cogen", Biogas)
                    .with_exit_point("Digester2"),
            )?
            .connection(
                &["WWTP"],
                Connection::new("PowerOut", ConnectionType::Wire, "Cogen", "Battery1", Electricity),
            )?
            .connection(
                &["WWTP", "Digesters"],
                Connection::new("GasBalance", ConnectionType::Pipe, "Digester1", "Digester2", Biogas)
                    .with_bidirectional(true),
            )?
            .tag(
                &["SewerToPlant"],
                Tag::new("SewerFlow", TagType::Flow, Unit::parse("MGD")?, UntreatedSewage)
                    .with_totalized(true),
            )?
            .tag(&["WWTP", "DigesterGas"], gas_flow("GasFlow1", UnitId::Unit(1))?)?
            .tag(&["WWTP", "DigesterGas"], gas_flow("GasFlow2", UnitId::Unit(2))?)?
            .tag(&["WWTP", "DigesterGas"], gas_flow("GasFlow3", UnitId::Unit(3))?)?
            .tag(&["WWTP", "DigesterGas"], gas_flow("GasFlowTotal", UnitId::Total)?)?
            .tag(&["WWTP", "Digesters", "Digester1"], level("Digester1Level")?)?
            .tag(&["WWTP", "Digesters", "Digester2"], level("Digester2Level")?)?
            .virtual_tag(
                &["WWTP", "Digesters"],
                VirtualTag::new(
                    "LevelDifference",
                    vec![Operand::tag("Digester1Level"), Operand::tag("Digester2Level")],
                    Operator::binary(BinaryOp::Sub),
                )?,
            )?
            .virtual_tag(
                &[],
                VirtualTag::new(
                    "GasFlowSum",
                    vec![
                        Operand::tag("GasFlow1"),
                        Operand::tag("GasFlow2"),
                        Operand::tag("GasFlow3"),
                    ],
                    Operator::binary(BinaryOp::Add),
                )?,
            )?
            .build()
    }
}
