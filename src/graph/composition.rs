// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Methods for combining [`Node`] hierarchies.

use std::collections::HashSet;

use crate::graph_traits::{insert_tag, insert_virtual_tag};
use crate::{Connection, Error, Node};

/// Merging and extending graphs.
impl Node {
    /// Adds the top-level nodes and connections of `other` to this node.
    ///
    /// A node or connection with the ID of an existing child replaces it in
    /// place, anything else is appended.  The tags of `other` itself and its
    /// document-level virtual tags are added to this node.  The result is
    /// checked as in [`Node::try_update`], so connections of `other` may
    /// reach nodes that only this graph has.
    pub fn merge(&mut self, other: Node) -> Result<(), Error> {
        self.try_update(|graph| {
            graph.ensure_composite()?;
            for node in other.nodes {
                match graph.nodes.iter().position(|n| n.id == node.id) {
                    Some(i) => {
                        tracing::debug!("Replacing node {} of {}.", node.id, graph.id);
                        graph.nodes[i] = node;
                    }
                    None => graph.push_node(node)?,
                }
            }
            for connection in other.connections {
                match graph.connections.iter().position(|c| c.id == connection.id) {
                    Some(i) => {
                        tracing::debug!("Replacing connection {} of {}.", connection.id, graph.id);
                        graph.connections[i] = connection;
                    }
                    None => graph.push_connection(connection)?,
                }
            }
            for tag in other.tags.tags() {
                insert_tag(&mut *graph, tag.clone())?;
            }
            for vtag in other.tags.virtual_tags() {
                if vtag.parent_id().is_some() {
                    insert_virtual_tag(&mut *graph, vtag.clone())?;
                } else {
                    graph.insert_document_virtual_tag(vtag.clone())?;
                }
            }
            Ok(())
        })
    }

    /// Returns a copy of this node where the IDs of all nodes and connections
    /// below it start with `{prefix}-`.
    ///
    /// Endpoints, entry points and exit points that name a node below this
    /// one are renamed with it, and tags follow their owners.  Tag IDs are
    /// kept.
    pub fn prefix_children(&self, prefix: &str) -> Node {
        let renamed = self
            .descendants()
            .map(|(_, node)| node.id.clone())
            .collect::<HashSet<_>>();
        let mut node = self.clone();
        node.rename_children(prefix, &renamed);
        node
    }

    fn rename_children(&mut self, prefix: &str, renamed: &HashSet<String>) {
        let rename = |id: &mut String| {
            if renamed.contains(id.as_str()) {
                *id = format!("{prefix}-{id}");
            }
        };
        for child in &mut self.nodes {
            child.id = format!("{prefix}-{}", child.id);
            child.tags.set_owner(&child.id);
            child.rename_children(prefix, renamed);
        }
        for connection in &mut self.connections {
            connection.id = format!("{prefix}-{}", connection.id);
            rename(&mut connection.source);
            rename(&mut connection.destination);
            if let Some(exit_point) = &mut connection.exit_point {
                rename(exit_point);
            }
            if let Some(entry_point) = &mut connection.entry_point {
                rename(entry_point);
            }
            connection.tags.set_owner(&connection.id);
        }
    }

    /// Replaces the node at `path` with the contents of `replacement`.
    ///
    /// The node is removed together with the connections that reach it and
    /// the virtual tags that read its tags.  The children and connections of
    /// `replacement`'s node with the same ID, or of `replacement` itself if
    /// it has none, are prefixed with that ID (see
    /// [`Node::prefix_children`]) and added to the removed node's parent.
    /// `links` are then added to the parent as well, and join the new nodes
    /// to the rest of the graph through their prefixed IDs.
    pub fn extend_node(
        &mut self,
        path: &[&str],
        replacement: &Node,
        links: impl IntoIterator<Item = Connection>,
    ) -> Result<(), Error> {
        let Some((last, scope)) = path.split_last() else {
            return Err(Error::invalid_operation(format!(
                "Node {} can't extend itself.",
                self.id
            )));
        };
        self.try_update(|graph| {
            graph.remove_node_at(path, true)?;
            let source = replacement
                .get_node_recursive(last)
                .unwrap_or(replacement)
                .prefix_children(last);

            let parent = graph.node_at_mut(scope)?;
            tracing::debug!("Extending {last} in {} with {}.", parent.id, replacement.id);
            for node in source.nodes {
                parent.push_node(node)?;
            }
            for connection in source.connections {
                parent.push_connection(connection)?;
            }
            for link in links {
                parent.push_connection(link)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_utils::FacilityBuilder;
    use crate::tags::Tag;
    use crate::{ConnectionType, ContentsType, ErrorKind, NodeType, TagOwner, TagType};

    #[test]
    fn test_merge() -> Result<(), Error> {
        use ContentsType::{Biogas, Electricity};

        let mut plant = FacilityBuilder::wwtp()?;
        let mut update = Node::network("Update");
        update.add_node(
            Node::new("Battery1", NodeType::Battery, vec![Electricity], vec![Electricity])
                .with_attribute("num_units", serde_json::json!(2))?,
        )?;
        update.add_node(Node::with_contents("Flare", NodeType::Flaring, vec![Biogas]))?;
        update.add_tag(Tag::new("PlantPower", TagType::Flow, None, Electricity))?;

        plant.merge(update)?;
        assert_eq!(
            plant.nodes().iter().map(|n| n.id()).collect::<Vec<_>>(),
            vec!["Sewer", "WWTP", "Battery1", "Flare"]
        );
        assert_eq!(plant.get_node("Battery1")?.num_units(), 2);
        assert_eq!(
            plant.get_tag("PlantPower").and_then(Tag::parent_id),
            Some(crate::DEFAULT_ROOT_ID)
        );
        // GridTie still reaches the replaced battery
        assert_eq!(plant.incoming_connections(&["Battery1"])?.len(), 2);

        // a connection from the update may reach nodes of the graph
        let mut link = Node::network("Link");
        link.push_connection(Connection::new(
            "GasToFlare",
            ConnectionType::Pipe,
            "WWTP",
            "Flare",
            Biogas,
        ))?;
        plant.merge(link)?;
        assert_eq!(plant.outgoing_connections(&["WWTP"])?.len(), 2);

        // replacing a composite with one that lacks a referenced child fails
        let before = plant.clone();
        let mut broken = Node::network("Broken");
        broken.add_node(Node::network("WWTP"))?;
        assert!(plant
            .merge(broken)
            .is_err_and(|e| e.kind() == ErrorKind::MalformedDocument));
        assert_eq!(plant, before);
        Ok(())
    }

    #[test]
    fn test_prefix_children() -> Result<(), Error> {
        let plant = FacilityBuilder::wwtp()?;
        let north = plant.get_node("WWTP")?.prefix_children("North");

        assert_eq!(north.id(), "WWTP");
        assert_eq!(
            north.nodes().iter().map(|n| n.id()).collect::<Vec<_>>(),
            vec!["North-Influent", "North-Digesters", "North-Cogen"]
        );
        assert_eq!(
            north.node_at(&["North-Digesters"])?.nodes()[0].id(),
            "North-Digester1"
        );

        let gas = north.get_connection("North-DigesterGas")?;
        assert_eq!(gas.source(), "North-Digesters");
        assert_eq!(gas.destination(), "North-Cogen");
        assert_eq!(gas.exit_point(), Some("North-Digester2"));
        assert_eq!(gas.get_tag("GasFlow1").and_then(Tag::parent_id), Some("North-DigesterGas"));

        // Battery1 isn't below WWTP, so PowerOut still names it as is
        assert_eq!(north.get_connection("North-PowerOut")?.destination(), "Battery1");
        Ok(())
    }

    #[test]
    fn test_extend_node() -> Result<(), Error> {
        use ContentsType::{Biogas, Electricity};

        let mut plant = FacilityBuilder::wwtp()?;
        let mut cogen = Node::network("CogenComplex");
        cogen.add_node(Node::new("Engine", NodeType::Cogeneration, vec![Biogas], vec![Electricity]))?;
        cogen.add_node(Node::with_contents("Meter", NodeType::Joint, vec![Electricity]))?;
        cogen.add_connection(Connection::new(
            "EngineOut",
            ConnectionType::Wire,
            "Engine",
            "Meter",
            Electricity,
        ))?;

        plant.extend_node(
            &["WWTP", "Cogen"],
            &cogen,
            [
                Connection::new("GasIn", ConnectionType::Pipe, "Digesters", "Cogen-Engine", Biogas)
                    .with_exit_point("Digester2"),
                Connection::new("PowerOut", ConnectionType::Wire, "Cogen-Meter", "Battery1", Electricity),
            ],
        )?;

        let wwtp = plant.get_node("WWTP")?;
        assert_eq!(
            wwtp.nodes().iter().map(|n| n.id()).collect::<Vec<_>>(),
            vec!["Influent", "Digesters", "Cogen-Engine", "Cogen-Meter"]
        );
        assert_eq!(
            wwtp.connections().iter().map(|c| c.id()).collect::<Vec<_>>(),
            vec!["InfluentToDigesters", "Cogen-EngineOut", "GasIn", "PowerOut"]
        );
        // GridTie left WWTP through Cogen, and GasFlowSum read DigesterGas
        assert!(plant.get_connection("GridTie").is_err());
        assert!(plant.get_virtual_tag_recursive("GasFlowSum").is_err());
        assert_eq!(plant.incoming_connections(&["Battery1"])?.len(), 1);

        let before = plant.clone();
        assert!(plant
            .extend_node(
                &["WWTP", "Influent"],
                &cogen,
                [Connection::new("Bad", ConnectionType::Pipe, "Sewer", "Engine", Biogas)],
            )
            .is_err_and(|e| e.kind() == ErrorKind::MalformedDocument));
        assert_eq!(plant, before);
        Ok(())
    }
}
