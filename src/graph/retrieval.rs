// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Methods for retrieving nodes, connections and tags from a [`Node`]
//! hierarchy.

use crate::graph_traits::TagOwner;
use crate::tags::{SeriesSource, Tag, TagIndex, TagRef, VirtualTag};
use crate::{Connection, Error, Node, NodeType};

/// Node, connection and tag retrieval.
impl Node {
    /// Returns the child nodes, in declared order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the connections between the children, in declared order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Returns the direct child node with the given ID.
    pub fn get_node(&self, id: &str) -> Result<&Node, Error> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::object_not_found(format!("Node {id} not found in {}.", self.id)))
    }

    /// Returns the connection with the given ID at this level.
    pub fn get_connection(&self, id: &str) -> Result<&Connection, Error> {
        self.connections.iter().find(|c| c.id == id).ok_or_else(|| {
            Error::object_not_found(format!("Connection {id} not found in {}.", self.id))
        })
    }

    /// Returns the node at the given path below this one.  An empty path is
    /// the node itself.
    pub fn node_at(&self, path: &[&str]) -> Result<&Node, Error> {
        path.iter().try_fold(self, |node, id| node.get_node(id))
    }

    /// Returns the node at the given path below this one, for modification.
    /// Changes made through it skip the checks of the public mutation
    /// methods.
    pub(crate) fn node_at_mut(&mut self, path: &[&str]) -> Result<&mut Node, Error> {
        let mut node = self;
        for id in path {
            let parent_id = node.id.clone();
            node = node.nodes.iter_mut().find(|n| n.id == *id).ok_or_else(|| {
                Error::object_not_found(format!("Node {id} not found in {parent_id}."))
            })?;
        }
        Ok(node)
    }

    /// Returns the first node with the given ID at any depth, depth-first in
    /// declared order.
    pub fn get_node_recursive(&self, id: &str) -> Result<&Node, Error> {
        self.descendants()
            .map(|(_, node)| node)
            .find(|n| n.id == id)
            .ok_or_else(|| Error::object_not_found(format!("Node {id} not found.")))
    }

    /// Returns the first connection with the given ID at any depth.
    pub fn get_connection_recursive(&self, id: &str) -> Result<&Connection, Error> {
        self.scopes()
            .flat_map(|(_, scope)| scope.connections.iter())
            .find(|c| c.id == id)
            .ok_or_else(|| Error::object_not_found(format!("Connection {id} not found.")))
    }

    /// Returns the tag with the given ID, wherever it is in the hierarchy.
    pub fn get_tag_recursive(&self, id: &str) -> Result<&Tag, Error> {
        self.tag_owners(true)
            .into_iter()
            .find_map(|owner| owner.get_tag(id))
            .ok_or_else(|| Error::object_not_found(format!("Tag with id {id} not found.")))
    }

    /// Returns the virtual tag with the given ID, wherever it is in the
    /// hierarchy.
    pub fn get_virtual_tag_recursive(&self, id: &str) -> Result<&VirtualTag, Error> {
        self.tag_owners(true)
            .into_iter()
            .find_map(|owner| owner.get_virtual_tag(id))
            .ok_or_else(|| {
                Error::object_not_found(format!("Virtual tag with id {id} not found."))
            })
    }

    /// Returns the node or connection that owns the tag or virtual tag with
    /// the given ID.
    pub fn get_parent_of_tag(&self, id: &str) -> Result<&dyn TagOwner, Error> {
        self.tag_owners(true)
            .into_iter()
            .find(|owner| owner.tag_set().contains(id))
            .ok_or_else(|| Error::object_not_found(format!("Tag with id {id} not found.")))
    }

    /// Returns the child nodes of any of the given types, optionally at every
    /// depth.
    pub fn nodes_of_type(&self, types: &[NodeType], recurse: bool) -> Vec<&Node> {
        let matches = |n: &&Node| types.contains(&n.node_type);
        if recurse {
            self.descendants().map(|(_, n)| n).filter(matches).collect()
        } else {
            self.nodes.iter().filter(matches).collect()
        }
    }

    /// Returns the connections at this level, or at every depth when
    /// `recurse` is set.
    pub fn all_connections(&self, recurse: bool) -> Vec<&Connection> {
        if recurse {
            self.scopes()
                .flat_map(|(_, scope)| scope.connections.iter())
                .collect()
        } else {
            self.connections.iter().collect()
        }
    }

    /// Returns the tags and virtual tags of this node, of its children and of
    /// its connections, or of everything below it when `recurse` is set.
    pub fn all_tags(&self, recurse: bool) -> Vec<TagRef<'_>> {
        self.tag_owners(recurse)
            .into_iter()
            .flat_map(|owner| {
                let set = owner.tag_set();
                set.tags()
                    .iter()
                    .map(TagRef::Tag)
                    .chain(set.virtual_tags().iter().map(TagRef::Virtual))
            })
            .collect()
    }

    /// Builds the document-wide lookup of every tag and virtual tag below this
    /// node.
    ///
    /// Fails with `DuplicateId` if two tags or virtual tags share an ID.
    pub fn tag_index(&self) -> Result<TagIndex<'_>, Error> {
        let mut index = TagIndex::default();
        for entry in self.all_tags(true) {
            index.insert(entry)?;
        }
        Ok(index)
    }

    /// Evaluates the tag or virtual tag with the given ID over `data`.
    pub fn evaluate(&self, id: &str, data: &impl SeriesSource) -> Result<Vec<f64>, Error> {
        self.tag_index()?.evaluate(id, data)
    }

    /// Returns this node, then the children and connections of this node, and
    /// with `recurse` the children and connections of every composite below.
    pub(crate) fn tag_owners(&self, recurse: bool) -> Vec<&dyn TagOwner> {
        let mut owners: Vec<&dyn TagOwner> = vec![self];
        let scopes: Vec<&Node> = if recurse {
            self.scopes().map(|(_, scope)| scope).collect()
        } else {
            vec![self]
        };
        for scope in scopes {
            owners.extend(scope.nodes.iter().map(|n| n as &dyn TagOwner));
            owners.extend(scope.connections.iter().map(|c| c as &dyn TagOwner));
        }
        owners
    }

    /// Returns the node or connection at `path`.  The last element may name a
    /// node or a connection of the composite before it; an empty path is this
    /// node.
    pub(crate) fn owner_mut(&mut self, path: &[&str]) -> Result<&mut dyn TagOwner, Error> {
        let Some((last, scope)) = path.split_last() else {
            return Ok(self);
        };
        let parent = self.node_at_mut(scope)?;
        if let Some(i) = parent.nodes.iter().position(|n| n.id == *last) {
            return Ok(&mut parent.nodes[i]);
        }
        if let Some(i) = parent.connections.iter().position(|c| c.id == *last) {
            return Ok(&mut parent.connections[i]);
        }
        Err(Error::object_not_found(format!(
            "No node or connection {last} in {}.",
            parent.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::graph::test_utils::FacilityBuilder;
    use crate::ErrorKind;

    #[test]
    fn test_get_node() -> Result<(), Error> {
        let plant = FacilityBuilder::wwtp()?;

        assert_eq!(plant.get_node("WWTP")?.node_type(), NodeType::Facility);
        assert!(plant
            .get_node("Cogen")
            .is_err_and(|e| e == Error::object_not_found("Node Cogen not found in ParentNetwork.")));
        assert_eq!(plant.get_node_recursive("Cogen")?.id(), "Cogen");
        assert_eq!(
            plant.node_at(&["WWTP", "Digesters", "Digester2"])?.id(),
            "Digester2"
        );
        assert_eq!(plant.node_at(&[])?.id(), "ParentNetwork");
        assert!(plant
            .node_at(&["WWTP", "Digester2"])
            .is_err_and(|e| e == Error::object_not_found("Node Digester2 not found in WWTP.")));
        Ok(())
    }

    #[test]
    fn test_get_connection() -> Result<(), Error> {
        let plant = FacilityBuilder::wwtp()?;

        assert_eq!(plant.get_connection("GridTie")?.exit_point(), Some("Cogen"));
        assert!(plant
            .get_connection("GasBalance")
            .is_err_and(|e| e.kind() == ErrorKind::ObjectNotFound));
        assert!(plant.get_connection_recursive("GasBalance")?.is_bidirectional());

        assert_eq!(
            plant
                .all_connections(false)
                .iter()
                .map(|c| c.id())
                .collect::<Vec<_>>(),
            vec!["SewerToPlant", "GridTie"]
        );
        assert_eq!(
            plant
                .all_connections(true)
                .iter()
                .map(|c| c.id())
                .collect::<Vec<_>>(),
            vec![
                "SewerToPlant",
                "GridTie",
                "InfluentToDigesters",
                "DigesterGas",
                "PowerOut",
                "GasBalance"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_tags() -> Result<(), Error> {
        let plant = FacilityBuilder::wwtp()?;

        assert_eq!(
            plant.get_tag_recursive("Digester1Level")?.parent_id(),
            Some("Digester1")
        );
        assert_eq!(
            plant.get_virtual_tag_recursive("GasFlowSum")?.parent_id(),
            None
        );
        assert_eq!(plant.get_parent_of_tag("GasFlow2")?.id(), "DigesterGas");
        assert_eq!(plant.get_parent_of_tag("LevelDifference")?.id(), "Digesters");
        assert!(plant
            .get_tag_recursive("GasFlowSum")
            .is_err_and(|e| e == Error::object_not_found("Tag with id GasFlowSum not found.")));

        assert_eq!(
            plant
                .all_tags(false)
                .iter()
                .map(|t| t.id())
                .collect::<Vec<_>>(),
            vec!["GasFlowSum", "SewerFlow"]
        );
        assert_eq!(plant.all_tags(true).len(), 9);
        assert_eq!(plant.tag_index()?.len(), 9);

        let data = HashMap::from([
            ("GasFlow1".to_string(), vec![1.0, 2.0]),
            ("GasFlow2".to_string(), vec![10.0, 20.0]),
            ("GasFlow3".to_string(), vec![100.0, 200.0]),
        ]);
        assert_eq!(plant.evaluate("GasFlowSum", &data)?, vec![111.0, 222.0]);
        Ok(())
    }

    #[test]
    fn test_nodes_of_type() -> Result<(), Error> {
        fn ids(nodes: Vec<&Node>) -> Vec<&str> {
            nodes.into_iter().map(Node::id).collect()
        }
        let plant = FacilityBuilder::wwtp()?;

        assert_eq!(ids(plant.nodes_of_type(&[NodeType::Digestion], false)), Vec::<&str>::new());
        assert_eq!(
            ids(plant.nodes_of_type(&[NodeType::Digestion], true)),
            vec!["Digester1", "Digester2"]
        );
        assert_eq!(
            ids(plant.nodes_of_type(&[NodeType::Reservoir, NodeType::Battery], false)),
            vec!["Sewer", "Battery1"]
        );
        Ok(())
    }
}
