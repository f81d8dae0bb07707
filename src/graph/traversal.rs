// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! This module contains methods that resolve connection endpoints and find
//! the connections of a node.

use crate::{Connection, Error, Node};

/// The nodes a connection touches, as paths from the node the lookup started
/// at.  An endpoint that can't be resolved is `None`.
#[derive(Clone, Debug, Default)]
pub(crate) struct Endpoints<'a> {
    pub(crate) source: Option<Vec<&'a str>>,
    pub(crate) destination: Option<Vec<&'a str>>,
    pub(crate) exit_point: Option<Vec<&'a str>>,
    pub(crate) entry_point: Option<Vec<&'a str>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Direction {
    Incoming,
    Outgoing,
}

/// Traversal methods.
impl Node {
    /// Resolves a node ID as seen from the composite at `scope`: the children
    /// of that composite are searched first, then those of each ancestor.
    pub(crate) fn resolve<'a>(&'a self, scope: &[&'a str], id: &str) -> Option<Vec<&'a str>> {
        (0..=scope.len()).rev().find_map(|depth| {
            let composite = self.node_at(&scope[..depth]).ok()?;
            let child = composite.nodes.iter().find(|n| n.id == id)?;
            let mut path = scope[..depth].to_vec();
            path.push(child.id.as_str());
            Some(path)
        })
    }

    /// Resolves an entry or exit point, which must be a direct child of the
    /// resolved endpoint.
    fn resolve_point<'a>(
        &'a self,
        endpoint: Option<&Vec<&'a str>>,
        id: Option<&str>,
    ) -> Option<Vec<&'a str>> {
        let (endpoint, id) = (endpoint?, id?);
        let child = self
            .node_at(endpoint)
            .ok()?
            .nodes
            .iter()
            .find(|n| n.id == id)?;
        let mut path = endpoint.clone();
        path.push(child.id.as_str());
        Some(path)
    }

    /// Resolves the endpoints of a connection held by the composite at
    /// `scope`.
    pub(crate) fn endpoints<'a>(&'a self, scope: &[&'a str], connection: &Connection) -> Endpoints<'a> {
        let source = self.resolve(scope, &connection.source);
        let destination = self.resolve(scope, &connection.destination);
        Endpoints {
            exit_point: self.resolve_point(source.as_ref(), connection.exit_point()),
            entry_point: self.resolve_point(destination.as_ref(), connection.entry_point()),
            source,
            destination,
        }
    }

    /// Returns the connections that can carry flow into the node at `path`.
    ///
    /// Those are the connections whose destination or entry point is the
    /// node, and the bidirectional connections whose source or exit point is
    /// the node.  Connections at every depth are considered, in depth-first
    /// declared order.
    pub fn incoming_connections(&self, path: &[&str]) -> Result<Vec<&Connection>, Error> {
        self.connections_of(path, Direction::Incoming)
    }

    /// Returns the connections that can carry flow out of the node at `path`.
    ///
    /// Those are the connections whose source or exit point is the node, and
    /// the bidirectional connections whose destination or entry point is the
    /// node.
    pub fn outgoing_connections(&self, path: &[&str]) -> Result<Vec<&Connection>, Error> {
        self.connections_of(path, Direction::Outgoing)
    }

    fn connections_of(&self, path: &[&str], direction: Direction) -> Result<Vec<&Connection>, Error> {
        self.node_at(path)?;

        let mut found = vec![];
        for (scope, composite) in self.scopes() {
            for connection in &composite.connections {
                let ends = self.endpoints(&scope, connection);
                let into = is_at(&ends.destination, path) || is_at(&ends.entry_point, path);
                let out_of = is_at(&ends.source, path) || is_at(&ends.exit_point, path);
                let matches = match direction {
                    Direction::Incoming => into || (connection.bidirectional && out_of),
                    Direction::Outgoing => out_of || (connection.bidirectional && into),
                };
                if matches {
                    found.push(connection);
                }
            }
        }
        Ok(found)
    }
}

fn is_at(end: &Option<Vec<&str>>, path: &[&str]) -> bool {
    end.as_deref() == Some(path)
}
