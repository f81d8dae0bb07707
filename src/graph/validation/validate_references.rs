// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Methods for validating that connections refer to existing nodes.

use crate::{Connection, Error};

use super::GraphValidator;

impl GraphValidator<'_> {
    /// Validates the endpoints of every connection in the document.
    pub(super) fn validate_connections(&self) -> Result<(), Error> {
        for (scope, composite) in self.root.scopes() {
            for connection in composite.connections() {
                self.validate_endpoints(&scope, connection)?;
            }
        }
        Ok(())
    }

    /// Validates that the endpoints of a connection held by the composite at
    /// `scope` resolve from there, and that its exit and entry points are
    /// children of the source and destination.
    pub(crate) fn validate_endpoints(
        &self,
        scope: &[&str],
        connection: &Connection,
    ) -> Result<(), Error> {
        let ends = self.root.endpoints(scope, connection);
        if ends.source.is_none() {
            return Err(Error::malformed_document(format!(
                "Connection {} references unknown source node {}.",
                connection.id(),
                connection.source()
            )));
        }
        if ends.destination.is_none() {
            return Err(Error::malformed_document(format!(
                "Connection {} references unknown destination node {}.",
                connection.id(),
                connection.destination()
            )));
        }
        if let (Some(exit_point), None) = (connection.exit_point(), &ends.exit_point) {
            return Err(Error::malformed_document(format!(
                "Connection {} has exit point {exit_point}, which is not a child of {}.",
                connection.id(),
                connection.source()
            )));
        }
        if let (Some(entry_point), None) = (connection.entry_point(), &ends.entry_point) {
            return Err(Error::malformed_document(format!(
                "Connection {} has entry point {entry_point}, which is not a child of {}.",
                connection.id(),
                connection.destination()
            )));
        }
        Ok(())
    }
}
