// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Methods for validating a [`Node`] hierarchy as a whole document.

mod validate_references;
mod validate_tags;

use std::collections::HashMap;

use crate::tags::Inferred;
use crate::{Connection, Error, Node};

pub(crate) struct GraphValidator<'a> {
    root: &'a Node,
}

impl<'a> GraphValidator<'a> {
    pub(crate) fn new(root: &'a Node) -> Self {
        Self { root }
    }

    /// Runs every document-wide check and returns the derived attributes of
    /// all virtual tags.
    pub(crate) fn validate(&self) -> Result<HashMap<String, Inferred>, Error> {
        self.validate_connections()?;
        let index = self.validate_tag_namespace()?;
        self.validate_virtual_tags(&index)
    }
}

/// Validation.
impl Node {
    /// Checks this node as a whole document.
    ///
    /// - every connection endpoint resolves, and entry and exit points are
    ///   children of their endpoints.
    /// - tag and virtual tag IDs are unique across the document.
    /// - every virtual tag operand resolves.
    /// - virtual tags don't read themselves, directly or indirectly.
    /// - virtual tag operators combine compatible units.
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), Error> {
        GraphValidator::new(self).validate().map(|_| ())
    }

    /// Validates the document and stores the derived attributes of every
    /// virtual tag.
    pub(crate) fn finalize(&mut self) -> Result<(), Error> {
        let inferred = GraphValidator::new(self).validate()?;
        self.for_each_tag_set_mut(&mut |set| {
            for vtag in set.virtual_tags_mut() {
                if let Some(derived) = inferred.get(vtag.id()) {
                    vtag.inferred = derived.clone();
                }
            }
        });
        Ok(())
    }

    /// Checks that the endpoints of a connection held by the composite at
    /// `scope` resolve.
    pub(crate) fn check_endpoints(&self, scope: &[&str], connection: &Connection) -> Result<(), Error> {
        GraphValidator::new(self).validate_endpoints(scope, connection)
    }
}
