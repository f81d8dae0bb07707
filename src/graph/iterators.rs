// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Iterators over the nodes of a [`Node`] hierarchy.

use crate::Node;

/// An iterator over a node and all its composite descendants, depth-first in
/// declared child order.
///
/// Each composite is yielded with its path from the starting node.  The
/// starting node comes first, with an empty path.
pub struct Scopes<'a> {
    pub(crate) stack: Vec<(Vec<&'a str>, &'a Node)>,
}

impl<'a> Iterator for Scopes<'a> {
    type Item = (Vec<&'a str>, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        for child in node.nodes().iter().rev().filter(|n| n.is_composite()) {
            let mut child_path = path.clone();
            child_path.push(child.id());
            self.stack.push((child_path, child));
        }
        Some((path, node))
    }
}

/// An iterator over every node below a node, depth-first in declared child
/// order, with their paths from the starting node.
pub struct Descendants<'a> {
    pub(crate) stack: Vec<(Vec<&'a str>, &'a Node)>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (Vec<&'a str>, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        for child in node.nodes().iter().rev() {
            let mut child_path = path.clone();
            child_path.push(child.id());
            self.stack.push((child_path, child));
        }
        Some((path, node))
    }
}

impl Node {
    /// Returns an iterator over this node and its composite descendants.
    pub fn scopes(&self) -> Scopes<'_> {
        Scopes {
            stack: if self.is_composite() {
                vec![(vec![], self)]
            } else {
                vec![]
            },
        }
    }

    /// Returns an iterator over all nodes below this one, excluding itself.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self
                .nodes()
                .iter()
                .rev()
                .map(|child| (vec![child.id()], child))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_utils::FacilityBuilder;
    use crate::Error;

    #[test]
    fn test_scopes() -> Result<(), Error> {
        let plant = FacilityBuilder::wwtp()?;

        assert_eq!(
            plant.scopes().map(|(path, _)| path.join("/")).collect::<Vec<_>>(),
            vec!["", "WWTP", "WWTP/Digesters"]
        );
        assert_eq!(
            plant
                .descendants()
                .map(|(path, _)| path.join("/"))
                .collect::<Vec<_>>(),
            vec![
                "Sewer",
                "WWTP",
                "WWTP/Influent",
                "WWTP/Digesters",
                "WWTP/Digesters/Digester1",
                "WWTP/Digesters/Digester2",
                "WWTP/Cogen",
                "Battery1",
            ]
        );
        Ok(())
    }
}
