//! Table-driven node synthesis
//!
//! Rebuilds the directory chain for a key tuple that has no directory on
//! disk. Existing nodes whose value matches (by exact match key) are
//! reused, so synthesizing the same tuple twice creates nothing new.

use dirbatch_parser::{Attributes, Value};
use dirbatch_status::TreeStatus;

use crate::error::TreeError;
use crate::node::{Node, NodeId, NodeKind, NodeSource};
use crate::tree::DirectoryTree;

/// Result of synthesizing one key tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Synthesis {
    /// Leaf holding the key tuple
    pub leaf: NodeId,
    /// Number of nodes created (0 when the chain already existed)
    pub created: usize,
}

impl Synthesis {
    /// Whether the leaf is new
    #[inline]
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.created > 0
    }
}

impl DirectoryTree {
    /// Ensure a node chain exists for `key`, one value per directory map
    ///
    /// # Errors
    /// Returns error if `key` has the wrong length or a parser cannot
    /// render a value.
    pub fn synthesize(&mut self, key: &[Value]) -> Result<Synthesis, TreeError> {
        if key.len() != self.maps.len() {
            return Err(TreeError::KeyArity {
                expected: self.maps.len(),
                found: key.len(),
            });
        }

        let mut current = self.root();
        let mut created = 0;
        for (level, value) in key.iter().enumerate() {
            if let Some(existing) = self.find_child(current, level, value)? {
                current = existing;
                continue;
            }

            let map = &self.maps[level];
            let attributes = Attributes::single(map.token(), value.clone());
            let name = map
                .parser()
                .reverse(map.token(), &attributes)
                .map_err(|source| TreeError::parser(map.name(), value.to_string(), source))?;
            tracing::debug!("Synthesizing directory '{}' for map '{}'", name, map.name());

            let node = Node::new(name, NodeKind::Level(level), TreeStatus::Valid.into())
                .with_attributes(attributes)
                .with_source(NodeSource::Synthesized);
            current = self.push(current, node);
            created += 1;
        }

        Ok(Synthesis {
            leaf: current,
            created,
        })
    }

    fn find_child(
        &self,
        parent: NodeId,
        level: usize,
        value: &Value,
    ) -> Result<Option<NodeId>, TreeError> {
        let map = &self.maps[level];
        let wanted = map
            .parser()
            .match_key(value)
            .map_err(|source| TreeError::parser(map.name(), value.to_string(), source))?;

        for &child in &self.nodes[parent.0].children {
            let node = &self.nodes[child.0];
            if node.kind != NodeKind::Level(level) {
                continue;
            }
            let Some(existing) = node.attributes.get(map.token()) else {
                continue;
            };
            let key = map
                .parser()
                .match_key(existing)
                .map_err(|source| TreeError::parser(map.name(), &node.name, source))?;
            if key == wanted {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }
}
