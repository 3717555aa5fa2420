//! Flattening leaves into records

use std::path::PathBuf;

use dirbatch_parser::Value;
use dirbatch_status::StatusValue;

use crate::node::{NodeId, NodeKind, NodeSource};
use crate::tree::DirectoryTree;

/// Flat view of one complete leaf
#[derive(Debug, Clone, PartialEq)]
pub struct LeafRecord {
    /// Leaf node
    pub node: NodeId,
    /// Map-name → value pairs from the root down, suffix attributes last
    pub values: Vec<(String, Value)>,
    /// Leaf directory, `None` when synthesized
    pub path: Option<PathBuf>,
    /// Leaf status
    pub status: StatusValue,
    /// Leaf origin
    pub source: NodeSource,
}

impl LeafRecord {
    /// Look up a value by map name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

impl DirectoryTree {
    /// Records for every complete leaf, in tree order
    #[must_use]
    pub fn leaf_records(&self) -> Vec<LeafRecord> {
        self.leaves()
            .into_iter()
            .filter(|&id| self.is_complete(id))
            .filter_map(|id| self.leaf_record(id))
            .collect()
    }

    /// Record for one leaf, merging every ancestor's attributes
    #[must_use]
    pub fn leaf_record(&self, id: NodeId) -> Option<LeafRecord> {
        let leaf = self.get(id)?;
        let mut chain: Vec<NodeId> = self.ancestors(id);
        chain.reverse();
        chain.push(id);

        let mut values = Vec::new();
        let mut extra = Vec::new();
        for node_id in chain {
            let node = &self.nodes[node_id.0];
            let level = match node.kind {
                NodeKind::Level(level) => Some(level),
                NodeKind::Run(_) => None,
                NodeKind::Root => continue,
            };
            for (key, value) in node.attributes.iter() {
                match level {
                    Some(level) if key == self.maps[level].token() => {
                        values.push((self.maps[level].name().to_string(), value.clone()));
                    }
                    _ => extra.push((key.to_string(), value.clone())),
                }
            }
        }
        values.extend(extra);

        Some(LeafRecord {
            node: id,
            values,
            path: leaf.path.clone(),
            status: leaf.status,
            source: leaf.source,
        })
    }
}
