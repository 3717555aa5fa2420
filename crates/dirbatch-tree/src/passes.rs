//! Status passes over the tree
//!
//! Every pass recomputes composite statuses bottom-up, bumps the stage
//! counter and writes a snapshot. Invalid leaves are flagged, never pruned.

use dirbatch_status::{StatusChain, StatusValue, TreeStatus};

use crate::error::TreeError;
use crate::node::NodeId;
use crate::tree::DirectoryTree;

/// Leaf counts after a status pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    /// Stage number of the pass
    pub stage: u32,
    /// Attached leaves
    pub leaves: usize,
    /// Attached leaves that are not valid
    pub flagged: usize,
}

/// Outcome of the depth check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthReport {
    /// Number of directory maps
    pub declared: usize,
    /// Deepest level found, virtual level excluded
    pub found: usize,
    /// Leaves newly flagged as incomplete
    pub incomplete: usize,
}

impl DirectoryTree {
    /// Recompute composite statuses and write a stage snapshot
    ///
    /// Internal nodes take their worst child; virtual parents take their
    /// best run.
    ///
    /// # Errors
    /// Returns error if a status kind is unregistered or the snapshot
    /// cannot be written.
    pub fn update_status(
        &mut self,
        chain: &StatusChain,
        label: &str,
    ) -> Result<StageReport, TreeError> {
        self.stage += 1;

        for id in self.preorder().into_iter().rev() {
            let node = &self.nodes[id.0];
            if node.is_leaf() {
                continue;
            }
            let children: Vec<StatusValue> =
                node.children.iter().map(|c| self.nodes[c.0].status).collect();
            let composite = if node.is_virtual_parent {
                chain.best(children)?
            } else {
                chain.worst(children)?
            };
            if let Some(status) = composite {
                self.nodes[id.0].status = status;
            }
        }

        let leaves = self.leaves();
        let flagged = leaves
            .iter()
            .filter(|id| !self.nodes[id.0].status.is_valid())
            .count();
        tracing::info!(
            "Flagging {} out of {} leaves in filter stage {} '{}'",
            flagged,
            leaves.len(),
            self.stage,
            label
        );

        self.write_snapshot(label)?;
        Ok(StageReport {
            stage: self.stage,
            leaves: leaves.len(),
            flagged,
        })
    }

    /// Compare tree depth with the declared maps and flag incomplete leaves
    ///
    /// # Errors
    /// Returns [`TreeError::DepthExceeded`] if the tree is deeper than the
    /// declared maps.
    pub fn check_depth(&mut self, chain: &StatusChain) -> Result<DepthReport, TreeError> {
        let declared = self.maps.len();
        let leaves = self.leaves();
        let max_depth = leaves
            .iter()
            .map(|id| self.nodes[id.0].depth)
            .max()
            .unwrap_or(0);
        let found = if self.has_virtual {
            max_depth.saturating_sub(1)
        } else {
            max_depth
        };

        if found > declared {
            tracing::error!(
                "Max tree depth greater than number of directory maps: specified {}, found {}",
                declared,
                found
            );
            return Err(TreeError::DepthExceeded { declared, found });
        }
        if found < declared {
            tracing::warn!(
                "No directories exist at specified directory map depth: specified {}, found {}",
                declared,
                found
            );
        }

        let mut incomplete = 0;
        for id in leaves {
            if self.is_complete(id) {
                continue;
            }
            let node = &mut self.nodes[id.0];
            if node.reason.is_none() {
                node.reason = Some(format!(
                    "incomplete: stops at depth {} of {}",
                    node.depth, declared
                ));
            }
            node.status = TreeStatus::Invalid.into();
            incomplete += 1;
        }

        self.update_status(chain, "depth_check")?;
        Ok(DepthReport {
            declared,
            found,
            incomplete,
        })
    }

    /// Collapse each virtual parent onto its best run
    ///
    /// The run with the most valid status wins; ties go to the greatest
    /// name. The winner's name, path, status and suffix move onto the
    /// parent and all runs are detached into [`Node::runs`](crate::Node::runs).
    ///
    /// # Errors
    /// Returns error if a status kind is unregistered.
    pub fn flatten_virtual_leaves(&mut self, chain: &StatusChain) -> Result<usize, TreeError> {
        let parents = self.virtual_parents();
        for &parent in &parents {
            let winner = self.pick_run(chain, parent)?;
            let Some(winner) = winner else {
                continue;
            };
            let run = self.nodes[winner.0].clone();
            tracing::debug!(
                "Flattening virtual directory '{}' onto run '{}'",
                self.nodes[parent.0].name,
                run.name
            );

            let node = &mut self.nodes[parent.0];
            node.name = run.name;
            node.path = run.path;
            node.status = run.status;
            node.reason = run.reason;
            node.source = run.source;
            for (key, value) in run.attributes.iter() {
                node.attributes.insert(key, value.clone());
            }
            node.is_virtual_parent = false;
            node.runs = std::mem::take(&mut node.children);
        }
        if !parents.is_empty() {
            tracing::info!("Flattened {} virtual directories", parents.len());
        }
        Ok(parents.len())
    }

    fn pick_run(&self, chain: &StatusChain, parent: NodeId) -> Result<Option<NodeId>, TreeError> {
        let mut best: Option<(u32, NodeId)> = None;
        for &child in &self.nodes[parent.0].children {
            let id = chain.global_id(self.nodes[child.0].status)?;
            let better = match best {
                None => true,
                Some((best_id, best_node)) => {
                    id < best_id
                        || (id == best_id
                            && self.nodes[child.0].name > self.nodes[best_node.0].name)
                }
            };
            if better {
                best = Some((id, child));
            }
        }
        Ok(best.map(|(_, id)| id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::DirectoryMap;
    use crate::node::{Node, NodeKind};
    use crate::tree::TreeOptions;
    use dirbatch_parser::{Attributes, Preprocessor, Validator, ValidatorParser, ValueParser};
    use std::path::Path;

    fn tree(levels: usize) -> DirectoryTree {
        let maps = (0..levels)
            .map(|i| {
                DirectoryMap::new(
                    format!("m{i}"),
                    ValidatorParser::starts_with(ValueParser::integer()),
                )
            })
            .collect();
        DirectoryTree::new(Path::new("/r"), maps, TreeOptions::new()).unwrap()
    }

    fn chain() -> StatusChain {
        let mut chain = StatusChain::new();
        chain.ensure::<TreeStatus>().unwrap();
        chain
    }

    fn level(name: &str, map: usize, status: TreeStatus) -> Node {
        Node::new(name, NodeKind::Level(map), status.into())
            .with_attributes(Attributes::single(format!("m{map}"), 1_i64))
    }

    #[test]
    fn worst_child_dominates() {
        let chain = chain();
        let mut t = tree(2);
        let p = t.push(t.root(), level("m01", 0, TreeStatus::Valid));
        t.push(p, level("m11", 1, TreeStatus::Valid));
        t.push(p, level("m12", 1, TreeStatus::Invalid));
        t.push(p, level("m13", 1, TreeStatus::Partial));

        let report = t.update_status(&chain, "test").unwrap();
        assert_eq!(t.get(p).unwrap().status(), TreeStatus::Invalid.into());
        assert_eq!(t.get(t.root()).unwrap().status(), TreeStatus::Invalid.into());
        assert_eq!(report.leaves, 3);
        assert_eq!(report.flagged, 2);
        assert_eq!(report.stage, 1);
    }

    #[test]
    fn shallow_leaves_are_flagged() {
        let chain = chain();
        let mut t = tree(2);
        let full = t.push(t.root(), level("m01", 0, TreeStatus::Valid));
        let leaf = t.push(full, level("m11", 1, TreeStatus::Valid));
        let shallow = t.push(t.root(), level("m02", 0, TreeStatus::Valid));

        let report = t.check_depth(&chain).unwrap();
        assert_eq!(report.found, 2);
        assert_eq!(report.incomplete, 1);
        assert!(t.get(leaf).unwrap().status().is_valid());
        assert!(!t.get(shallow).unwrap().status().is_valid());
        assert!(t.get(shallow).unwrap().reason().unwrap().contains("depth 1 of 2"));
    }

    #[test]
    fn deeper_than_declared_is_fatal() {
        let chain = chain();
        let mut t = tree(1);
        let a = t.push(t.root(), level("m01", 0, TreeStatus::Valid));
        t.push(a, level("m02", 0, TreeStatus::Valid));

        assert!(matches!(
            t.check_depth(&chain),
            Err(TreeError::DepthExceeded {
                declared: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn tie_break_picks_greatest_name_among_best() {
        let chain = chain();
        let parser = ValidatorParser::new(Validator::match_first("_"), ValueParser::integer())
            .with_preprocessor(Preprocessor::job_id("_"));
        let maps = vec![DirectoryMap::new("cd", parser)];
        let mut t = DirectoryTree::new(Path::new("/r"), maps, TreeOptions::new()).unwrap();

        let mut group = Node::new("cd_1", NodeKind::Level(0), TreeStatus::Valid.into())
            .with_attributes(Attributes::single("cd", 1_i64));
        group.is_virtual_parent = true;
        let vp = t.push(t.root(), group);
        for (name, status) in [
            ("run_A", TreeStatus::Invalid),
            ("run_B", TreeStatus::Valid),
            ("run_C", TreeStatus::Valid),
        ] {
            let run = Node::new(name, NodeKind::Run(0), status.into())
                .with_path(format!("/r/{name}").into())
                .with_attributes(Attributes::single("jobid", name));
            t.push(vp, run);
        }
        t.has_virtual = true;

        t.update_status(&chain, "grouped").unwrap();
        assert!(t.get(vp).unwrap().status().is_valid());

        assert_eq!(t.flatten_virtual_leaves(&chain).unwrap(), 1);
        let node = t.get(vp).unwrap();
        assert_eq!(node.name(), "run_C");
        assert_eq!(node.path(), Some(Path::new("/r/run_C")));
        assert_eq!(node.runs().len(), 3);
        assert!(node.is_leaf());
        assert!(!node.is_virtual_parent());
        assert_eq!(
            node.attributes().get("jobid"),
            Some(&dirbatch_parser::Value::from("run_C"))
        );
        assert!(t.is_complete(vp));
    }
}
