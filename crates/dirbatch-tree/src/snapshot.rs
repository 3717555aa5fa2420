//! Stage snapshots
//!
//! Renders the tree with a validity mark per node:
//! `✓` valid, `-` invalid with some valid leaf below, `x` otherwise.
//! Runs detached by flattening are listed under their parent.

use std::fmt::Write as _;
use std::fs;

use crate::error::TreeError;
use crate::node::NodeId;
use crate::tree::DirectoryTree;

impl DirectoryTree {
    /// Render the tree as text
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_node(&mut out, self.root(), "", "");
        out
    }

    fn mark(&self, id: NodeId) -> char {
        let node = &self.nodes[id.0];
        if node.status.is_valid() {
            '✓'
        } else if self.has_valid_leaf(id) {
            '-'
        } else {
            'x'
        }
    }

    fn render_node(&self, out: &mut String, id: NodeId, lead: &str, indent: &str) {
        let node = &self.nodes[id.0];
        let _ = write!(out, "{lead}[{}] {}", self.mark(id), node.name);
        if !node.status.is_valid() {
            if let Some(reason) = &node.reason {
                let _ = write!(out, " ({reason})");
            }
        }
        out.push('\n');

        let children: Vec<NodeId> = node.children.iter().chain(&node.runs).copied().collect();
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            let last = i + 1 == count;
            let (branch, next) = if last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            self.render_node(
                out,
                child,
                &format!("{indent}{branch}"),
                &format!("{indent}{next}"),
            );
        }
    }

    /// Write the snapshot of the current stage
    ///
    /// Does nothing when no snapshot directory is configured.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn write_snapshot(&self, label: &str) -> Result<(), TreeError> {
        let Some(dir) = &self.options.snapshot_dir else {
            return Ok(());
        };
        let mut file_name = format!("filter_stage_{:02}", self.stage);
        if !label.is_empty() {
            file_name.push('_');
            file_name.push_str(label);
        }
        file_name.push_str(".txt");

        let path = dir.join(file_name);
        fs::write(&path, self.render()).map_err(|source| TreeError::Snapshot {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Tree snapshot written to '{}'", path.display());
        Ok(())
    }
}
