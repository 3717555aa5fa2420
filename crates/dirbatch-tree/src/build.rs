//! Filesystem crawl
//!
//! Recursive descent consuming one directory map per level. Names a parser
//! rejects become invalid leaves with a reason, and so do subdirectories
//! that cannot be listed. Runs that share a name
//! apart from their suffix are grouped under one virtual parent.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dirbatch_parser::Attributes;
use dirbatch_status::{StatusChain, TreeStatus};
use walkdir::WalkDir;

use crate::error::TreeError;
use crate::map::DirectoryMap;
use crate::node::{Node, NodeId, NodeKind, NodeSource};
use crate::tree::{DirectoryTree, TreeOptions};

struct Accepted {
    name: String,
    path: PathBuf,
    attributes: Attributes,
}

impl DirectoryTree {
    /// Crawl `root` and build the tree
    ///
    /// Runs the first status pass (`dir_mapping`) before returning.
    ///
    /// # Errors
    /// Returns error on structural violations: missing root, parser
    /// failures, malformed parser output, or mixed suffix siblings.
    pub fn build(
        root: &Path,
        maps: Vec<DirectoryMap>,
        options: TreeOptions,
        chain: &mut StatusChain,
    ) -> Result<Self, TreeError> {
        if !root.is_dir() {
            return Err(TreeError::MissingRoot(root.to_path_buf()));
        }
        chain.ensure::<TreeStatus>()?;

        let mut tree = Self::new(root, maps, options)?;
        tracing::info!(
            "Crawling '{}' with {} directory maps",
            root.display(),
            tree.maps.len()
        );
        let root_id = tree.root();
        tree.build_level(root_id, root, 0)?;
        tree.update_status(chain, "dir_mapping")?;
        Ok(tree)
    }

    fn build_level(&mut self, parent: NodeId, dir: &Path, level: usize) -> Result<(), TreeError> {
        let map = self.maps[level].clone();
        let is_last = level + 1 == self.maps.len();
        let reserved = if parent == self.root() {
            self.options.reserved.clone()
        } else {
            None
        };

        let mut accepted = Vec::new();
        for (name, path) in list_subdirs(dir, reserved.as_deref())? {
            let parsed = map
                .parser()
                .forward(map.token(), &name)
                .map_err(|source| TreeError::parser(map.name(), &name, source))?;

            match parsed {
                Some(attributes) => {
                    check_output(&map, &name, &attributes, is_last)?;
                    accepted.push(Accepted {
                        name,
                        path,
                        attributes,
                    });
                }
                None => {
                    tracing::warn!(
                        "Subfolder '{}' did not parse for directory map '{}' at path '{}'",
                        name,
                        map.name(),
                        dir.display()
                    );
                    let node = Node::new(&name, NodeKind::Level(level), TreeStatus::Invalid.into())
                        .with_path(path);
                    let id = self.push(parent, node);
                    self.nodes[id.0].reason =
                        Some(format!("name does not match directory map '{}'", map.name()));
                }
            }
        }

        let with_suffix = accepted.iter().filter(|a| a.attributes.is_virtual()).count();
        if with_suffix > 0 && with_suffix < accepted.len() {
            return Err(TreeError::MixedVirtualSiblings {
                path: dir.to_path_buf(),
                with_suffix,
                without_suffix: accepted.len() - with_suffix,
            });
        }

        if with_suffix > 0 {
            return self.group_runs(parent, level, &map, accepted);
        }

        for item in accepted {
            let node = Node::new(&item.name, NodeKind::Level(level), TreeStatus::Valid.into())
                .with_path(item.path.clone())
                .with_attributes(item.attributes);
            let id = self.push(parent, node);
            if is_last {
                continue;
            }
            match self.build_level(id, &item.path, level + 1) {
                Ok(()) => {}
                Err(err @ TreeError::Walk { .. }) => {
                    tracing::warn!("Flagging '{}': {}", item.path.display(), err);
                    let node = &mut self.nodes[id.0];
                    node.status = TreeStatus::Invalid.into();
                    node.reason = Some(err.to_string());
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn group_runs(
        &mut self,
        parent: NodeId,
        level: usize,
        map: &DirectoryMap,
        accepted: Vec<Accepted>,
    ) -> Result<(), TreeError> {
        let mut groups: BTreeMap<String, (Attributes, Vec<Accepted>)> = BTreeMap::new();
        for mut item in accepted {
            let suffix = item.attributes.take_suffix();
            let canonical = map
                .parser()
                .reverse(map.token(), &item.attributes)
                .map_err(|source| TreeError::parser(map.name(), &item.name, source))?;
            let attributes = item.attributes.clone();
            if let Some(suffix) = suffix {
                item.attributes = Attributes::single(suffix.name, suffix.value);
            }
            groups
                .entry(canonical)
                .or_insert_with(|| (attributes, Vec::new()))
                .1
                .push(item);
        }

        for (canonical, (attributes, runs)) in groups {
            tracing::debug!(
                "Grouping {} runs under virtual directory '{}'",
                runs.len(),
                canonical
            );
            let mut node = Node::new(canonical, NodeKind::Level(level), TreeStatus::Valid.into())
                .with_attributes(attributes)
                .with_source(NodeSource::Virtual);
            node.is_virtual_parent = true;
            let group = self.push(parent, node);

            for run in runs {
                let node = Node::new(run.name, NodeKind::Run(level), TreeStatus::Valid.into())
                    .with_path(run.path)
                    .with_attributes(run.attributes);
                self.push(group, node);
            }
        }
        self.has_virtual = true;
        Ok(())
    }
}

fn list_subdirs(dir: &Path, reserved: Option<&str>) -> Result<Vec<(String, PathBuf)>, TreeError> {
    let mut out = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(TreeError::Walk {
                    path: dir.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                tracing::warn!("Skipping unreadable entry in '{}': {}", dir.display(), err);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            tracing::warn!("Skipping non UTF-8 directory name at '{}'", entry.path().display());
            continue;
        };
        if reserved == Some(name) {
            continue;
        }
        out.push((name.to_string(), entry.into_path()));
    }
    Ok(out)
}

fn check_output(
    map: &DirectoryMap,
    name: &str,
    attributes: &Attributes,
    is_last: bool,
) -> Result<(), TreeError> {
    let value = attributes.get(map.token()).ok_or_else(|| {
        TreeError::malformed(map.name(), name, format!("missing value for '{}'", map.token()))
    })?;
    if value.value_type() != map.value_type() {
        return Err(TreeError::malformed(
            map.name(),
            name,
            format!(
                "expected {} value, got {}",
                map.value_type(),
                value.value_type()
            ),
        ));
    }
    if attributes.is_virtual() && !is_last {
        return Err(TreeError::malformed(
            map.name(),
            name,
            "suffix returned by a level other than the last",
        ));
    }
    if attributes.is_virtual() && !map.has_suffix() {
        return Err(TreeError::malformed(
            map.name(),
            name,
            "suffix returned by a parser that does not declare one",
        ));
    }
    Ok(())
}
