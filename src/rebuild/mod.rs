pub mod matcher;

pub use matcher::PkgMatcher;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use petgraph::stable_graph::NodeIndex;
use tracing::debug;

use crate::graph::PackageGraph;

/// Extension of the files whose changes mark their directory as modified.
const GO_EXTENSION: &str = "go";

/// Why a package needs a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirtyReason {
    /// One of its imports needs a rebuild. `via` is that import's package name.
    Import { via: String },
    /// A Go file in its directory changed.
    Modified,
    /// A changed file declares an explicit dependency matching its directory.
    Explicit { pattern: String },
}

impl fmt::Display for DirtyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirtyReason::Import { via } => write!(f, "imports {via}"),
            DirtyReason::Modified => f.write_str("modified"),
            DirtyReason::Explicit { pattern } => write!(f, "matches {pattern}"),
        }
    }
}

/// Packages that need a rebuild, with the first reason found for each.
#[derive(Debug, Default)]
pub struct RebuildSet {
    dirty: HashMap<NodeIndex, DirtyReason>,
}

impl RebuildSet {
    pub fn contains(&self, idx: NodeIndex) -> bool {
        self.dirty.contains_key(&idx)
    }

    #[cfg(test)]
    pub fn reason(&self, idx: NodeIndex) -> Option<&DirtyReason> {
        self.dirty.get(&idx)
    }

    pub fn len(&self) -> usize {
        self.dirty.len()
    }

    /// Marks `idx` dirty. The first reason sticks; nodes are never un-marked.
    fn mark(&mut self, idx: NodeIndex, package: &str, reason: DirtyReason) {
        self.dirty.entry(idx).or_insert_with(|| {
            debug!(package, %reason, "dirty");
            reason
        });
    }

    /// Sorted names of the dirty packages that live under `workspace_root`.
    pub fn affected_packages(&self, graph: &PackageGraph, workspace_root: &Path) -> Vec<String> {
        let mut names: Vec<String> = self
            .dirty
            .keys()
            .map(|&idx| graph.node(idx))
            .filter(|node| !node.is_cgo() && node.dir.starts_with(workspace_root))
            .map(|node| node.name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Directories (joined onto `workspace_root`) containing a changed `.go` file.
pub fn modified_go_dirs(changed_files: &[String], workspace_root: &Path) -> HashSet<PathBuf> {
    changed_files
        .iter()
        .map(Path::new)
        .filter(|f| f.extension().is_some_and(|ext| ext == GO_EXTENSION))
        .map(|f| match f.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => workspace_root.join(parent),
            _ => workspace_root.to_path_buf(),
        })
        .collect()
}

/// Mark every package that needs a rebuild.
///
/// Packages are visited imports-first, so a single pass is enough: when a
/// package is reached, the state of everything it imports is already final.
/// A package is dirty if any import is dirty, if its directory was modified,
/// or if an explicit pattern matches its directory, checked in that order.
pub fn propagate(
    graph: &PackageGraph,
    modified_dirs: &HashSet<PathBuf>,
    matchers: &[PkgMatcher],
    workspace_root: &Path,
) -> RebuildSet {
    let mut set = RebuildSet::default();

    graph.topo_walk(|idx, node| {
        let dirty_import = graph
            .imports(idx)
            .map(|(_, child)| child)
            .find(|&child| set.contains(child));
        if let Some(child) = dirty_import {
            let via = graph.node(child).name.clone();
            set.mark(idx, &node.name, DirtyReason::Import { via });
            return;
        }

        if modified_dirs.contains(&node.dir) {
            set.mark(idx, &node.name, DirtyReason::Modified);
            return;
        }

        if let Some(m) = matchers.iter().find(|m| m.matches(workspace_root, &node.dir)) {
            let pattern = m.to_string();
            set.mark(idx, &node.name, DirtyReason::Explicit { pattern });
        }
    });

    set
}
