pub mod builder;
pub mod edge;
pub mod node;

pub use builder::{GraphError, build_graph};

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use petgraph::Directed;
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{DfsPostOrder, EdgeRef};

use edge::{DepKind, Dependency};
use node::PackageNode;

/// The package import graph: a directed petgraph StableGraph plus the lookup
/// indexes the builder and the rebuild pass need.
#[derive(Debug)]
pub struct PackageGraph {
    /// Package -> imported package edges.
    pub graph: StableGraph<PackageNode, Dependency, Directed>,
    /// Maps a package directory to its node. This is the deduplication key.
    pub dir_index: HashMap<PathBuf, NodeIndex>,
    /// Requested package identifiers and their root nodes.
    pub entries: BTreeMap<String, NodeIndex>,
    /// Lazily created sentinel for `import "C"`.
    cgo: Option<NodeIndex>,
}

impl PackageGraph {
    /// Create an empty package graph.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            dir_index: HashMap::new(),
            entries: BTreeMap::new(),
            cgo: None,
        }
    }

    /// Add a package node for `dir`. If the directory already has a node, the
    /// existing index is returned and `name` is ignored.
    pub fn add_package(&mut self, name: &str, dir: PathBuf) -> NodeIndex {
        if let Some(&existing) = self.dir_index.get(&dir) {
            return existing;
        }
        let idx = self.graph.add_node(PackageNode {
            name: name.to_owned(),
            dir: dir.clone(),
        });
        self.dir_index.insert(dir, idx);
        idx
    }

    /// The shared cgo sentinel node, created on first use.
    pub fn cgo_node(&mut self) -> NodeIndex {
        if let Some(idx) = self.cgo {
            return idx;
        }
        let idx = self.graph.add_node(PackageNode::cgo());
        self.cgo = Some(idx);
        idx
    }

    pub fn find_by_dir(&self, dir: &Path) -> Option<NodeIndex> {
        self.dir_index.get(dir).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &PackageNode {
        &self.graph[idx]
    }

    /// Record that `from` imports `to` under `import_path`.
    ///
    /// At most one edge exists per (importer, import path); discovering it
    /// again ORs the new kind into the existing edge.
    pub fn add_dependency(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        import_path: &str,
        kind: DepKind,
    ) -> EdgeIndex {
        let existing = self
            .graph
            .edges_directed(from, Direction::Outgoing)
            .find(|e| e.weight().import_path == import_path)
            .map(|e| e.id());

        match existing {
            Some(id) => {
                self.graph[id].kind |= kind;
                id
            }
            None => self.graph.add_edge(
                from,
                to,
                Dependency {
                    import_path: import_path.to_owned(),
                    kind,
                },
            ),
        }
    }

    /// The edge from `from` for `import_path`, if any.
    #[cfg(test)]
    pub fn dependency(&self, from: NodeIndex, import_path: &str) -> Option<(&Dependency, NodeIndex)> {
        self.imports(from).find(|(dep, _)| dep.import_path == import_path)
    }

    /// Outgoing import edges of `idx` with their target nodes.
    pub fn imports(&self, idx: NodeIndex) -> impl Iterator<Item = (&Dependency, NodeIndex)> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.weight(), e.target()))
    }

    pub fn package_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Visit every node reachable from the entries exactly once, imports
    /// before importers (post-order DFS). Entries are walked in sorted order
    /// and share one visited set, so common subgraphs are not revisited.
    pub fn topo_walk<F>(&self, mut visit: F)
    where
        F: FnMut(NodeIndex, &PackageNode),
    {
        let mut dfs = DfsPostOrder::empty(&self.graph);
        for &entry in self.entries.values() {
            dfs.move_to(entry);
            while let Some(idx) = dfs.next(&self.graph) {
                visit(idx, &self.graph[idx]);
            }
        }
    }
}

impl Default for PackageGraph {
    fn default() -> Self {
        Self::new()
    }
}
