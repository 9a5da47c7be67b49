use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::stable_graph::NodeIndex;
use thiserror::Error;
use tracing::debug;

use super::PackageGraph;
use super::edge::DepKind;
use super::node::CGO_IMPORT_PATH;
use crate::resolver::vendor::VendorProbeError;
use crate::resolver::{ImportError, Importer, SearchRoots, VendorProbe, VendorResolver};

/// Failure while resolving one package or one of its transitive imports.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    VendorProbe(#[from] VendorProbeError),

    #[error("could not visit node {package}")]
    Import {
        package: String,
        #[source]
        source: ImportError,
    },

    #[error("could not visit child node of {package}")]
    Child {
        package: String,
        #[source]
        source: Box<ResolveError>,
    },
}

/// Failure to build the tree of one entry package.
#[derive(Debug, Error)]
#[error("could not build dependency tree for {package}")]
pub struct GraphError {
    pub package: String,
    #[source]
    pub source: ResolveError,
}

/// Memoization key: the same import path can resolve to different packages
/// depending on which vendor directory governs the importer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResolutionContext {
    governing: PathBuf,
    import_path: String,
}

/// Depth-first, memoized construction of a [`PackageGraph`].
struct GraphBuilder<'a, I: Importer + ?Sized, P: VendorProbe + ?Sized> {
    importer: &'a I,
    vendor: VendorResolver<'a, P>,
    graph: PackageGraph,
    seen: HashMap<ResolutionContext, NodeIndex>,
    /// Nodes whose imports are currently being visited, outermost first.
    /// A node found here again was reached through a test-import cycle.
    stack: Vec<NodeIndex>,
}

impl<'a, I: Importer + ?Sized, P: VendorProbe + ?Sized> GraphBuilder<'a, I, P> {
    fn new(importer: &'a I, probe: &'a P, roots: SearchRoots) -> Self {
        Self {
            importer,
            vendor: VendorResolver::new(probe, roots),
            graph: PackageGraph::new(),
            seen: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Visit `path` as imported from `src_dir`, and everything it imports.
    /// Children are complete before the parent returns, except when a test
    /// import loops back to a package still on the stack.
    fn visit(&mut self, src_dir: &Path, path: &str) -> Result<NodeIndex, ResolveError> {
        if path == CGO_IMPORT_PATH {
            return Ok(self.graph.cgo_node());
        }

        let governing = self.vendor.governing_dir(src_dir)?;
        let ctx = ResolutionContext {
            governing,
            import_path: path.to_owned(),
        };

        if let Some(&idx) = self.seen.get(&ctx) {
            if self.in_progress(idx) {
                debug!(package = path, "import cycle through test imports");
            }
            return Ok(idx);
        }

        let pkg = self
            .importer
            .import(path, &ctx.governing)
            .map_err(|source| ResolveError::Import {
                package: path.to_owned(),
                source,
            })?;

        // Reached before under another import path or vendor context.
        if let Some(existing) = self.graph.find_by_dir(&pkg.dir) {
            if self.in_progress(existing) {
                debug!(package = path, "import cycle through test imports");
            }
            self.seen.insert(ctx, existing);
            return Ok(existing);
        }

        let idx = self.graph.add_package(path, pkg.dir.clone());
        self.seen.insert(ctx, idx);
        self.stack.push(idx);

        let imports = pkg.imports.iter().map(|i| (i, DepKind::MAIN));
        let test_imports = pkg.test_imports.iter().map(|i| (i, DepKind::TEST));
        for (import, kind) in imports.chain(test_imports) {
            let child = self
                .visit(&pkg.dir, import)
                .map_err(|source| ResolveError::Child {
                    package: path.to_owned(),
                    source: Box::new(source),
                })?;
            self.graph.add_dependency(idx, child, import, kind);
        }

        self.stack.pop();
        Ok(idx)
    }

    /// True while `idx`'s imports are still being visited.
    fn in_progress(&self, idx: NodeIndex) -> bool {
        self.stack.contains(&idx)
    }
}

/// Build the import graph of `entries`, each resolved as if imported from `base_dir`.
///
/// Nodes are deduplicated by package directory; an import that appears in both
/// regular and test sources yields a single edge carrying both kinds.
pub fn build_graph<I, P>(
    entries: &[String],
    base_dir: &Path,
    importer: &I,
    probe: &P,
    roots: SearchRoots,
) -> Result<PackageGraph, GraphError>
where
    I: Importer + ?Sized,
    P: VendorProbe + ?Sized,
{
    let mut builder = GraphBuilder::new(importer, probe, roots);

    for entry in entries {
        let idx = builder
            .visit(base_dir, entry)
            .map_err(|source| GraphError {
                package: entry.clone(),
                source,
            })?;
        builder.graph.entries.insert(entry.clone(), idx);
    }

    debug!(
        packages = builder.graph.package_count(),
        dependencies = builder.graph.dependency_count(),
        entries = builder.graph.entries.len(),
        "built package graph"
    );
    Ok(builder.graph)
}
