//! GOPATH-mode Go package importer.
//!
//! Resolves an import path as seen from a source directory, in this order:
//! 1. relative paths (`./x`, `../x`) against the source directory. The graph
//!    builder passes the governing vendor directory here, not the importing
//!    package's own directory, so relative imports resolve from there.
//! 2. `vendor/<path>` in the source directory and each ancestor up to the
//!    `src` directory of the root that contains it, innermost first
//! 3. `$GOROOT/src/<path>`
//! 4. `<gopath entry>/src/<path>` for each GOPATH entry, in order
//!
//! The package directory's `.go` files that match the build context (file
//! name suffix and header constraint) are then parsed with tree-sitter to
//! collect its regular and test imports.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, warn};

use super::{ImportError, ImportedPackage, Importer, SearchRoots, VENDOR_DIR};
use crate::parser::{BuildContext, parse_go_file};

/// Importer over a GOROOT and a list of GOPATH workspaces.
#[derive(Debug, Clone)]
pub struct GoImporter {
    goroot: Option<PathBuf>,
    gopath: Vec<PathBuf>,
    build: BuildContext,
}

impl GoImporter {
    pub fn new(goroot: Option<PathBuf>, gopath: Vec<PathBuf>) -> Self {
        Self {
            goroot,
            gopath,
            build: BuildContext::host(),
        }
    }

    /// Evaluate file name suffixes and build constraints against `build`
    /// instead of the host platform.
    pub fn with_build_context(mut self, build: BuildContext) -> Self {
        self.build = build;
        self
    }

    /// Build an importer from raw setting values.
    ///
    /// `gopath` is a platform path list (`:`-separated on Unix). When it is
    /// absent or empty, `$HOME/go` is used, matching the go tool's default.
    pub fn from_settings(goroot: Option<PathBuf>, gopath: Option<&OsStr>) -> Self {
        let mut entries: Vec<PathBuf> = gopath
            .map(|list| {
                std::env::split_paths(list)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if entries.is_empty() {
            if let Some(home) = std::env::var_os("HOME") {
                entries.push(PathBuf::from(home).join("go"));
            }
        }

        Self::new(goroot.filter(|r| !r.as_os_str().is_empty()), entries)
    }

    /// Boundaries for the vendor walk: every GOPATH entry and `GOROOT/src`.
    pub fn search_roots(&self) -> SearchRoots {
        SearchRoots {
            workspaces: self.gopath.clone(),
            system: self.goroot.as_ref().map(|r| r.join("src")),
        }
    }

    /// `src` directories of GOROOT and every GOPATH entry.
    fn src_roots(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.goroot
            .iter()
            .chain(self.gopath.iter())
            .map(|root| root.join("src"))
    }

    fn find_dir(&self, path: &str, src_dir: &Path) -> Option<PathBuf> {
        if is_relative_import(path) {
            let dir = clean(&src_dir.join(path));
            return dir.is_dir().then_some(dir);
        }

        // Vendor directories only apply inside a source root.
        if let Some(src_root) = self.src_roots().find(|root| src_dir.starts_with(root)) {
            for ancestor in src_dir.ancestors() {
                if !ancestor.starts_with(&src_root) {
                    break;
                }
                let candidate = ancestor.join(VENDOR_DIR).join(path);
                if candidate.is_dir() && has_go_files(&candidate) {
                    return Some(candidate);
                }
            }
        }

        self.src_roots()
            .map(|root| root.join(path))
            .find(|candidate| candidate.is_dir())
    }

    fn read_package(&self, dir: PathBuf) -> Result<ImportedPackage, ImportError> {
        let files = go_files(&dir)?;
        if files.is_empty() {
            return Err(ImportError::NoGoFiles { dir });
        }

        let mut imports = BTreeSet::new();
        let mut test_imports = BTreeSet::new();
        let mut parsed_any = false;

        for file in files {
            let name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if !self.build.matches_file_name(name) {
                debug!(file = %file.display(), "skipping file for another platform");
                continue;
            }
            let source = std::fs::read(&file).map_err(|source| ImportError::Io {
                path: file.clone(),
                source,
            })?;
            if !self.build.matches_header(&source) {
                debug!(file = %file.display(), "skipping file excluded by build constraint");
                continue;
            }
            let parsed = parse_go_file(&file, &source).map_err(|source| ImportError::Parse {
                file: file.clone(),
                source,
            })?;
            parsed_any = true;

            let target = if parsed.is_test {
                &mut test_imports
            } else {
                &mut imports
            };
            target.extend(parsed.imports);
        }

        if !parsed_any {
            return Err(ImportError::NoGoFiles { dir });
        }

        Ok(ImportedPackage {
            dir,
            imports: imports.into_iter().collect(),
            test_imports: test_imports.into_iter().collect(),
        })
    }
}

/// GOROOT of the installed Go toolchain, from `go env GOROOT`.
///
/// `None` when `go` is not on PATH or reports nothing.
pub async fn toolchain_goroot() -> Option<PathBuf> {
    goroot_from(OsStr::new("go")).await
}

async fn goroot_from(go: &OsStr) -> Option<PathBuf> {
    let output = match Command::new(go).args(["env", "GOROOT"]).output().await {
        Ok(output) => output,
        Err(err) => {
            warn!(%err, "GOROOT is not set and the go tool is unavailable; standard library imports will not resolve");
            return None;
        }
    };
    if !output.status.success() {
        warn!(status = %output.status, "go env GOROOT failed");
        return None;
    }
    let root = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if root.is_empty() {
        return None;
    }
    debug!(goroot = %root, "GOROOT from go env");
    Some(PathBuf::from(root))
}

impl Importer for GoImporter {
    fn import(&self, path: &str, src_dir: &Path) -> Result<ImportedPackage, ImportError> {
        let dir = self
            .find_dir(path, src_dir)
            .ok_or_else(|| ImportError::NotFound {
                path: path.to_owned(),
                src_dir: src_dir.to_path_buf(),
            })?;
        debug!(import = path, dir = %dir.display(), "resolved import");
        self.read_package(dir)
    }
}

fn is_relative_import(path: &str) -> bool {
    path == "." || path == ".." || path.starts_with("./") || path.starts_with("../")
}

/// Buildable Go files in `dir`, sorted. Names starting with `_` or `.` are
/// ignored by the go tool and skipped here too.
fn go_files(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ImportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ImportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".go") || name.starts_with('_') || name.starts_with('.') {
            continue;
        }
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn has_go_files(dir: &Path) -> bool {
    go_files(dir).map(|files| !files.is_empty()).unwrap_or(false)
}

/// Lexically normalize a path: drop `.` components and fold `..` into its parent.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
