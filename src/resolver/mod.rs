pub mod go_importer;
pub mod vendor;

pub use go_importer::{GoImporter, toolchain_goroot};
pub use vendor::{FsProbe, VendorProbe, VendorResolver};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::parser::ParseError;

/// Name of the directory that overrides import resolution for everything under its parent.
pub const VENDOR_DIR: &str = "vendor";

/// What the importer reports about one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedPackage {
    /// Directory holding the package sources.
    pub dir: PathBuf,
    /// Import paths used by non-test sources, sorted and unique.
    pub imports: Vec<String>,
    /// Import paths used by `_test.go` files, sorted and unique.
    pub test_imports: Vec<String>,
}

/// Failure of the importer to produce an [`ImportedPackage`].
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot find package {path:?} in any of the search roots (from {})", src_dir.display())]
    NotFound { path: String, src_dir: PathBuf },

    #[error("no buildable Go source files in {}", dir.display())]
    NoGoFiles { dir: PathBuf },

    #[error("could not read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {}", file.display())]
    Parse {
        file: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Resolves an import path, as seen from a source directory, into a package.
///
/// The source directory passed in is already the governing directory chosen by
/// the [`VendorResolver`], so implementations only need to apply their own
/// lookup rules relative to it.
pub trait Importer {
    fn import(&self, path: &str, src_dir: &Path) -> Result<ImportedPackage, ImportError>;
}

/// Directories at which the upward vendor walk stops: the Go workspace
/// (each GOPATH entry) and the standard library root (`GOROOT/src`).
#[derive(Debug, Clone, Default)]
pub struct SearchRoots {
    pub workspaces: Vec<PathBuf>,
    pub system: Option<PathBuf>,
}

impl SearchRoots {
    /// Returns true if `dir` is one of the boundary directories.
    pub fn is_boundary(&self, dir: &Path) -> bool {
        self.system.as_deref() == Some(dir) || self.workspaces.iter().any(|w| w == dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_boundary() {
        let roots = SearchRoots {
            workspaces: vec![PathBuf::from("/home/me/go"), PathBuf::from("/opt/go2")],
            system: Some(PathBuf::from("/usr/lib/go/src")),
        };
        assert!(roots.is_boundary(Path::new("/home/me/go")));
        assert!(roots.is_boundary(Path::new("/opt/go2")));
        assert!(roots.is_boundary(Path::new("/usr/lib/go/src")));
        assert!(!roots.is_boundary(Path::new("/home/me/go/src")));
        assert!(!roots.is_boundary(Path::new("/usr/lib/go")));
    }

    #[test]
    fn test_not_found_message_names_package() {
        let err = ImportError::NotFound {
            path: "example.com/missing".into(),
            src_dir: PathBuf::from("/gopath/src"),
        };
        let msg = err.to_string();
        assert!(msg.contains("example.com/missing"), "{msg}");
        assert!(msg.contains("/gopath/src"), "{msg}");
    }
}
