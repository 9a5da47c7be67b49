use std::path::PathBuf;

/// Import path of the cgo pseudo-package.
pub const CGO_IMPORT_PATH: &str = "C";

/// A resolved Go package.
///
/// One node exists per physical directory for the lifetime of a build; every
/// import path or vendor context that resolves to the same directory shares it.
#[derive(Debug, Clone)]
pub struct PackageNode {
    /// The import path under which the package was first requested.
    pub name: String,
    /// Directory holding the package sources. Empty for the cgo sentinel.
    pub dir: PathBuf,
}

impl PackageNode {
    /// The node standing in for `import "C"`. It is never handed to the importer
    /// and has no imports of its own.
    pub fn cgo() -> Self {
        Self {
            name: CGO_IMPORT_PATH.to_owned(),
            dir: PathBuf::new(),
        }
    }

    pub fn is_cgo(&self) -> bool {
        self.name == CGO_IMPORT_PATH && self.dir.as_os_str().is_empty()
    }
}
