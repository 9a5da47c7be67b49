use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;

use super::{SearchRoots, VENDOR_DIR};

/// Stat failure (other than not-found) while looking for a vendor directory.
#[derive(Debug, Error)]
#[error("could not check vendor dir in {}", dir.display())]
pub struct VendorProbeError {
    pub dir: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Answers whether a directory contains a vendor directory.
pub trait VendorProbe {
    fn has_vendor_dir(&self, dir: &Path) -> io::Result<bool>;
}

/// [`VendorProbe`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl VendorProbe for FsProbe {
    fn has_vendor_dir(&self, dir: &Path) -> io::Result<bool> {
        match std::fs::metadata(dir.join(VENDOR_DIR)) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Finds the governing directory for a requesting directory: the nearest
/// ancestor-or-self that holds a vendor directory, or the last directory
/// before a search-root boundary.
///
/// Results are memoized for every directory crossed on the way up, so
/// sibling packages resolve in O(1) after the first lookup.
pub struct VendorResolver<'p, P: VendorProbe + ?Sized> {
    probe: &'p P,
    roots: SearchRoots,
    memo: HashMap<PathBuf, PathBuf>,
}

impl<'p, P: VendorProbe + ?Sized> VendorResolver<'p, P> {
    pub fn new(probe: &'p P, roots: SearchRoots) -> Self {
        Self {
            probe,
            roots,
            memo: HashMap::new(),
        }
    }

    pub fn governing_dir(&mut self, start: &Path) -> Result<PathBuf, VendorProbeError> {
        let mut crossed: Vec<PathBuf> = Vec::new();
        let mut current = start.to_path_buf();

        let governing = loop {
            if let Some(hit) = self.memo.get(&current) {
                break hit.clone();
            }

            let has_vendor =
                self.probe
                    .has_vendor_dir(&current)
                    .map_err(|source| VendorProbeError {
                        dir: current.clone(),
                        source,
                    })?;
            crossed.push(current.clone());
            if has_vendor {
                break current;
            }

            // Stop below a boundary, and at the filesystem root.
            let next = match current.parent() {
                Some(parent) if parent != current && !self.roots.is_boundary(parent) => {
                    Some(parent.to_path_buf())
                }
                _ => None,
            };
            match next {
                Some(parent) => current = parent,
                None => break current,
            }
        };

        for dir in crossed {
            trace!(dir = %dir.display(), governing = %governing.display(), "vendor memo");
            self.memo.insert(dir, governing.clone());
        }

        Ok(governing)
    }
}
