use std::borrow::Cow;
use std::fmt;
use std::path::{Component, Path};

use crate::resolver::VENDOR_DIR;

/// Package directory pattern from the `[deps]` config table.
///
/// - `./` prefix: relative to the workspace root.
/// - `...` suffix: prefix match; otherwise the directory must match exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgMatcher {
    path: String,
    is_relative: bool,
    is_prefix: bool,
}

impl PkgMatcher {
    pub fn parse(pattern: &str) -> Self {
        let (path, is_relative) = match pattern.strip_prefix("./") {
            Some(rest) => (rest, true),
            None => (pattern, false),
        };
        let (path, is_prefix) = match path.strip_suffix("...") {
            Some(rest) => (rest, true),
            None => (path, false),
        };

        Self {
            path: path.to_owned(),
            is_relative,
            is_prefix,
        }
    }

    /// Returns true if `dir` is selected by this pattern. Vendored packages
    /// never match.
    pub fn matches(&self, workspace_root: &Path, dir: &Path) -> bool {
        if is_vendored(dir) {
            return false;
        }

        let pattern: Cow<'_, str> = if self.is_relative {
            Cow::Owned(join_trimmed(workspace_root, &self.path))
        } else {
            Cow::Borrowed(&self.path)
        };

        let candidate = dir.to_string_lossy();
        if self.is_prefix {
            candidate.starts_with(pattern.as_ref())
        } else {
            candidate == pattern
        }
    }
}

impl fmt::Display for PkgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_relative {
            f.write_str("./")?;
        }
        f.write_str(&self.path)?;
        if self.is_prefix {
            f.write_str("...")?;
        }
        Ok(())
    }
}

fn is_vendored(dir: &Path) -> bool {
    dir.components()
        .any(|c| matches!(c, Component::Normal(name) if name == VENDOR_DIR))
}

/// `root/path` as a string without trailing separators.
fn join_trimmed(root: &Path, path: &str) -> String {
    let joined = root.join(path).to_string_lossy().into_owned();
    let trimmed = joined.trim_end_matches(std::path::MAIN_SEPARATOR);
    if trimmed.is_empty() {
        joined
    } else {
        trimmed.to_owned()
    }
}
