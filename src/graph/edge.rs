use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Why a package depends on another: a small flag set over {main, test}.
///
/// An import that shows up both in regular sources and in `_test.go` files
/// carries both flags on a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DepKind(u8);

impl DepKind {
    /// Imported by the package's non-test sources.
    pub const MAIN: DepKind = DepKind(1 << 0);
    /// Imported only by the package's `_test.go` files.
    pub const TEST: DepKind = DepKind(1 << 1);

    /// Returns true if every flag in `other` is also set in `self`.
    pub fn contains(self, other: DepKind) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for DepKind {
    type Output = DepKind;

    fn bitor(self, rhs: DepKind) -> DepKind {
        DepKind(self.0 | rhs.0)
    }
}

impl BitOrAssign for DepKind {
    fn bitor_assign(&mut self, rhs: DepKind) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for DepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.contains(DepKind::MAIN), self.contains(DepKind::TEST)) {
            (true, true) => f.write_str("main+test"),
            (true, false) => f.write_str("main"),
            (false, true) => f.write_str("test"),
            (false, false) => f.write_str("none"),
        }
    }
}

/// Edge weight: package -> imported package.
/// `import_path` is the identifier as written in the importing package's source.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub import_path: String,
    pub kind: DepKind,
}
