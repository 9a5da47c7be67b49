//! Build-constraint matching for Go source files.
//!
//! A file takes part in a build only if its name suffix (`_linux.go`,
//! `_windows_amd64_test.go`, ...) and its header constraint (`//go:build`,
//! or the older `// +build` lines) both match the target platform.

use thiserror::Error;
use tracing::debug;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// Systems satisfying the `unix` tag.
const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Target platform that build constraints are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
}

impl BuildContext {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
        }
    }

    /// The platform this binary runs on, in Go's naming.
    pub fn host() -> Self {
        let goos = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let goarch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "loongarch64" => "loong64",
            "wasm32" => "wasm",
            "powerpc" => "ppc",
            "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
            "powerpc64" => "ppc64",
            "mips" if cfg!(target_endian = "little") => "mipsle",
            "mips64" if cfg!(target_endian = "little") => "mips64le",
            other => other,
        };
        Self::new(goos, goarch)
    }

    /// Host platform with `GOOS`/`GOARCH`-style overrides applied.
    pub fn from_settings(goos: Option<String>, goarch: Option<String>) -> Self {
        let host = Self::host();
        Self {
            goos: goos.filter(|s| !s.is_empty()).unwrap_or(host.goos),
            goarch: goarch.filter(|s| !s.is_empty()).unwrap_or(host.goarch),
        }
    }

    /// Whether a single build tag holds. Unknown tags are false.
    pub fn matches_tag(&self, tag: &str) -> bool {
        if tag == self.goos || tag == self.goarch {
            return true;
        }
        match tag {
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            "linux" => self.goos == "android",
            "darwin" => self.goos == "ios",
            "solaris" => self.goos == "illumos",
            "gc" | "cgo" => true,
            _ => is_release_tag(tag),
        }
    }

    /// Whether the `_GOOS`, `_GOARCH` or `_GOOS_GOARCH` suffix of a file name
    /// (before `.go` and an optional `_test`) matches. Names without such a
    /// suffix always match.
    pub fn matches_file_name(&self, name: &str) -> bool {
        let stem = name.split('.').next().unwrap_or(name);
        let Some(i) = stem.find('_') else {
            return true;
        };
        let mut parts: Vec<&str> = stem[i..].split('_').collect();
        if parts.last() == Some(&"test") {
            parts.pop();
        }

        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 2]) && self.matches_tag(parts[n - 1]);
        }
        if n >= 1 && (KNOWN_OS.contains(&parts[n - 1]) || KNOWN_ARCH.contains(&parts[n - 1])) {
            return self.matches_tag(parts[n - 1]);
        }
        true
    }

    /// Whether the constraint in the file header matches.
    ///
    /// Only comment lines before the `package` clause count. A `//go:build`
    /// line wins over `// +build` lines. Files whose expression does not
    /// parse are kept.
    pub fn matches_header(&self, source: &[u8]) -> bool {
        let text = String::from_utf8_lossy(source);
        let mut plus_build = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !line.starts_with("//") {
                break;
            }
            if let Some(expr) = line.strip_prefix("//go:build") {
                if !expr.is_empty() && !expr.starts_with([' ', '\t']) {
                    continue;
                }
                return match parse_expr(expr) {
                    Ok(constraint) => constraint.eval(self),
                    Err(err) => {
                        debug!(constraint = expr.trim(), %err, "unparsable build constraint");
                        true
                    }
                };
            }
            if let Some(rest) = line.strip_prefix("//") {
                if let Some(terms) = rest.trim_start().strip_prefix("+build") {
                    plus_build.push(terms.to_owned());
                }
            }
        }

        plus_build.iter().all(|terms| self.matches_plus_build(terms))
    }

    /// `// +build a,!b c`: space-separated alternatives of comma-separated
    /// conjunctions.
    fn matches_plus_build(&self, terms: &str) -> bool {
        terms.split_whitespace().any(|alternative| {
            alternative.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !self.matches_tag(tag),
                None => self.matches_tag(term),
            })
        })
    }
}

/// `go1.N` release tags. Every release is considered satisfied.
fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

/// A parsed `//go:build` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Tag(String),
    Not(Box<Constraint>),
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
}

impl Constraint {
    pub fn eval(&self, ctx: &BuildContext) -> bool {
        match self {
            Constraint::Tag(tag) => ctx.matches_tag(tag),
            Constraint::Not(inner) => !inner.eval(ctx),
            Constraint::And(a, b) => a.eval(ctx) && b.eval(ctx),
            Constraint::Or(a, b) => a.eval(ctx) || b.eval(ctx),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConstraintError {
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Tag(&'a str),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Result<Vec<Token<'_>>, ConstraintError> {
    let bytes = expr.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' => i += 1,
            b'!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            b'(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b'&' if bytes.get(i + 1) == Some(&b'&') => {
                tokens.push(Token::And);
                i += 2;
            }
            b'|' if bytes.get(i + 1) == Some(&b'|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            b if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
                {
                    i += 1;
                }
                tokens.push(Token::Tag(&expr[start..i]));
            }
            _ => {
                return Err(ConstraintError {
                    message: "unexpected character",
                });
            }
        }
    }
    Ok(tokens)
}

/// Parse a `//go:build` expression (the text after `//go:build`).
pub fn parse_expr(expr: &str) -> Result<Constraint, ConstraintError> {
    let tokens = tokenize(expr)?;
    let mut parser = ExprParser { tokens, pos: 0 };
    let constraint = parser.or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ConstraintError {
            message: "unexpected token",
        });
    }
    Ok(constraint)
}

/// Recursive descent: `or := and ("||" and)*`, `and := not ("&&" not)*`,
/// `not := "!" not | "(" or ")" | tag`.
struct ExprParser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Token<'_>> {
        self.tokens.get(self.pos)
    }

    fn or(&mut self) -> Result<Constraint, ConstraintError> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = Constraint::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Constraint, ConstraintError> {
        let mut left = self.not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.not()?;
            left = Constraint::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Constraint, ConstraintError> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        match token {
            Some(Token::Not) => Ok(Constraint::Not(Box::new(self.not()?))),
            Some(Token::Open) => {
                let inner = self.or()?;
                if self.peek() != Some(&Token::Close) {
                    return Err(ConstraintError {
                        message: "missing )",
                    });
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(Token::Tag(tag)) => Ok(Constraint::Tag(tag.to_owned())),
            _ => Err(ConstraintError {
                message: "expected tag",
            }),
        }
    }
}
