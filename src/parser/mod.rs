pub mod constraint;
pub mod imports;

pub use constraint::BuildContext;

use std::path::Path;

use thiserror::Error;
use tree_sitter::{Language, LanguageError, Parser};

use imports::extract_go_imports;

/// Suffix of Go test source files.
pub const TEST_FILE_SUFFIX: &str = "_test.go";

/// Import information extracted from one Go source file.
#[derive(Debug, Clone, Default)]
pub struct GoSource {
    /// Import paths in source order.
    pub imports: Vec<String>,
    /// True for `_test.go` files.
    pub is_test: bool,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to set tree-sitter Go language")]
    Language(#[from] LanguageError),

    #[error("tree-sitter returned no tree")]
    NoTree,
}

pub fn go_language() -> Language {
    tree_sitter_go::LANGUAGE.into()
}

/// Parse a Go file and extract its imports.
///
/// Allocates a fresh `Parser` per call; the syntax tree is dropped before
/// returning. Syntax errors do not fail the parse: tree-sitter recovers and
/// the import block is normally still intact.
pub fn parse_go_file(path: &Path, source: &[u8]) -> Result<GoSource, ParseError> {
    let language = go_language();
    let mut parser = Parser::new();
    parser.set_language(&language)?;
    let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;

    let is_test = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(TEST_FILE_SUFFIX));

    Ok(GoSource {
        imports: extract_go_imports(&tree, source, &language),
        is_test,
    })
}
