use std::sync::OnceLock;

use tree_sitter::{Language, Node, Query, QueryCursor, StreamingIterator, Tree};

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

/// Matches both `import "x"` and every spec of a grouped `import ( ... )` block.
/// The `path` field is either an interpreted ("...") or a raw (`...`) string literal.
const GO_IMPORT_QUERY: &str = r#"
    (import_spec
      path: (_) @path)
"#;

// ---------------------------------------------------------------------------
// Query cache
// ---------------------------------------------------------------------------

static IMPORT_QUERY_CACHE: OnceLock<Query> = OnceLock::new();

fn import_query(language: &Language) -> &'static Query {
    IMPORT_QUERY_CACHE
        .get_or_init(|| Query::new(language, GO_IMPORT_QUERY).expect("invalid Go import query"))
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Strip the surrounding quotes or backticks of a Go string literal.
fn unquote(literal: &str) -> &str {
    literal.trim_matches(|c| c == '"' || c == '`')
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract every import path from a parsed Go file, in source order.
///
/// Blank (`_`), dot and named imports are reported by path only; the local
/// name does not matter for dependency tracking.
pub fn extract_go_imports(tree: &Tree, source: &[u8], language: &Language) -> Vec<String> {
    let query = import_query(language);
    let path_idx = query
        .capture_index_for_name("path")
        .expect("import query must have @path");

    let mut imports = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    while let Some(m) = matches.next() {
        for capture in m.captures {
            if capture.index == path_idx {
                let path = unquote(node_text(capture.node, source));
                if !path.is_empty() {
                    imports.push(path.to_owned());
                }
            }
        }
    }

    imports
}
