//! Import-graph resolution.
//!
//! Starting from an entry module, finds every same-project module reachable
//! through aliased imports (`@/…`) and copies the closure into a destination
//! tree that mirrors the source layout. Third-party imports are never
//! followed: the generated project's own manifest provides them.

pub mod copier;
pub mod resolver;

pub use copier::{DependencyCopier, ParseFailure, TraversalReport, UnresolvedImport, VisitedSet};
pub use resolver::{AliasResolver, DEFAULT_ALIAS};

use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::error::ScanError;

/// Source extensions whose imports are followed.
pub const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mts", "cts", "mjs", "cjs"];

/// One top-level `import` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub specifier: String,
    pub line: u32,
    /// `import type … from "…"`.
    pub type_only: bool,
}

/// Whether a path names a module whose imports should be scanned.
pub fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

/// Whether a path's syntax includes JSX.
pub fn is_jsx(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tsx") | Some("jsx")
    )
}

/// Extract the top-level import declarations of a module.
///
/// The module is parsed with the TypeScript grammar (TSX when `jsx` is set).
/// Only direct children of the program node count, so imports nested in
/// blocks are skipped, as are dynamic `import()`, `import.meta` and
/// TypeScript's `import x = require(…)`. A tree containing syntax errors is
/// rejected with the line of the first error.
pub fn parse_imports(src: &str, jsx: bool) -> Result<Vec<ImportDecl>, ScanError> {
    let language = if jsx {
        tree_sitter_typescript::LANGUAGE_TSX
    } else {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT
    };
    let mut parser = Parser::new();
    parser
        .set_language(&language.into())
        .map_err(|err| ScanError::new(0, format!("grammar init failed: {err}")))?;
    let tree = parser
        .parse(src, None)
        .ok_or_else(|| ScanError::new(0, "parse did not complete"))?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(first_error(root));
    }

    let mut decls = Vec::new();
    let mut cursor = root.walk();
    for stmt in root.named_children(&mut cursor) {
        if stmt.kind() != "import_statement" {
            continue;
        }
        // `import x = require("…")` keeps its source inside the require clause.
        let Some(source) = stmt.child_by_field_name("source") else {
            continue;
        };
        let mut inner = stmt.walk();
        let type_only = stmt
            .children(&mut inner)
            .nth(1)
            .is_some_and(|n| !n.is_named() && n.kind() == "type");
        decls.push(ImportDecl {
            specifier: string_value(source, src),
            line: stmt.start_position().row as u32 + 1,
            type_only,
        });
    }
    Ok(decls)
}

/// Aliased specifiers imported by a module, deduplicated, in source order.
pub fn collect_dependencies(src: &str, jsx: bool, alias: &str) -> Result<Vec<String>, ScanError> {
    let mut specs: Vec<String> = Vec::new();
    for decl in parse_imports(src, jsx)? {
        if decl.specifier.starts_with(alias) && !specs.contains(&decl.specifier) {
            specs.push(decl.specifier);
        }
    }
    Ok(specs)
}

/// Text of a `string` node without its quotes.
fn string_value(node: Node<'_>, src: &str) -> String {
    let raw = &src[node.start_byte()..node.end_byte()];
    raw.trim_matches(|c| c == '"' || c == '\'').to_string()
}

fn first_error(root: Node<'_>) -> ScanError {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let line = node.start_position().row as u32 + 1;
            let message = if node.is_missing() {
                format!("missing '{}'", node.kind())
            } else {
                "syntax error".to_string()
            };
            return ScanError::new(line, message);
        }
        let mut cursor = node.walk();
        let mut children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        children.reverse();
        stack.extend(children);
    }
    ScanError::new(root.start_position().row as u32 + 1, "syntax error")
}
