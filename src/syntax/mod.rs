//! Multi-language syntax-tree facade over tree-sitter.
//!
//! One grammar per supported language (javascript, typescript, python).
//! Vue/Svelte single-file components are parsed by extracting their single
//! top-level `<script>` block and parsing it as javascript or typescript.
//!
//! Rules interact with trees exclusively through [`ParsedSource`]: pattern
//! queries with named captures, node text, and line mapping back into the
//! original file. A file that fails to parse yields no tree; callers must
//! tolerate partial trees from broken sources.

mod sfc;

pub use sfc::extract_script_block;

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tracing::debug;
use tree_sitter::{Language as TsLanguage, Node, Parser, Query, QueryCursor, Tree};

use crate::scanner::Language;

/// A parsed source file (or extracted SFC script block).
pub struct ParsedSource {
    tree: Tree,
    source: String,
    language: TsLanguage,
    /// Lines preceding the parsed text in the original file; nonzero only
    /// for SFC script blocks.
    line_offset: usize,
}

/// One capture from a pattern query.
#[derive(Debug, Clone)]
pub struct QueryCapture<'a> {
    pub name: String,
    pub node: Node<'a>,
}

impl ParsedSource {
    /// Parse a source file. Returns `None` when the language has no grammar
    /// here (rust/go/unknown), when an SFC has no script block, or when the
    /// parser gives up entirely.
    pub fn parse(language: Language, path: &Path, text: &str) -> Option<Self> {
        match language {
            Language::Vue | Language::Svelte => {
                let block = extract_script_block(text)?;
                let grammar = if block.is_typescript {
                    typescript_grammar(path)
                } else {
                    tree_sitter_javascript::LANGUAGE.into()
                };
                Self::parse_with(grammar, block.text, block.line_offset)
            }
            Language::Javascript => {
                Self::parse_with(tree_sitter_javascript::LANGUAGE.into(), text.to_string(), 0)
            }
            Language::Typescript => Self::parse_with(typescript_grammar(path), text.to_string(), 0),
            Language::Python => {
                Self::parse_with(tree_sitter_python::LANGUAGE.into(), text.to_string(), 0)
            }
            Language::Rust | Language::Go | Language::Unknown => None,
        }
    }

    fn parse_with(grammar: TsLanguage, source: String, line_offset: usize) -> Option<Self> {
        let mut parser = Parser::new();
        if parser.set_language(&grammar).is_err() {
            return None;
        }
        let tree = parser.parse(source.as_bytes(), None)?;

        Some(Self {
            tree,
            source,
            language: grammar,
            line_offset,
        })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Run a pattern query over the whole tree.
    pub fn query(&self, pattern: &str) -> Vec<QueryCapture<'_>> {
        self.query_node(self.tree.root_node(), pattern)
    }

    /// Run a pattern query rooted at a specific node. A pattern that fails
    /// to compile yields no captures.
    pub fn query_node<'a>(&'a self, node: Node<'a>, pattern: &str) -> Vec<QueryCapture<'a>> {
        let query = match Query::new(&self.language, pattern) {
            Ok(q) => q,
            Err(e) => {
                debug!("query failed to compile: {}", e);
                return Vec::new();
            }
        };

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, node, self.source.as_bytes());

        let mut captures = Vec::new();
        while let Some(m) = matches.next() {
            for capture in m.captures {
                captures.push(QueryCapture {
                    name: query.capture_names()[capture.index as usize].to_string(),
                    node: capture.node,
                });
            }
        }
        captures
    }

    /// Source text of a node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// 1-based line of a node in the original file, SFC offset included.
    pub fn line_of(&self, node: Node) -> usize {
        node.start_position().row + 1 + self.line_offset
    }

    /// 1-based column of a node.
    pub fn column_of(&self, node: Node) -> usize {
        node.start_position().column + 1
    }

    /// Whether the parse produced error nodes; the tree is still usable.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// `.tsx` needs the TSX grammar variant; plain `.ts` the TypeScript one.
fn typescript_grammar(path: &Path) -> TsLanguage {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tsx") => tree_sitter_typescript::LANGUAGE_TSX.into(),
        _ => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(language: Language, name: &str, text: &str) -> ParsedSource {
        ParsedSource::parse(language, &PathBuf::from(name), text).unwrap()
    }

    #[test]
    fn test_parse_javascript_and_query() {
        let parsed = parse(
            Language::Javascript,
            "a.js",
            "function greet(name) { return name; }",
        );
        let captures = parsed.query("(function_declaration name: (identifier) @name)");
        assert_eq!(captures.len(), 1);
        assert_eq!(parsed.node_text(captures[0].node), "greet");
        assert_eq!(parsed.line_of(captures[0].node), 1);
    }

    #[test]
    fn test_parse_typescript() {
        let parsed = parse(
            Language::Typescript,
            "a.ts",
            "const add = (a: number, b: number): number => a + b;",
        );
        let captures = parsed.query("(arrow_function) @fn");
        assert_eq!(captures.len(), 1);
    }

    #[test]
    fn test_parse_python() {
        let parsed = parse(Language::Python, "a.py", "def f():\n    pass\n");
        let captures = parsed.query("(function_definition name: (identifier) @name)");
        assert_eq!(captures.len(), 1);
        assert_eq!(parsed.node_text(captures[0].node), "f");
    }

    #[test]
    fn test_vue_script_line_offset() {
        let text = "<template>\n  <div/>\n</template>\n<script>\nfunction go() { return 1; }\n</script>\n";
        let parsed = parse(Language::Vue, "c.vue", text);
        let captures = parsed.query("(function_declaration name: (identifier) @name)");
        assert_eq!(captures.len(), 1);
        // `function go` sits on line 5 of the original file.
        assert_eq!(parsed.line_of(captures[0].node), 5);
    }

    #[test]
    fn test_unsupported_language_yields_none() {
        assert!(ParsedSource::parse(Language::Go, &PathBuf::from("m.go"), "package m").is_none());
        assert!(
            ParsedSource::parse(Language::Unknown, &PathBuf::from("x.txt"), "hello").is_none()
        );
    }

    #[test]
    fn test_bad_query_is_empty() {
        let parsed = parse(Language::Javascript, "a.js", "let x = 1;");
        assert!(parsed.query("(nonexistent_node_kind) @x").is_empty());
    }

    #[test]
    fn test_partial_tree_tolerated() {
        let parsed = parse(Language::Javascript, "a.js", "function broken( {");
        assert!(parsed.has_errors());
        // Queries still run over whatever parsed.
        let _ = parsed.query("(function_declaration) @fn");
    }
}
