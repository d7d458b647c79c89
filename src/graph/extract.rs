//! Best-effort import/export extraction.
//!
//! Deliberately regex over raw text rather than AST queries: the graph must
//! still form when files are partial or broken, which is exactly when this
//! analyzer is most useful. Only project-local specifiers (starting with `.`
//! or the `@/` source alias) become graph material.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::scanner::Language;
use crate::syntax::extract_script_block;

/// Symbol recorded for a whole-namespace import.
pub const NAMESPACE_SYMBOL: &str = "*";
/// Symbol recorded for a default-binding import.
pub const DEFAULT_SYMBOL: &str = "default";

lazy_static! {
    static ref ES_IMPORT: Regex =
        Regex::new(r#"(?m)^\s*import\s+(.+?)\s+from\s+['"]([^'"]+)['"]"#).unwrap();
    static ref CALL_IMPORT: Regex =
        Regex::new(r#"(?:\brequire|\bimport)\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap();
    static ref ES_EXPORT: Regex = Regex::new(
        r"(?m)^\s*export\s+(default\s+)?(?:async\s+)?(?:function|class|const|let|var|type|interface|enum)\s+([A-Za-z_$][A-Za-z0-9_$]*)"
    )
    .unwrap();
    static ref PY_FROM_IMPORT: Regex =
        Regex::new(r"(?m)^\s*from\s+(\.[\w.]*)\s+import\s+(.+)$").unwrap();
}

/// Imports and exports of one source file.
#[derive(Debug, Clone, Default)]
pub struct ImportNode {
    /// Path relative to the scan root.
    pub file: String,
    /// Raw import specifiers, in order of first appearance.
    pub imports: Vec<String>,
    /// Specifier -> symbols imported from it.
    pub symbols: BTreeMap<String, BTreeSet<String>>,
    /// Exported symbol names, in declaration order.
    pub exports: Vec<String>,
}

impl ImportNode {
    fn record(&mut self, specifier: &str, symbols: impl IntoIterator<Item = String>) {
        if !is_local_specifier(specifier) {
            return;
        }
        if !self.imports.iter().any(|i| i == specifier) {
            self.imports.push(specifier.to_string());
        }
        self.symbols
            .entry(specifier.to_string())
            .or_default()
            .extend(symbols);
    }
}

/// Specifiers the graph records edges for.
fn is_local_specifier(specifier: &str) -> bool {
    specifier.starts_with('.') || specifier.starts_with("@/")
}

/// Extract the import node for a file. SFC languages are reduced to their
/// script block first.
pub fn extract_import_node(file: &str, language: Language, source: &str) -> ImportNode {
    let mut node = ImportNode {
        file: file.to_string(),
        ..Default::default()
    };

    match language {
        Language::Javascript | Language::Typescript => {
            extract_ecmascript(&mut node, source);
        }
        Language::Vue | Language::Svelte => {
            if let Some(block) = extract_script_block(source) {
                extract_ecmascript(&mut node, &block.text);
            }
        }
        Language::Python => extract_python(&mut node, source),
        Language::Rust | Language::Go | Language::Unknown => {}
    }

    node
}

fn extract_ecmascript(node: &mut ImportNode, source: &str) {
    for caps in ES_IMPORT.captures_iter(source) {
        let clause = caps[1].trim();
        let specifier = &caps[2];
        node.record(specifier, classify_import_clause(clause));
    }

    for caps in CALL_IMPORT.captures_iter(source) {
        node.record(&caps[1], [NAMESPACE_SYMBOL.to_string()]);
    }

    for caps in ES_EXPORT.captures_iter(source) {
        let name = caps[2].to_string();
        if !node.exports.contains(&name) {
            node.exports.push(name);
        }
    }
}

/// Classify an ES import clause into the symbols it binds.
///
/// `* as ns` is the whole namespace; `{A, B as C, type D}` keeps the
/// left-hand names with any `type` prefix dropped; a bare identifier is the
/// default binding. A mixed `Default, {A}` clause yields both.
fn classify_import_clause(clause: &str) -> Vec<String> {
    let mut symbols = Vec::new();

    // `import type { A } from ...` binds no default; strip the modifier.
    let clause = clause.strip_prefix("type ").unwrap_or(clause).trim_start();

    if clause.starts_with('*') {
        symbols.push(NAMESPACE_SYMBOL.to_string());
        return symbols;
    }

    let named_start = clause.find('{');
    let head = &clause[..named_start.unwrap_or(clause.len())];
    if !head.trim().trim_end_matches(',').trim().is_empty() {
        symbols.push(DEFAULT_SYMBOL.to_string());
    }

    if let Some(start) = named_start {
        if let Some(end) = clause[start..].find('}') {
            for part in clause[start + 1..start + end].split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let part = part.strip_prefix("type ").unwrap_or(part).trim();
                let name = part.split_whitespace().next().unwrap_or("");
                if !name.is_empty() {
                    symbols.push(name.to_string());
                }
            }
        }
    }

    symbols
}

fn extract_python(node: &mut ImportNode, source: &str) {
    for caps in PY_FROM_IMPORT.captures_iter(source) {
        let module = &caps[1];
        let names: Vec<String> = caps[2]
            .split(',')
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.split_whitespace()
                    .next()
                    .unwrap_or("")
                    .trim_matches('(')
                    .to_string()
            })
            .filter(|p| !p.is_empty())
            .collect();
        node.record(module, names);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(language: Language, source: &str) -> ImportNode {
        extract_import_node("src/a.ts", language, source)
    }

    #[test]
    fn test_named_imports_keep_left_hand_names() {
        let node = extract(
            Language::Typescript,
            "import { readFile, join as pathJoin, type Stats } from './fs-util';\n",
        );
        let symbols = &node.symbols["./fs-util"];
        assert!(symbols.contains("readFile"));
        assert!(symbols.contains("join"));
        assert!(symbols.contains("Stats"));
        assert!(!symbols.contains("pathJoin"));
    }

    #[test]
    fn test_default_and_namespace_imports() {
        let node = extract(
            Language::Typescript,
            "import Button from './button';\nimport * as helpers from './helpers';\n",
        );
        assert!(node.symbols["./button"].contains(DEFAULT_SYMBOL));
        assert!(node.symbols["./helpers"].contains(NAMESPACE_SYMBOL));
    }

    #[test]
    fn test_mixed_clause() {
        let node = extract(
            Language::Typescript,
            "import React, { useState } from './react-shim';\n",
        );
        let symbols = &node.symbols["./react-shim"];
        assert!(symbols.contains(DEFAULT_SYMBOL));
        assert!(symbols.contains("useState"));
    }

    #[test]
    fn test_third_party_imports_are_dropped() {
        let node = extract(
            Language::Typescript,
            "import express from 'express';\nimport { z } from 'zod';\nimport { a } from '@/core/a';\n",
        );
        assert_eq!(node.imports, vec!["@/core/a".to_string()]);
    }

    #[test]
    fn test_require_and_dynamic_import() {
        let node = extract(
            Language::Javascript,
            "const util = require('./util');\nconst lazy = await import('./lazy');\n",
        );
        assert!(node.symbols["./util"].contains(NAMESPACE_SYMBOL));
        assert!(node.symbols["./lazy"].contains(NAMESPACE_SYMBOL));
    }

    #[test]
    fn test_exports() {
        let node = extract(
            Language::Typescript,
            "export function run() {}\nexport default class App {}\nexport const VERSION = '1';\nexport interface Options {}\nexport type Result = number;\n",
        );
        assert_eq!(node.exports, vec!["run", "App", "VERSION", "Options", "Result"]);
    }

    #[test]
    fn test_python_relative_only() {
        let node = extract_import_node(
            "pkg/mod.py",
            Language::Python,
            "from .utils import parse, dump as d\nfrom os import path\nimport sys\n",
        );
        assert_eq!(node.imports, vec![".utils".to_string()]);
        let symbols = &node.symbols[".utils"];
        assert!(symbols.contains("parse"));
        assert!(symbols.contains("dump"));
    }

    #[test]
    fn test_vue_sfc_script_imports() {
        let sfc = "<template><div/></template>\n<script>\nimport { helper } from './helper';\nexport default function setup() {}\n</script>\n";
        let node = extract_import_node("src/c.vue", Language::Vue, sfc);
        assert_eq!(node.imports, vec!["./helper".to_string()]);
    }
}
