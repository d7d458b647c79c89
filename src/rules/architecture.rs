//! Architecture detection: oversized functions, mixed naming conventions,
//! magic numbers, circular dependencies, unused exports.
//!
//! Function discovery here is deliberately regex plus brace/indent scanning
//! rather than AST queries, so the checks keep working on files the parsers
//! reject. The head regexes can match non-functions in pathological code;
//! that imprecision is accepted.

use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;

use crate::alert::{Alert, RuleId};
use crate::config::Config;
use crate::graph::{extract_import_node, ImportGraph, ImportNode, NAMESPACE_SYMBOL};
use crate::scanner::{FileRecord, Language};

use super::textscan::{find_block_end, find_indent_block_end, mask_strings};
use super::{read_source, RuleContext, RuleModule};

lazy_static! {
    static ref JS_FUNCTION_HEAD: Regex = Regex::new(
        r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*\("
    )
    .unwrap();
    static ref JS_ARROW_HEAD: Regex = Regex::new(
        r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*(?:async\s*)?\([^)]*\)\s*=>\s*\{"
    )
    .unwrap();
    static ref GO_FUNCTION_HEAD: Regex =
        Regex::new(r"^\s*func\s+(?:\([^)]*\)\s*)?([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap();
    static ref RUST_FUNCTION_HEAD: Regex =
        Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap();
    static ref PY_FUNCTION_HEAD: Regex =
        Regex::new(r"^(\s*)def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap();

    static ref DECISION_WORDS: Regex =
        Regex::new(r"\b(if|else|elif|while|for|do|switch|case|catch|try)\b").unwrap();
    /// Ternary `?`, excluding `?.`, `??`, and TS optional `?:` markers.
    static ref TERNARY: Regex = Regex::new(r"[^?]\?[^.?:]").unwrap();

    static ref INTERFACE_HEAD: Regex =
        Regex::new(r"^\s*(?:export\s+)?(?:declare\s+)?interface\s+[A-Za-z_$]").unwrap();
    static ref TYPE_ALIAS_LINE: Regex =
        Regex::new(r"^\s*(?:export\s+)?type\s+[A-Za-z_$][A-Za-z0-9_$]*\s*(?:<[^>]*>)?\s*=").unwrap();
    static ref CAMEL_CASE: Regex = Regex::new(r"^[a-z][a-z0-9]*(?:[A-Z][a-z0-9]*)+$").unwrap();
    static ref SNAKE_CASE: Regex = Regex::new(r"^[a-z][a-z0-9]*(?:_[a-z0-9]+)+$").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap();

    static ref CONST_DECLARATION: Regex = Regex::new(
        r"^\s*(?:export\s+)?(?:pub(?:\([^)]*\))?\s+)?(?:const|let|var|final|static|readonly)\b"
    )
    .unwrap();
    static ref PY_CONST_ASSIGNMENT: Regex = Regex::new(r"^[A-Z_][A-Z0-9_]*\s*=").unwrap();
}

/// Literal values that are never magic.
const SAFE_NUMBERS: &[f64] = &[0.0, 1.0, 2.0, 10.0, 100.0, -1.0];

/// Files assumed to be consumed externally, exempt from unused-export.
const ENTRY_POINT_BASENAMES: &[&str] = &["index.ts", "index.js", "main.ts", "App.tsx"];

pub struct ArchitectureModule;

impl RuleModule for ArchitectureModule {
    fn name(&self) -> &'static str {
        "architecture"
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.modules.architecture
    }

    fn analyze(&self, ctx: &RuleContext, alerts: &mut Vec<Alert>) -> anyhow::Result<()> {
        // Per-file work runs in parallel; collect() preserves input order,
        // so the graph sees files in scan order and alerts stay
        // deterministic.
        let per_file: Vec<(Option<ImportNode>, Vec<Alert>)> = ctx
            .files
            .par_iter()
            .filter(|f| f.is_source)
            .map(|record| {
                if ctx.cancel.is_cancelled() {
                    return (None, Vec::new());
                }
                let Some(text) = read_source(record) else {
                    return (None, Vec::new());
                };

                let node = extract_import_node(&record.relative, record.language, &text);

                let mut file_alerts = Vec::new();
                check_god_functions(ctx.config, record, &text, &mut file_alerts);
                if ctx.config.architecture.detect_mixed_naming && is_typescriptish(record.language)
                {
                    check_mixed_naming(record, &text, &mut file_alerts);
                }
                if ctx.config.architecture.detect_magic_numbers {
                    check_magic_numbers(record, &text, &mut file_alerts);
                }

                (Some(node), file_alerts)
            })
            .collect();

        // The graph must be complete before any cross-file check reads it.
        let mut import_nodes = Vec::new();
        for (node, file_alerts) in per_file {
            if let Some(node) = node {
                import_nodes.push(node);
            }
            alerts.extend(file_alerts);
        }
        let graph = ImportGraph::build(import_nodes);

        if ctx.config.architecture.detect_circular_dependencies {
            check_cycles(&graph, alerts);
        }
        if ctx.config.architecture.detect_unused_exports {
            check_unused_exports(&graph, alerts);
        }

        Ok(())
    }
}

fn is_typescriptish(language: Language) -> bool {
    matches!(language, Language::Javascript | Language::Typescript)
}

/// A function head found by the language-specific regex scan.
struct FunctionSpan {
    name: String,
    /// 0-based head line index.
    start: usize,
    /// 0-based last body line index.
    end: usize,
}

fn check_god_functions(
    config: &Config,
    record: &FileRecord,
    text: &str,
    alerts: &mut Vec<Alert>,
) {
    let lines: Vec<&str> = text.lines().collect();
    let masked = mask_strings(text);

    for span in find_functions(record.language, &lines, &masked) {
        let line_count = span.end - span.start + 1;
        let body = masked[span.start..=span.end].join("\n");
        let complexity = cyclomatic_complexity(&body);

        let cc_threshold = config.architecture.cyclomatic_complexity_threshold;
        let loc_threshold = config.architecture.lines_of_code_threshold;

        if complexity > cc_threshold && line_count > loc_threshold {
            alerts.push(
                Alert::new(
                    RuleId::GodFunction,
                    record.relative.clone(),
                    format!(
                        "\"{}\" spans {} lines with cyclomatic complexity {}",
                        span.name, line_count, complexity
                    ),
                )
                .with_line(span.start + 1)
                .with_suggestion("split the function along its decision boundaries"),
            );
        }
    }
}

fn find_functions(language: Language, lines: &[&str], masked: &[String]) -> Vec<FunctionSpan> {
    let mut spans = Vec::new();

    match language {
        Language::Python => {
            for (idx, line) in lines.iter().enumerate() {
                if let Some(caps) = PY_FUNCTION_HEAD.captures(line) {
                    let indent = caps[1].len();
                    let end = find_indent_block_end(lines, idx, indent);
                    spans.push(FunctionSpan {
                        name: caps[2].to_string(),
                        start: idx,
                        end,
                    });
                }
            }
        }
        _ => {
            let heads: Vec<&Regex> = match language {
                Language::Go => vec![&GO_FUNCTION_HEAD],
                Language::Rust => vec![&RUST_FUNCTION_HEAD],
                _ => vec![&JS_FUNCTION_HEAD, &JS_ARROW_HEAD],
            };

            for (idx, line) in masked.iter().enumerate() {
                let Some(caps) = heads.iter().find_map(|h| h.captures(line)) else {
                    continue;
                };
                let Some(end) = find_block_end(masked, idx) else {
                    continue;
                };
                spans.push(FunctionSpan {
                    name: caps[1].to_string(),
                    start: idx,
                    end,
                });
            }
        }
    }

    spans
}

/// 1 + decision tokens over the (string-masked) body text.
fn cyclomatic_complexity(body: &str) -> usize {
    1 + DECISION_WORDS.find_iter(body).count()
        + body.matches("&&").count()
        + body.matches("||").count()
        + TERNARY.find_iter(body).count()
}

fn check_mixed_naming(record: &FileRecord, text: &str, alerts: &mut Vec<Alert>) {
    let masked = mask_strings(text);
    let mut interface_end: Option<usize> = None;

    for (idx, line) in masked.iter().enumerate() {
        // Inside an interface block foreign naming is someone else's API.
        if let Some(end) = interface_end {
            if idx <= end {
                continue;
            }
            interface_end = None;
        }
        if INTERFACE_HEAD.is_match(line) {
            interface_end = find_block_end(&masked, idx);
            continue;
        }
        if TYPE_ALIAS_LINE.is_match(line) {
            continue;
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with("//") || trimmed.starts_with('*') || trimmed.starts_with("/*") {
            continue;
        }

        let mut has_camel = false;
        let mut has_snake = false;
        for ident in IDENTIFIER.find_iter(line) {
            if CAMEL_CASE.is_match(ident.as_str()) {
                has_camel = true;
            } else if SNAKE_CASE.is_match(ident.as_str()) {
                has_snake = true;
            }
        }

        if has_camel && has_snake {
            alerts.push(
                Alert::new(
                    RuleId::MixedNaming,
                    record.relative.clone(),
                    "camelCase and snake_case mixed on one line",
                )
                .with_line(idx + 1)
                .with_suggestion("pick one naming convention for this file"),
            );
        }
    }
}

fn check_magic_numbers(record: &FileRecord, text: &str, alerts: &mut Vec<Alert>) {
    let masked = mask_strings(text);
    let go = record.language == Language::Go;
    let python = record.language == Language::Python;

    // Go groups constants in `const ( ... )` / `var ( ... )` blocks.
    let mut in_go_decl_block = false;

    for (idx, masked_line) in masked.iter().enumerate() {
        let trimmed = masked_line.trim();

        if go {
            if in_go_decl_block {
                if trimmed == ")" {
                    in_go_decl_block = false;
                }
                continue;
            }
            if trimmed == "const (" || trimmed == "var (" {
                in_go_decl_block = true;
                continue;
            }
        }

        if trimmed.is_empty()
            || trimmed.starts_with("//")
            || trimmed.starts_with('#')
            || trimmed.starts_with('*')
            || trimmed.starts_with("/*")
        {
            continue;
        }
        if trimmed.starts_with("import ") || trimmed.starts_with("from ") || trimmed.starts_with("use ")
        {
            continue;
        }
        if CONST_DECLARATION.is_match(masked_line) {
            continue;
        }
        if python && PY_CONST_ASSIGNMENT.is_match(trimmed) {
            continue;
        }

        for (column, literal) in numeric_literals(masked_line) {
            if is_safe_number(&literal, masked_line, column) {
                continue;
            }
            alerts.push(
                Alert::new(
                    RuleId::MagicNumber,
                    record.relative.clone(),
                    format!("magic number {}", literal),
                )
                .with_line(idx + 1)
                .with_column(column + 1)
                .with_suggestion("name the constant"),
            );
        }
    }
}

/// Decimal literals in a masked line with their byte columns. Tokens glued
/// to identifiers (`x1`), non-decimal forms (`0x1F`, `1.0.0`), and octal
/// file modes (`0644`) are not literals for this rule.
fn numeric_literals(line: &str) -> Vec<(usize, String)> {
    let bytes = line.as_bytes();
    let mut literals = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if !c.is_ascii_digit() {
            i += 1;
            continue;
        }

        let prev = if i > 0 { bytes[i - 1] as char } else { ' ' };
        if prev.is_ascii_alphanumeric() || prev == '_' || prev == '.' {
            // Mid-identifier or trailing part of a larger token: skip it.
            i += 1;
            while i < bytes.len() && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'.')
            {
                i += 1;
            }
            continue;
        }

        let start = i;
        while i < bytes.len()
            && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'.' || bytes[i] == b'_')
        {
            i += 1;
        }
        let token = &line[start..i];

        if is_decimal_literal(token) && !is_octal_mode(token) {
            literals.push((start, token.to_string()));
        }
    }

    literals
}

fn is_decimal_literal(token: &str) -> bool {
    let mut dots = 0;
    for c in token.chars() {
        match c {
            '0'..='9' => {}
            '.' => dots += 1,
            _ => return false,
        }
    }
    dots <= 1 && !token.ends_with('.')
}

fn is_octal_mode(token: &str) -> bool {
    token.len() == 4 && token.starts_with('0') && token.chars().all(|c| ('0'..='7').contains(&c))
}

fn is_safe_number(literal: &str, line: &str, column: usize) -> bool {
    let Ok(mut value) = literal.parse::<f64>() else {
        return true;
    };
    if column > 0 && line.as_bytes()[column - 1] == b'-' {
        value = -value;
    }
    SAFE_NUMBERS.iter().any(|&s| (s - value).abs() < f64::EPSILON)
}

fn check_cycles(graph: &ImportGraph, alerts: &mut Vec<Alert>) {
    for cycle in graph.cycles() {
        let mut path = cycle.join(" -> ");
        path.push_str(" -> ");
        path.push_str(&cycle[0]);

        alerts.push(
            Alert::new(
                RuleId::CircularDependency,
                cycle[0].clone(),
                format!("circular dependency: {}", path),
            )
            .with_suggestion("break the cycle by extracting the shared pieces"),
        );
    }
}

fn check_unused_exports(graph: &ImportGraph, alerts: &mut Vec<Alert>) {
    let imported = graph.imported_symbols_by_target();

    for node in graph.nodes() {
        let basename = node.file.rsplit('/').next().unwrap_or(&node.file);
        if ENTRY_POINT_BASENAMES.contains(&basename) {
            continue;
        }

        let used = imported.get(&node.file);
        let namespace_imported = used
            .map(|set| set.contains(NAMESPACE_SYMBOL))
            .unwrap_or(false);
        if namespace_imported {
            continue;
        }

        for export in &node.exports {
            let is_used = used.map(|set| set.contains(export)).unwrap_or(false);
            if !is_used {
                alerts.push(
                    Alert::new(
                        RuleId::UnusedExport,
                        node.file.clone(),
                        format!("exported symbol \"{}\" is never imported", export),
                    )
                    .with_suggestion("drop the export or delete the dead code"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{PackageInfo, RegistryError, RegistryKind, Scorecard};
    use crate::rules::{CancelToken, TopPackages};
    use crate::scanner::FileScanner;
    use std::path::Path;
    use tempfile::TempDir;

    struct NoRegistry;
    impl crate::registry::PackageSource for NoRegistry {
        fn exists(&self, _r: RegistryKind, _n: &str) -> Result<bool, RegistryError> {
            Ok(true)
        }
        fn info(&self, _r: RegistryKind, _n: &str) -> Result<Option<PackageInfo>, RegistryError> {
            Ok(None)
        }
    }

    struct NoScorecards;
    impl crate::registry::ScorecardSource for NoScorecards {
        fn fetch(&self, _u: &str) -> Result<Option<Scorecard>, RegistryError> {
            Ok(None)
        }
    }

    fn run_with_config(files: &[(&str, &str)], config: Config) -> Vec<Alert> {
        let temp = TempDir::new().unwrap();
        for (name, content) in files {
            let path = temp.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, content).unwrap();
        }

        let scanner = FileScanner::new(temp.path(), &config.scanning).unwrap();
        let records = scanner.scan();
        let cancel = CancelToken::new();
        let top = TopPackages::custom(vec![]);
        let ctx = RuleContext {
            root: Path::new("."),
            config: &config,
            files: &records,
            registry: &NoRegistry,
            scorecard: &NoScorecards,
            top_packages: &top,
            cancel: &cancel,
        };

        let mut alerts = Vec::new();
        ArchitectureModule.analyze(&ctx, &mut alerts).unwrap();
        alerts
    }

    fn run(files: &[(&str, &str)]) -> Vec<Alert> {
        run_with_config(files, Config::default())
    }

    #[test]
    fn test_magic_number_skips_sql_string() {
        let source =
            "package main\n\nfunc q() {\nquery := `SELECT * FROM users WHERE age > 18 AND status = 1`\nval := 999\nuse(query, val)\n}\n";
        let alerts = run(&[("q.go", source)]);

        let magic: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::MagicNumber)
            .collect();
        assert_eq!(magic.len(), 1);
        assert!(magic[0].message.contains("999"));
    }

    #[test]
    fn test_magic_number_safe_set_and_declarations() {
        let source = "const LIMIT = 50;\nlet x = 0;\ncallWith(1, 2, 10, 100, -1);\nretry(7);\n";
        let alerts = run(&[("a.ts", source)]);
        let magic: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::MagicNumber)
            .collect();
        // Only the 7: the const line is a declaration, the rest are safe.
        assert_eq!(magic.len(), 1);
        assert!(magic[0].message.contains('7'));
    }

    #[test]
    fn test_magic_number_go_const_block() {
        let source = "const (\n\tmodeFile = 0644\n\tretries  = 9\n)\n\nfunc f() {\n\tuse(33)\n}\n";
        let alerts = run(&[("m.go", source)]);
        let magic: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::MagicNumber)
            .collect();
        assert_eq!(magic.len(), 1);
        assert!(magic[0].message.contains("33"));
    }

    #[test]
    fn test_mixed_naming_skipped_in_interface() {
        let source = "export interface BackendResponse { user_id: string; created_at: string; } function run() { const validCamelCase = \"ok\"; }\n";
        let alerts = run(&[("types.ts", source)]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::MixedNaming));
    }

    #[test]
    fn test_mixed_naming_flagged_in_code() {
        let source = "const userName = row.user_name;\n";
        let alerts = run(&[("a.ts", source)]);
        assert!(alerts.iter().any(|a| a.rule == RuleId::MixedNaming));
    }

    #[test]
    fn test_mixed_naming_skips_type_alias() {
        let source = "type ApiRow = { user_id: string, displayName: string };\n";
        let alerts = run(&[("a.ts", source)]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::MixedNaming));
    }

    #[test]
    fn test_god_function_requires_both_thresholds() {
        // Long but simple: over the line threshold, under the complexity one.
        let mut long_simple = String::from("function longSimple() {\n");
        for i in 0..120 {
            long_simple.push_str(&format!("  step{}();\n", i));
        }
        long_simple.push_str("}\n");
        let alerts = run(&[("a.ts", long_simple.as_str())]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::GodFunction));

        // Long and branchy: both thresholds exceeded.
        let mut god = String::from("function god(x) {\n");
        for i in 0..110 {
            god.push_str(&format!("  if (x > {}) {{ a{}(); }}\n", i + 300, i));
        }
        god.push_str("}\n");
        let alerts = run(&[("b.ts", god.as_str())]);
        let hits: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::GodFunction)
            .collect();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].message.contains("god"));
        assert_eq!(hits[0].line, Some(1));
    }

    #[test]
    fn test_god_function_python_indent_scan() {
        let mut source = String::from("def busy(x):\n");
        for i in 0..110 {
            source.push_str(&format!("    if x > {}:\n        y += {}\n", i + 300, i + 300));
        }
        source.push_str("\ndef tiny():\n    return 1\n");
        let alerts = run(&[("a.py", source.as_str())]);
        let hits: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::GodFunction)
            .collect();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].message.contains("busy"));
    }

    #[test]
    fn test_circular_dependency() {
        let alerts = run(&[
            ("a.ts", "import { b } from './b';\nexport function a() { return b; }\n"),
            ("b.ts", "import { a } from './a';\nexport function b() { return a; }\n"),
        ]);
        let cycles: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::CircularDependency)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].file, "a.ts");
        assert!(cycles[0].message.contains("a.ts -> b.ts -> a.ts"));
    }

    #[test]
    fn test_unused_export() {
        let alerts = run(&[
            ("lib.ts", "export function used() {}\nexport function orphan() {}\n"),
            ("app.ts", "import { used } from './lib';\nused();\n"),
        ]);
        let unused: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::UnusedExport)
            .collect();
        assert_eq!(unused.len(), 1);
        assert!(unused[0].message.contains("orphan"));
        assert_eq!(unused[0].file, "lib.ts");
    }

    #[test]
    fn test_namespace_import_marks_all_used() {
        let alerts = run(&[
            ("lib.ts", "export function one() {}\nexport function two() {}\n"),
            ("app.ts", "import * as lib from './lib';\nlib.one();\n"),
        ]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::UnusedExport));
    }

    #[test]
    fn test_entry_points_exempt_from_unused_export() {
        let alerts = run(&[("index.ts", "export function boot() {}\n")]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::UnusedExport));
    }

    #[test]
    fn test_toggles() {
        let mut config = Config::default();
        config.architecture.detect_magic_numbers = false;
        let alerts = run_with_config(&[("a.ts", "retry(7);\n")], config);
        assert!(alerts.iter().all(|a| a.rule != RuleId::MagicNumber));
    }
}
