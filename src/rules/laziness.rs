//! Laziness detection: AI chat preambles, placeholder comments, hollow
//! functions, mock implementations, silent catch blocks, over-commenting.
//!
//! The line-oriented checks run on raw text so they survive broken files;
//! the structural checks run on the parsed tree and are skipped when no
//! grammar covers the language.

use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use tree_sitter::Node;

use crate::alert::{Alert, RuleId};
use crate::config::Config;
use crate::scanner::{FileRecord, Language};
use crate::syntax::ParsedSource;

use super::{read_source, RuleContext, RuleModule};

lazy_static! {
    /// Chat-transcript phrases that should never survive into source code.
    static ref AI_PREAMBLE_PATTERNS: Vec<Regex> = [
        r"(?i)as an ai language model",
        r"(?i)here is the updated code",
        r"(?i)i've updated the code",
        r"(?i)below is the implementation",
        r"(?i)here's how you can",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    /// Basenames treated as test files for the over-commenting threshold.
    static ref TEST_FILE_PATTERNS: Vec<Regex> = [
        r"\.test\.",
        r"\.spec\.",
        r"^test_",
        r"_test\.py$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
}

/// Substrings that count as "the error was logged" inside a catch body.
const LOGGING_MARKERS: &[&str] = &[
    "console.log",
    "console.error",
    "console.warn",
    "logger.",
    "log.",
    "logging.",
    "sentry.",
    "logrocket.",
    "bugsnag.",
    "rollbar.",
    "print(",
    ".error(",
    ".warn(",
    ".info(",
    ".debug(",
];

pub struct LazinessModule;

impl RuleModule for LazinessModule {
    fn name(&self) -> &'static str {
        "laziness"
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.modules.laziness
    }

    fn analyze(&self, ctx: &RuleContext, alerts: &mut Vec<Alert>) -> anyhow::Result<()> {
        let placeholder_patterns: Vec<Regex> = ctx
            .config
            .laziness
            .patterns
            .iter()
            .filter_map(|p| Regex::new(&format!("(?i){}", p)).ok())
            .collect();

        // File work is independent; collect() preserves input order so the
        // merged alert stream stays deterministic.
        let per_file: Vec<Vec<Alert>> = ctx
            .files
            .par_iter()
            .filter(|f| f.is_source)
            .map(|record| {
                if ctx.cancel.is_cancelled() {
                    return Vec::new();
                }
                let Some(text) = read_source(record) else {
                    return Vec::new();
                };

                let mut file_alerts = Vec::new();
                check_lines(
                    ctx.config,
                    record,
                    &text,
                    &placeholder_patterns,
                    &mut file_alerts,
                );

                if ctx.config.laziness.detect_over_commenting {
                    check_over_commenting(ctx.config, record, &text, &mut file_alerts);
                }

                // Structural checks need a grammar; unknown languages get
                // the line checks only.
                if let Some(parsed) = ParsedSource::parse(record.language, &record.path, &text) {
                    check_tree(ctx.config, record, &parsed, &mut file_alerts);
                }

                file_alerts
            })
            .collect();

        for file_alerts in per_file {
            alerts.extend(file_alerts);
        }

        Ok(())
    }
}

fn check_lines(
    config: &Config,
    record: &FileRecord,
    text: &str,
    placeholder_patterns: &[Regex],
    alerts: &mut Vec<Alert>,
) {
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if config.laziness.detect_ai_preambles
            && AI_PREAMBLE_PATTERNS.iter().any(|p| p.is_match(line))
        {
            alerts.push(
                Alert::new(
                    RuleId::AiPreamble,
                    record.relative.clone(),
                    "line reads like an AI chat transcript, not code",
                )
                .with_line(line_no)
                .with_suggestion("delete the conversational text"),
            );
        }

        if config.laziness.detect_placeholder_comments {
            if let Some(pattern) = placeholder_patterns.iter().find(|p| p.is_match(line)) {
                alerts.push(
                    Alert::new(
                        RuleId::PlaceholderComment,
                        record.relative.clone(),
                        format!("placeholder comment matches {:?}", pattern.as_str()),
                    )
                    .with_line(line_no)
                    .with_suggestion("replace the placeholder with a real implementation"),
                );
            }
        }
    }
}

/// Comment density per file: comment lines over non-blank lines, with a
/// higher bar for test files (which legitimately narrate) and python
/// docstring delimiters excluded there.
fn check_over_commenting(config: &Config, record: &FileRecord, text: &str, alerts: &mut Vec<Alert>) {
    let basename = record.relative.rsplit('/').next().unwrap_or(&record.relative);
    let is_test = TEST_FILE_PATTERNS.iter().any(|p| p.is_match(basename));

    let mut non_blank = 0usize;
    let mut comments = 0usize;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if is_test && (trimmed.starts_with("\"\"\"") || trimmed.starts_with("'''")) {
            continue;
        }
        non_blank += 1;
        if trimmed.starts_with("//")
            || trimmed.starts_with('#')
            || trimmed.starts_with('*')
            || trimmed.starts_with("/*")
            || trimmed.ends_with("*/")
        {
            comments += 1;
        }
    }

    if non_blank < 5 {
        return;
    }

    let threshold = if is_test {
        0.40
    } else {
        config.laziness.comment_density_threshold
    };
    let density = comments as f64 / non_blank as f64;

    if density > threshold {
        alerts.push(
            Alert::new(
                RuleId::OverCommenting,
                record.relative.clone(),
                format!(
                    "comment density {:.0}% exceeds {:.0}%",
                    density * 100.0,
                    threshold * 100.0
                ),
            )
            .with_line(1)
            .with_suggestion("prune comments that restate the code"),
        );
    }
}

fn check_tree(config: &Config, record: &FileRecord, parsed: &ParsedSource, alerts: &mut Vec<Alert>) {
    let python = record.language == Language::Python;

    if config.laziness.detect_hollow_functions {
        check_hollow_functions(record, parsed, python, alerts);
    }
    if config.laziness.detect_mock_implementations {
        check_mock_implementations(record, parsed, python, alerts);
    }
    if config.laziness.detect_unlogged_errors {
        check_unlogged_errors(record, parsed, python, alerts);
    }
}

const JS_FUNCTION_QUERY: &str = r#"
(function_declaration) @fn
(function_expression) @fn
(arrow_function) @fn
"#;

const PY_FUNCTION_QUERY: &str = "(function_definition) @fn";

fn function_query(python: bool) -> &'static str {
    if python {
        PY_FUNCTION_QUERY
    } else {
        JS_FUNCTION_QUERY
    }
}

fn check_hollow_functions(
    record: &FileRecord,
    parsed: &ParsedSource,
    python: bool,
    alerts: &mut Vec<Alert>,
) {
    for capture in parsed.query(function_query(python)) {
        let Some(body) = capture.node.child_by_field_name("body") else {
            continue;
        };

        let hollow = if body.kind() == "statement_block" || body.kind() == "block" {
            !has_semantic_child(parsed, body, python)
        } else {
            // Expression-bodied arrow: hollow only when the expression is a
            // bare null/undefined.
            matches!(parsed.node_text(body).trim(), "null" | "undefined")
        };

        if hollow {
            alerts.push(
                Alert::new(
                    RuleId::HollowFunction,
                    record.relative.clone(),
                    "function body has no effect",
                )
                .with_line(parsed.line_of(body))
                .with_column(parsed.column_of(body))
                .with_suggestion("implement the function or remove it"),
            );
        }
    }
}

/// Does the body contain anything beyond comments, `pass`, docstrings, and
/// empty/null returns?
fn has_semantic_child(parsed: &ParsedSource, body: Node, python: bool) -> bool {
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        match child.kind() {
            "comment" => continue,
            "pass_statement" if python => continue,
            "expression_statement" if python && is_docstring(child) => continue,
            "return_statement" if !python && is_trivial_return(parsed, child) => continue,
            _ => return true,
        }
    }
    false
}

fn is_docstring(statement: Node) -> bool {
    statement.named_child_count() == 1
        && statement
            .named_child(0)
            .map(|c| c.kind() == "string")
            .unwrap_or(false)
}

fn is_trivial_return(parsed: &ParsedSource, statement: Node) -> bool {
    let text = parsed.node_text(statement).trim().trim_end_matches(';');
    matches!(text, "return" | "return null" | "return undefined")
}

fn check_mock_implementations(
    record: &FileRecord,
    parsed: &ParsedSource,
    python: bool,
    alerts: &mut Vec<Alert>,
) {
    lazy_static! {
        static ref MOCK_NAME: Regex = Regex::new(r"(?i)^(calculate|process)").unwrap();
    }

    for capture in parsed.query(function_query(python)) {
        let Some(name) = function_name(parsed, capture.node) else {
            continue;
        };
        if !MOCK_NAME.is_match(&name) {
            continue;
        }

        let Some(body) = capture.node.child_by_field_name("body") else {
            continue;
        };
        let body_text = parsed.node_text(body).to_lowercase();
        let sleeps = if python {
            body_text.contains("time.sleep") || body_text.contains("sleep(")
        } else {
            body_text.contains("settimeout(") || body_text.contains("sleep(")
        };

        if sleeps {
            alerts.push(
                Alert::new(
                    RuleId::MockImplementation,
                    record.relative.clone(),
                    format!("\"{}\" fakes work with a sleep instead of computing", name),
                )
                .with_line(parsed.line_of(capture.node))
                .with_suggestion("replace the artificial delay with the real computation"),
            );
        }
    }
}

/// Resolve the name of a function node: the declaration's own name, or the
/// variable an anonymous function/arrow is bound to.
fn function_name(parsed: &ParsedSource, node: Node) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        return Some(parsed.node_text(name).to_string());
    }

    let parent = node.parent()?;
    if parent.kind() == "variable_declarator" || parent.kind() == "assignment_expression" {
        let name = parent
            .child_by_field_name("name")
            .or_else(|| parent.child_by_field_name("left"))?;
        return Some(parsed.node_text(name).to_string());
    }
    None
}

fn check_unlogged_errors(
    record: &FileRecord,
    parsed: &ParsedSource,
    python: bool,
    alerts: &mut Vec<Alert>,
) {
    let query = if python {
        "(except_clause) @catch"
    } else {
        "(catch_clause) @catch"
    };

    for capture in parsed.query(query) {
        let body = if python {
            // The block is the last named child of the except clause.
            let count = capture.node.named_child_count();
            (0..count)
                .rev()
                .filter_map(|i| capture.node.named_child(i))
                .find(|c| c.kind() == "block")
        } else {
            capture.node.child_by_field_name("body")
        };
        let Some(body) = body else { continue };

        let body_text = parsed.node_text(body).to_lowercase();
        let logged = LOGGING_MARKERS.iter().any(|m| body_text.contains(m));

        if !logged {
            alerts.push(
                Alert::new(
                    RuleId::UnloggedError,
                    record.relative.clone(),
                    "caught error is silently swallowed",
                )
                .with_line(parsed.line_of(body))
                .with_suggestion("log the error or rethrow it"),
            );
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

    fn run_on(files: &[(&str, &str)]) -> Vec<Alert> {
        run_with_config(files, Config::default())
    }

    fn run_with_config(files: &[(&str, &str)], config: Config) -> Vec<Alert> {
        let temp = TempDir::new().unwrap();
        for (name, content) in files {
            std::fs::write(temp.path().join(name), content).unwrap();
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
        LazinessModule.analyze(&ctx, &mut alerts).unwrap();
        alerts
    }

    #[test]
    fn test_hollow_function_js() {
        let alerts = run_on(&[(
            "a.ts",
            "function empty() { // TODO: Implement later\n  return null;\n}\n",
        )]);

        let hollow: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::HollowFunction)
            .collect();
        assert_eq!(hollow.len(), 1);
        // Anchored at the opening of the body.
        assert_eq!(hollow[0].line, Some(1));
    }

    #[test]
    fn test_non_hollow_function_passes() {
        let alerts = run_on(&[(
            "a.ts",
            "function add(a: number, b: number) {\n  return a + b;\n}\n",
        )]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::HollowFunction));
    }

    #[test]
    fn test_hollow_function_python() {
        let alerts = run_on(&[(
            "a.py",
            "def todo():\n    \"\"\"Does things.\"\"\"\n    pass\n\ndef real():\n    return 42\n",
        )]);

        let hollow: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::HollowFunction)
            .collect();
        assert_eq!(hollow.len(), 1);
    }

    #[test]
    fn test_ai_preamble() {
        let alerts = run_on(&[(
            "a.js",
            "// Here is the updated code with the fix applied:\nconst x = 1;\n",
        )]);
        let preambles: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::AiPreamble)
            .collect();
        assert_eq!(preambles.len(), 1);
        assert_eq!(preambles[0].line, Some(1));
    }

    #[test]
    fn test_placeholder_comment() {
        let alerts = run_on(&[("a.py", "def f():\n    # your code here\n    return 1\n")]);
        assert!(alerts.iter().any(|a| a.rule == RuleId::PlaceholderComment));
    }

    #[test]
    fn test_mock_implementation() {
        let alerts = run_on(&[(
            "a.ts",
            "function calculateTotal(items) {\n  setTimeout(() => {}, 500);\n  return 42;\n}\n",
        )]);
        assert!(alerts.iter().any(|a| a.rule == RuleId::MockImplementation));
    }

    #[test]
    fn test_mock_implementation_requires_name_prefix() {
        let alerts = run_on(&[(
            "a.ts",
            "function fetchTotal(items) {\n  setTimeout(() => {}, 500);\n  return 42;\n}\n",
        )]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::MockImplementation));
    }

    #[test]
    fn test_unlogged_error() {
        let alerts = run_on(&[("h.ts", "try { doWork(); } catch (e) { /* silent */ }\n")]);
        let unlogged: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::UnloggedError)
            .collect();
        assert_eq!(unlogged.len(), 1);
        assert_eq!(unlogged[0].line, Some(1));
    }

    #[test]
    fn test_logged_error_passes() {
        let alerts = run_on(&[(
            "h.ts",
            "try { doWork(); } catch (e) { console.error(e); }\n",
        )]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::UnloggedError));
    }

    #[test]
    fn test_unlogged_except_python() {
        let alerts = run_on(&[(
            "h.py",
            "try:\n    work()\nexcept ValueError:\n    x = 1\n",
        )]);
        assert!(alerts.iter().any(|a| a.rule == RuleId::UnloggedError));

        let alerts = run_on(&[(
            "h.py",
            "try:\n    work()\nexcept ValueError as e:\n    logging.error(e)\n",
        )]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::UnloggedError));
    }

    #[test]
    fn test_over_commenting() {
        let mut source = String::new();
        for i in 0..6 {
            source.push_str(&format!("// comment {}\nlet x{} = {};\n", i, i, i));
        }
        // 6 comments over 12 non-blank lines = 50% > 20%.
        let alerts = run_on(&[("dense.js", source.as_str())]);
        let dense: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::OverCommenting)
            .collect();
        assert_eq!(dense.len(), 1);
    }

    #[test]
    fn test_over_commenting_skips_small_files() {
        let alerts = run_on(&[("tiny.js", "// only\n// comments\nlet x = 1;\n")]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::OverCommenting));
    }

    #[test]
    fn test_over_commenting_test_file_threshold() {
        let mut source = String::new();
        for i in 0..4 {
            source.push_str(&format!("// explains step {}\nassert(x{});\n", i, i));
        }
        source.push_str("assert(final);\nassert(final2);\n");
        // 4 comments over 10 lines = 40%: over the default bar, not over the
        // test-file bar.
        let alerts = run_on(&[("app.test.js", source.as_str())]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::OverCommenting));
    }

    #[test]
    fn test_toggles_disable_checks() {
        let mut config = Config::default();
        config.laziness.detect_ai_preambles = false;
        let alerts = run_with_config(
            &[("a.js", "// Here is the updated code\nconst x = 1;\n")],
            config,
        );
        assert!(alerts.iter().all(|a| a.rule != RuleId::AiPreamble));
    }
}
