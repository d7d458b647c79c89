//! Cost detection: metered vendor APIs called inside loops, and expensive
//! calls with no caching anywhere in the function.

use rayon::prelude::*;

use crate::alert::{Alert, RuleId};
use crate::config::Config;
use crate::scanner::{FileRecord, Language};
use crate::syntax::ParsedSource;

use super::{read_source, RuleContext, RuleModule};

/// Vendor calls with a known per-invocation price tag, matched as
/// lowercased substrings.
const EXPENSIVE_APIS: &[&str] = &[
    "openai.chat.completions.create",
    "openai.completions.create",
    "openai.embeddings.create",
    "openai.images.generate",
    "anthropic.messages.create",
    "anthropic.completions.create",
    "cohere.generate",
    "replicate.run",
    "cloudinary.uploader.upload",
    "cloudinary.uploader.destroy",
    "sharp(",
    "ffmpeg",
    "cloudconvert",
];

/// Evidence of pacing around a loop body.
const RATE_LIMIT_MARKERS: &[&str] = &[
    "p-limit",
    "plimit",
    "bottleneck",
    "ratelimit",
    "sleep(",
    "delay(",
    "wait(",
    "throttle",
    "debounce",
    "asyncio.sleep",
    "time.sleep",
];

/// Evidence of memoization around an expensive call.
const CACHE_MARKERS: &[&str] = &[
    "cache.get",
    "cache.set",
    "redis.get",
    "redis.set",
    "localstorage.get",
    "sessionstorage.get",
    "map.get",
    "map.set",
    "lru",
    "memoize",
    "@cache",
    "functools.lru_cache",
];

const JS_LOOP_QUERY: &str = r#"
(for_statement) @loop
(for_in_statement) @loop
(while_statement) @loop
(do_statement) @loop
"#;

const PY_LOOP_QUERY: &str = r#"
(for_statement) @loop
(while_statement) @loop
"#;

const JS_FUNCTION_QUERY: &str = r#"
(function_declaration) @fn
(function_expression) @fn
(arrow_function) @fn
"#;

const PY_FUNCTION_QUERY: &str = "(function_definition) @fn";

pub struct CostModule;

impl RuleModule for CostModule {
    fn name(&self) -> &'static str {
        "cost"
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.modules.cost
    }

    fn analyze(&self, ctx: &RuleContext, alerts: &mut Vec<Alert>) -> anyhow::Result<()> {
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
                let Some(parsed) = ParsedSource::parse(record.language, &record.path, &text)
                else {
                    return Vec::new();
                };

                let python = record.language == Language::Python;
                let mut file_alerts = Vec::new();
                check_loops(record, &parsed, python, &mut file_alerts);
                check_uncached_functions(record, &parsed, python, &mut file_alerts);
                file_alerts
            })
            .collect();

        for file_alerts in per_file {
            alerts.extend(file_alerts);
        }

        Ok(())
    }
}

fn expensive_api_in(text: &str) -> Option<&'static str> {
    EXPENSIVE_APIS.iter().find(|api| text.contains(*api)).copied()
}

fn check_loops(record: &FileRecord, parsed: &ParsedSource, python: bool, alerts: &mut Vec<Alert>) {
    let query = if python { PY_LOOP_QUERY } else { JS_LOOP_QUERY };

    for capture in parsed.query(query) {
        let body = capture
            .node
            .child_by_field_name("body")
            .unwrap_or(capture.node);
        let body_text = parsed.node_text(body).to_lowercase();

        let Some(api) = expensive_api_in(&body_text) else {
            continue;
        };
        let paced = RATE_LIMIT_MARKERS.iter().any(|m| body_text.contains(m));

        if !paced {
            alerts.push(
                Alert::new(
                    RuleId::ExpensiveApiInLoop,
                    record.relative.clone(),
                    format!("{} called inside a loop with no rate limiting", api.trim_end_matches('(')),
                )
                .with_line(parsed.line_of(capture.node))
                .with_suggestion("batch the calls or add rate limiting around the loop"),
            );
        }
    }
}

fn check_uncached_functions(
    record: &FileRecord,
    parsed: &ParsedSource,
    python: bool,
    alerts: &mut Vec<Alert>,
) {
    let query = if python {
        PY_FUNCTION_QUERY
    } else {
        JS_FUNCTION_QUERY
    };

    for capture in parsed.query(query) {
        let Some(body) = capture.node.child_by_field_name("body") else {
            continue;
        };
        let body_text = parsed.node_text(body).to_lowercase();

        let Some(api) = expensive_api_in(&body_text) else {
            continue;
        };
        let cached = CACHE_MARKERS.iter().any(|m| body_text.contains(m));

        if !cached {
            alerts.push(
                Alert::new(
                    RuleId::MissingCacheForExpensiveCall,
                    record.relative.clone(),
                    format!("{} result is not cached", api.trim_end_matches('(')),
                )
                .with_line(parsed.line_of(capture.node))
                .with_suggestion("memoize the call or cache its result"),
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

    fn run(files: &[(&str, &str)]) -> Vec<Alert> {
        let temp = TempDir::new().unwrap();
        for (name, content) in files {
            std::fs::write(temp.path().join(name), content).unwrap();
        }

        let config = Config::default();
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
        CostModule.analyze(&ctx, &mut alerts).unwrap();
        alerts
    }

    #[test]
    fn test_expensive_api_in_loop() {
        let source = "async function embedAll(rows) {\n  for (const row of rows) {\n    await openai.embeddings.create({ input: row });\n  }\n}\n";
        let alerts = run(&[("a.ts", source)]);
        let hits: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::ExpensiveApiInLoop)
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(2));
    }

    #[test]
    fn test_rate_limited_loop_passes() {
        let source = "async function embedAll(rows) {\n  for (const row of rows) {\n    await openai.embeddings.create({ input: row });\n    await sleep(200);\n  }\n}\n";
        let alerts = run(&[("a.ts", source)]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::ExpensiveApiInLoop));
    }

    #[test]
    fn test_python_loop() {
        let source = "def embed_all(rows):\n    for row in rows:\n        openai.embeddings.create(input=row)\n";
        let alerts = run(&[("a.py", source)]);
        assert!(alerts.iter().any(|a| a.rule == RuleId::ExpensiveApiInLoop));

        let paced = "def embed_all(rows):\n    for row in rows:\n        openai.embeddings.create(input=row)\n        time.sleep(1)\n";
        let alerts = run(&[("b.py", paced)]);
        assert!(alerts.iter().all(|a| a.rule != RuleId::ExpensiveApiInLoop));
    }

    #[test]
    fn test_missing_cache() {
        let source = "async function describe(image) {\n  return anthropic.messages.create({ input: image });\n}\n";
        let alerts = run(&[("a.ts", source)]);
        let hits: Vec<_> = alerts
            .iter()
            .filter(|a| a.rule == RuleId::MissingCacheForExpensiveCall)
            .collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_cached_call_passes() {
        let source = "async function describe(image) {\n  const hit = cache.get(image);\n  if (hit) return hit;\n  const out = await anthropic.messages.create({ input: image });\n  cache.set(image, out);\n  return out;\n}\n";
        let alerts = run(&[("a.ts", source)]);
        assert!(alerts
            .iter()
            .all(|a| a.rule != RuleId::MissingCacheForExpensiveCall));
    }

    #[test]
    fn test_cheap_loop_ignored() {
        let source = "function sum(xs) {\n  let total = 0;\n  for (const x of xs) {\n    total += x;\n  }\n  return total;\n}\n";
        let alerts = run(&[("a.ts", source)]);
        assert!(alerts.is_empty());
    }
}
