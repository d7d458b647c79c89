//! Per-rule suppression globs.
//!
//! `ignoreRules` maps a rule-id to glob patterns; a rule is suppressed for a
//! file when any of its patterns matches the file's scan-relative path. A
//! bare filename pattern (no `/`) matches that basename anywhere in the
//! tree.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashMap;

use crate::alert::RuleId;
use crate::config::Config;

pub struct IgnoreMatcher {
    /// rule-id string -> (full-path globs, basename globs)
    rules: HashMap<String, (GlobSet, GlobSet)>,
}

impl IgnoreMatcher {
    /// Compile the configured suppression globs. Patterns were already
    /// validated by `Config::validate`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut rules = HashMap::new();

        for (rule, patterns) in &config.ignore_rules {
            let mut paths = GlobSetBuilder::new();
            let mut basenames = GlobSetBuilder::new();

            for pattern in patterns {
                if pattern.contains('/') {
                    paths.add(Glob::new(pattern)?);
                } else {
                    basenames.add(Glob::new(pattern)?);
                }
            }

            rules.insert(rule.clone(), (paths.build()?, basenames.build()?));
        }

        Ok(Self { rules })
    }

    /// True when alerts for `rule` in `relative_path` are suppressed.
    pub fn is_suppressed(&self, rule: RuleId, relative_path: &str) -> bool {
        let Some((paths, basenames)) = self.rules.get(rule.as_str()) else {
            return false;
        };

        if paths.is_match(relative_path) {
            return true;
        }

        let basename = relative_path.rsplit('/').next().unwrap_or(relative_path);
        basenames.is_match(basename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(rule: &str, patterns: &[&str]) -> IgnoreMatcher {
        let mut config = Config::default();
        config.ignore_rules.insert(
            rule.to_string(),
            patterns.iter().map(|s| s.to_string()).collect(),
        );
        IgnoreMatcher::new(&config).unwrap()
    }

    #[test]
    fn test_path_glob() {
        let m = matcher("magic-number", &["tests/**"]);
        assert!(m.is_suppressed(RuleId::MagicNumber, "tests/fixtures/data.ts"));
        assert!(!m.is_suppressed(RuleId::MagicNumber, "src/data.ts"));
        // Other rules are unaffected.
        assert!(!m.is_suppressed(RuleId::HollowFunction, "tests/fixtures/data.ts"));
    }

    #[test]
    fn test_double_star_spans_directories() {
        let m = matcher("over-commenting", &["**/generated/**"]);
        assert!(m.is_suppressed(RuleId::OverCommenting, "src/deep/generated/api.ts"));
    }

    #[test]
    fn test_bare_filename_matches_anywhere() {
        let m = matcher("hardcoded-secret", &["fixtures.ts"]);
        assert!(m.is_suppressed(RuleId::HardcodedSecret, "fixtures.ts"));
        assert!(m.is_suppressed(RuleId::HardcodedSecret, "src/deep/fixtures.ts"));
        assert!(!m.is_suppressed(RuleId::HardcodedSecret, "src/other.ts"));
    }

    #[test]
    fn test_bare_wildcard_pattern() {
        let m = matcher("unused-export", &["*.stories.tsx"]);
        assert!(m.is_suppressed(RuleId::UnusedExport, "src/ui/Button.stories.tsx"));
        assert!(!m.is_suppressed(RuleId::UnusedExport, "src/ui/Button.tsx"));
    }

    #[test]
    fn test_unknown_rule_never_suppressed() {
        let m = matcher("magic-number", &["**"]);
        assert!(!m.is_suppressed(RuleId::GodFunction, "src/a.ts"));
    }
}
