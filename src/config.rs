//! Configuration schema for a scan.
//!
//! The configuration is an inert value: the core validates it once and then
//! threads an immutable reference through the pipeline. Loading and merging
//! config files is the caller's job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::alert::Severity;

/// Errors surfaced by [`Config::validate`]. Any of these makes the pipeline
/// refuse to run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{option}: value {value} outside valid range {range}")]
    OutOfRange {
        option: &'static str,
        value: String,
        range: &'static str,
    },
    #[error("invalid glob pattern {pattern:?} in {option}: {source}")]
    BadGlob {
        option: &'static str,
        pattern: String,
        source: globset::Error,
    },
    #[error("invalid regex {pattern:?} in laziness.patterns: {source}")]
    BadRegex {
        pattern: String,
        source: regex::Error,
    },
}

/// Top-level scan configuration. All fields have defaults; an empty document
/// deserializes to the default configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Alerts whose severity is not in this set are dropped.
    pub severity: Vec<Severity>,
    pub modules: ModuleToggles,
    pub hallucination: HallucinationConfig,
    pub laziness: LazinessConfig,
    pub security: SecurityConfig,
    pub architecture: ArchitectureConfig,
    pub supply_chain: SupplyChainConfig,
    pub scanning: ScanningConfig,
    /// rule-id -> glob patterns whose matching files suppress that rule.
    pub ignore_rules: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            severity: Severity::all().to_vec(),
            modules: ModuleToggles::default(),
            hallucination: HallucinationConfig::default(),
            laziness: LazinessConfig::default(),
            security: SecurityConfig::default(),
            architecture: ArchitectureConfig::default(),
            supply_chain: SupplyChainConfig::default(),
            scanning: ScanningConfig::default(),
            ignore_rules: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Validate numeric ranges and compile every configured glob and regex.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dist = self.hallucination.typosquat_levenshtein_distance;
        if !(1..=3).contains(&dist) {
            return Err(ConfigError::OutOfRange {
                option: "hallucination.typosquatLevenshteinDistance",
                value: dist.to_string(),
                range: "1..=3",
            });
        }

        let density = self.laziness.comment_density_threshold;
        if !(density > 0.0 && density <= 1.0) {
            return Err(ConfigError::OutOfRange {
                option: "laziness.commentDensityThreshold",
                value: density.to_string(),
                range: "(0, 1]",
            });
        }

        let entropy = self.security.secret_entropy_threshold;
        if !(entropy > 0.0 && entropy <= 8.0) {
            return Err(ConfigError::OutOfRange {
                option: "security.secretEntropyThreshold",
                value: entropy.to_string(),
                range: "(0, 8]",
            });
        }

        if self.architecture.cyclomatic_complexity_threshold == 0 {
            return Err(ConfigError::OutOfRange {
                option: "architecture.cyclomaticComplexityThreshold",
                value: "0".to_string(),
                range: ">= 1",
            });
        }
        if self.architecture.lines_of_code_threshold == 0 {
            return Err(ConfigError::OutOfRange {
                option: "architecture.linesOfCodeThreshold",
                value: "0".to_string(),
                range: ">= 1",
            });
        }
        if self.scanning.max_file_size == 0 {
            return Err(ConfigError::OutOfRange {
                option: "scanning.maxFileSize",
                value: "0".to_string(),
                range: ">= 1",
            });
        }

        for pattern in &self.laziness.patterns {
            regex::Regex::new(&format!("(?i){}", pattern)).map_err(|e| ConfigError::BadRegex {
                pattern: pattern.clone(),
                source: e,
            })?;
        }

        Self::check_globs("scanning.include", &self.scanning.include)?;
        Self::check_globs("scanning.exclude", &self.scanning.exclude)?;
        for patterns in self.ignore_rules.values() {
            Self::check_globs("ignoreRules", patterns)?;
        }

        Ok(())
    }

    fn check_globs(option: &'static str, patterns: &[String]) -> Result<(), ConfigError> {
        for pattern in patterns {
            globset::Glob::new(pattern).map_err(|e| ConfigError::BadGlob {
                option,
                pattern: pattern.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Whether alerts of this severity pass the filter.
    pub fn severity_enabled(&self, severity: Severity) -> bool {
        self.severity.contains(&severity)
    }
}

/// Per-module enable switches.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleToggles {
    pub hallucination: bool,
    pub laziness: bool,
    pub security: bool,
    pub architecture: bool,
    pub cost: bool,
}

impl Default for ModuleToggles {
    fn default() -> Self {
        Self {
            hallucination: true,
            laziness: true,
            security: true,
            architecture: true,
            cost: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HallucinationConfig {
    /// Packages younger than this many days are flagged as newborn
    /// (only when `supplyChain.checkNewborn` is set).
    pub package_age_threshold_days: u32,
    /// Packages with fewer downloads than this are considered obscure.
    pub package_download_threshold: u64,
    /// Levenshtein distance against the top-package list that triggers a
    /// typosquat alert. Valid range 1-3; distance 0 never triggers.
    pub typosquat_levenshtein_distance: usize,
    /// How many entries of the top-package list to compare against.
    pub top_packages_count: usize,
}

impl Default for HallucinationConfig {
    fn default() -> Self {
        Self {
            package_age_threshold_days: 30,
            package_download_threshold: 500,
            typosquat_levenshtein_distance: 1,
            top_packages_count: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LazinessConfig {
    /// Case-insensitive regexes matched per line for placeholder comments.
    pub patterns: Vec<String>,
    #[serde(rename = "detectAIPreambles")]
    pub detect_ai_preambles: bool,
    pub detect_hollow_functions: bool,
    pub detect_mock_implementations: bool,
    pub detect_placeholder_comments: bool,
    pub detect_over_commenting: bool,
    pub detect_unlogged_errors: bool,
    pub comment_density_threshold: f64,
}

impl LazinessConfig {
    pub fn default_patterns() -> Vec<String> {
        [
            r"TODO:?\s*implement",
            r"FIXME:?\s*implement",
            r"your\s+(code|logic|implementation)\s+(goes\s+)?here",
            r"implementation\s+(goes|left)\s+here",
            r"rest\s+of\s+(the\s+)?(code|function|file)",
            r"add\s+(your|actual|real)\s+\w+\s+here",
            r"not\s+implemented\s+yet",
            r"implement\s+(this|me)\s+later",
            r"placeholder",
            r"fill\s+in\s+the\s+blanks?",
            r"\.\.\.\s*existing\s+code\s*\.\.\.",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

impl Default for LazinessConfig {
    fn default() -> Self {
        Self {
            patterns: Self::default_patterns(),
            detect_ai_preambles: true,
            detect_hollow_functions: true,
            detect_mock_implementations: true,
            detect_placeholder_comments: true,
            detect_over_commenting: true,
            detect_unlogged_errors: true,
            comment_density_threshold: 0.20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityConfig {
    pub detect_hardcoded_secrets: bool,
    pub detect_insecure_deserialization: bool,
    #[serde(rename = "detectReact2Shell")]
    pub detect_react2_shell: bool,
    #[serde(rename = "detectInsecureJWT")]
    pub detect_insecure_jwt: bool,
    pub detect_missing_env_check: bool,
    #[serde(rename = "detectHardcodedProductionURL")]
    pub detect_hardcoded_production_url: bool,
    /// Shannon entropy (bits/char) above which a long quoted string is
    /// reported as a likely secret.
    pub secret_entropy_threshold: f64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            detect_hardcoded_secrets: true,
            detect_insecure_deserialization: true,
            detect_react2_shell: true,
            detect_insecure_jwt: true,
            detect_missing_env_check: true,
            detect_hardcoded_production_url: true,
            secret_entropy_threshold: 4.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchitectureConfig {
    pub cyclomatic_complexity_threshold: usize,
    pub lines_of_code_threshold: usize,
    pub detect_mixed_naming: bool,
    pub detect_circular_dependencies: bool,
    pub detect_magic_numbers: bool,
    pub detect_unused_exports: bool,
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            cyclomatic_complexity_threshold: 25,
            lines_of_code_threshold: 100,
            detect_mixed_naming: true,
            detect_circular_dependencies: true,
            detect_magic_numbers: true,
            detect_unused_exports: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupplyChainConfig {
    pub check_newborn: bool,
    pub check_scorecard: bool,
    pub min_scorecard_score: f64,
}

impl Default for SupplyChainConfig {
    fn default() -> Self {
        Self {
            check_newborn: false,
            check_scorecard: false,
            min_scorecard_score: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanningConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
    pub follow_symlinks: bool,
}

impl ScanningConfig {
    pub fn default_include() -> Vec<String> {
        [
            "**/*.js",
            "**/*.jsx",
            "**/*.mjs",
            "**/*.cjs",
            "**/*.ts",
            "**/*.tsx",
            "**/*.py",
            "**/*.rs",
            "**/*.go",
            "**/*.vue",
            "**/*.svelte",
            "**/package.json",
            "**/requirements.txt",
            "**/pyproject.toml",
            "**/Cargo.toml",
            "**/go.mod",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            include: Self::default_include(),
            exclude: Vec::new(),
            max_file_size: 1_048_576,
            follow_symlinks: false,
        }
    }
}
