//! Core alert taxonomy shared across the pipeline.

use serde::{Deserialize, Serialize};

/// Severity levels for alerts, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    /// All severities, most severe first.
    pub fn all() -> [Severity; 4] {
        [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ]
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CRITICAL" => Ok(Severity::Critical),
            "HIGH" => Ok(Severity::High),
            "MEDIUM" => Ok(Severity::Medium),
            "LOW" => Ok(Severity::Low),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Stable rule identifiers. Severities are fixed per rule and never derived
/// from defect gravity at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleId {
    // Hallucination rules
    #[serde(rename = "phantom-package")]
    PhantomPackage,
    #[serde(rename = "newborn-package")]
    NewbornPackage,
    #[serde(rename = "typosquat-risk")]
    TyposquatRisk,
    // Laziness rules
    #[serde(rename = "ai-preamble")]
    AiPreamble,
    #[serde(rename = "placeholder-comment")]
    PlaceholderComment,
    #[serde(rename = "over-commenting")]
    OverCommenting,
    #[serde(rename = "hollow-function")]
    HollowFunction,
    #[serde(rename = "mock-implementation")]
    MockImplementation,
    #[serde(rename = "unlogged-error")]
    UnloggedError,
    // Security rules
    #[serde(rename = "hardcoded-secret")]
    HardcodedSecret,
    #[serde(rename = "insecure-deserialization")]
    InsecureDeserialization,
    #[serde(rename = "react2shell")]
    React2Shell,
    #[serde(rename = "insecure-jwt")]
    InsecureJwt,
    #[serde(rename = "insecure-jwt-none")]
    InsecureJwtNone,
    #[serde(rename = "missing-env-check")]
    MissingEnvCheck,
    #[serde(rename = "hardcoded-production-url")]
    HardcodedProductionUrl,
    #[serde(rename = "low-scorecard-score")]
    LowScorecardScore,
    // Architecture rules
    #[serde(rename = "god-function")]
    GodFunction,
    #[serde(rename = "mixed-naming")]
    MixedNaming,
    #[serde(rename = "magic-number")]
    MagicNumber,
    #[serde(rename = "circular-dependency")]
    CircularDependency,
    #[serde(rename = "unused-export")]
    UnusedExport,
    // Cost rules
    #[serde(rename = "expensive-api-in-loop")]
    ExpensiveApiInLoop,
    #[serde(rename = "missing-cache-for-expensive-call")]
    MissingCacheForExpensiveCall,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::PhantomPackage => "phantom-package",
            RuleId::NewbornPackage => "newborn-package",
            RuleId::TyposquatRisk => "typosquat-risk",
            RuleId::AiPreamble => "ai-preamble",
            RuleId::PlaceholderComment => "placeholder-comment",
            RuleId::OverCommenting => "over-commenting",
            RuleId::HollowFunction => "hollow-function",
            RuleId::MockImplementation => "mock-implementation",
            RuleId::UnloggedError => "unlogged-error",
            RuleId::HardcodedSecret => "hardcoded-secret",
            RuleId::InsecureDeserialization => "insecure-deserialization",
            RuleId::React2Shell => "react2shell",
            RuleId::InsecureJwt => "insecure-jwt",
            RuleId::InsecureJwtNone => "insecure-jwt-none",
            RuleId::MissingEnvCheck => "missing-env-check",
            RuleId::HardcodedProductionUrl => "hardcoded-production-url",
            RuleId::LowScorecardScore => "low-scorecard-score",
            RuleId::GodFunction => "god-function",
            RuleId::MixedNaming => "mixed-naming",
            RuleId::MagicNumber => "magic-number",
            RuleId::CircularDependency => "circular-dependency",
            RuleId::UnusedExport => "unused-export",
            RuleId::ExpensiveApiInLoop => "expensive-api-in-loop",
            RuleId::MissingCacheForExpensiveCall => "missing-cache-for-expensive-call",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "phantom-package" => Some(RuleId::PhantomPackage),
            "newborn-package" => Some(RuleId::NewbornPackage),
            "typosquat-risk" => Some(RuleId::TyposquatRisk),
            "ai-preamble" => Some(RuleId::AiPreamble),
            "placeholder-comment" => Some(RuleId::PlaceholderComment),
            "over-commenting" => Some(RuleId::OverCommenting),
            "hollow-function" => Some(RuleId::HollowFunction),
            "mock-implementation" => Some(RuleId::MockImplementation),
            "unlogged-error" => Some(RuleId::UnloggedError),
            "hardcoded-secret" => Some(RuleId::HardcodedSecret),
            "insecure-deserialization" => Some(RuleId::InsecureDeserialization),
            "react2shell" => Some(RuleId::React2Shell),
            "insecure-jwt" => Some(RuleId::InsecureJwt),
            "insecure-jwt-none" => Some(RuleId::InsecureJwtNone),
            "missing-env-check" => Some(RuleId::MissingEnvCheck),
            "hardcoded-production-url" => Some(RuleId::HardcodedProductionUrl),
            "low-scorecard-score" => Some(RuleId::LowScorecardScore),
            "god-function" => Some(RuleId::GodFunction),
            "mixed-naming" => Some(RuleId::MixedNaming),
            "magic-number" => Some(RuleId::MagicNumber),
            "circular-dependency" => Some(RuleId::CircularDependency),
            "unused-export" => Some(RuleId::UnusedExport),
            "expensive-api-in-loop" => Some(RuleId::ExpensiveApiInLoop),
            "missing-cache-for-expensive-call" => Some(RuleId::MissingCacheForExpensiveCall),
            _ => None,
        }
    }

    /// The fixed severity for this rule.
    ///
    /// `insecure-deserialization` is the one language-split rule: CRITICAL on
    /// python (`pickle` executes arbitrary bytecode), HIGH on js/ts. The
    /// python severity is the default here; the security module passes the
    /// js/ts severity explicitly.
    pub fn severity(&self) -> Severity {
        match self {
            RuleId::PhantomPackage => Severity::Critical,
            RuleId::HardcodedSecret => Severity::Critical,
            RuleId::InsecureDeserialization => Severity::Critical,
            RuleId::React2Shell => Severity::Critical,
            RuleId::InsecureJwtNone => Severity::Critical,

            RuleId::PlaceholderComment => Severity::High,
            RuleId::HollowFunction => Severity::High,
            RuleId::MockImplementation => Severity::High,
            RuleId::InsecureJwt => Severity::High,
            RuleId::HardcodedProductionUrl => Severity::High,
            RuleId::GodFunction => Severity::High,
            RuleId::CircularDependency => Severity::High,
            RuleId::ExpensiveApiInLoop => Severity::High,

            RuleId::NewbornPackage => Severity::Medium,
            RuleId::TyposquatRisk => Severity::Medium,
            RuleId::AiPreamble => Severity::Medium,
            RuleId::UnloggedError => Severity::Medium,
            RuleId::MissingEnvCheck => Severity::Medium,
            RuleId::LowScorecardScore => Severity::Medium,
            RuleId::MixedNaming => Severity::Medium,
            RuleId::MissingCacheForExpensiveCall => Severity::Medium,

            RuleId::OverCommenting => Severity::Low,
            RuleId::MagicNumber => Severity::Low,
            RuleId::UnusedExport => Severity::Low,
        }
    }

    /// The module this rule belongs to.
    pub fn module(&self) -> &'static str {
        match self {
            RuleId::PhantomPackage | RuleId::NewbornPackage | RuleId::TyposquatRisk => {
                "hallucination"
            }
            RuleId::AiPreamble
            | RuleId::PlaceholderComment
            | RuleId::OverCommenting
            | RuleId::HollowFunction
            | RuleId::MockImplementation
            | RuleId::UnloggedError => "laziness",
            RuleId::HardcodedSecret
            | RuleId::InsecureDeserialization
            | RuleId::React2Shell
            | RuleId::InsecureJwt
            | RuleId::InsecureJwtNone
            | RuleId::MissingEnvCheck
            | RuleId::HardcodedProductionUrl
            | RuleId::LowScorecardScore => "security",
            RuleId::GodFunction
            | RuleId::MixedNaming
            | RuleId::MagicNumber
            | RuleId::CircularDependency
            | RuleId::UnusedExport => "architecture",
            RuleId::ExpensiveApiInLoop | RuleId::MissingCacheForExpensiveCall => "cost",
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single detected issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Stable within a run; assigned after the final sort.
    pub id: usize,
    pub severity: Severity,
    pub rule: RuleId,
    pub module: String,
    pub message: String,
    pub file: String,
    /// 1-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 1-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Alert {
    /// Build an alert with the rule's fixed severity. The id is assigned by
    /// the coordinator once the final order is known.
    pub fn new(rule: RuleId, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: 0,
            severity: rule.severity(),
            rule,
            module: rule.module().to_string(),
            message: message.into(),
            file: file.into(),
            line: None,
            column: None,
            suggestion: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Deduplication key: first occurrence wins.
    pub fn dedup_key(&self) -> (String, usize, RuleId, String) {
        (
            self.file.clone(),
            self.line.unwrap_or(0),
            self.rule,
            self.message.clone(),
        )
    }

    /// Sort key for the deterministic final ordering.
    pub fn sort_key(&self) -> (String, usize, &'static str, String) {
        (
            self.file.clone(),
            self.line.unwrap_or(0),
            self.rule.as_str(),
            self.message.clone(),
        )
    }
}
