//! The report produced by a run.
//!
//! The core hands this structure to its callers (CLI, formatters); it never
//! renders human-readable text itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::Alert;
use crate::config::Config;
use crate::score::Summary;

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub summary: Summary,
    /// Deduplicated, severity-filtered, sorted by (file, line, rule,
    /// message).
    pub alerts: Vec<Alert>,
    /// Health score in [0, 100].
    pub score: f64,
    pub metadata: ScanMetadata,
}

/// Self-describing run metadata embedded in every report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub root: String,
    pub file_count: usize,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    /// The resolved configuration the run actually used.
    pub config: Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::RuleId;
    use crate::score;

    #[test]
    fn test_report_serializes_round_trip() {
        let alerts = vec![Alert::new(RuleId::MagicNumber, "a.ts", "magic number 7").with_line(3)];
        let summary = Summary::from_alerts(&alerts);
        let report = Report {
            score: score::score(&summary),
            summary,
            alerts,
            metadata: ScanMetadata {
                root: "/tmp/project".to_string(),
                file_count: 1,
                duration_ms: 12,
                timestamp: Utc::now(),
                config: Config::default(),
            },
        };

        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary, report.summary);
        assert_eq!(back.alerts.len(), 1);
        assert_eq!(back.metadata.file_count, 1);
    }

    #[test]
    fn test_alert_severity_serializes_uppercase() {
        let alert = Alert::new(RuleId::PhantomPackage, "package.json", "gone");
        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("\"CRITICAL\""));
        assert!(json.contains("\"phantom-package\""));
    }
}
