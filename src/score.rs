//! Run scoring.
//!
//! Condenses a run's alert counts into a 0-100 health score. The weights
//! are logarithmic so the first critical finding hurts far more than the
//! fortieth low one.

use serde::{Deserialize, Serialize};

use crate::alert::{Alert, Severity};

/// Alert counts by severity for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl Summary {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        let mut summary = Self::default();
        for alert in alerts {
            match alert.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
        }
        summary.total = alerts.len();
        summary
    }
}

/// Health score in [0, 100]:
/// `100 - 20*log10(1+5c) - 10*log10(1+5h) - 5*log10(1+m) - 2*log10(1+l)`,
/// clamped at 0.
pub fn score(summary: &Summary) -> f64 {
    let c = summary.critical as f64;
    let h = summary.high as f64;
    let m = summary.medium as f64;
    let l = summary.low as f64;

    let score = 100.0
        - 20.0 * (1.0 + 5.0 * c).log10()
        - 10.0 * (1.0 + 5.0 * h).log10()
        - 5.0 * (1.0 + m).log10()
        - 2.0 * (1.0 + l).log10();

    score.max(0.0)
}
