//! Pipeline coordinator.
//!
//! Drives the stages in order: scan files, run the enabled rule modules,
//! apply per-rule suppressions and the severity filter, deduplicate, sort,
//! and assemble the report. A failure inside any one module is logged and
//! isolated; only invalid configuration or cancellation aborts a run.

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tracing::warn;

use crate::alert::Alert;
use crate::config::Config;
use crate::ignore::IgnoreMatcher;
use crate::registry::{PackageSource, RegistryClient, ScorecardClient, ScorecardSource};
use crate::report::{Report, ScanMetadata};
use crate::rules::{registered_modules, CancelToken, RuleContext, TopPackages};
use crate::scanner::FileScanner;
use crate::score::{self, Summary};

/// Analyze a directory with the live registry and scorecard clients.
pub fn analyze<P: AsRef<Path>>(root: P, config: &Config) -> anyhow::Result<Report> {
    let registry = RegistryClient::new()?;
    let scorecard = ScorecardClient::new()?;
    let coordinator = Coordinator::new(&registry, &scorecard, config);
    coordinator.analyze(root, config)
}

/// Coordinator with injectable upstream clients (the seam the tests use).
pub struct Coordinator<'a> {
    registry: &'a dyn PackageSource,
    scorecard: &'a dyn ScorecardSource,
    top_packages: TopPackages,
    cancel: CancelToken,
}

impl<'a> Coordinator<'a> {
    pub fn new(
        registry: &'a dyn PackageSource,
        scorecard: &'a dyn ScorecardSource,
        config: &Config,
    ) -> Self {
        Self {
            registry,
            scorecard,
            top_packages: TopPackages::builtin(config.hallucination.top_packages_count),
            cancel: CancelToken::new(),
        }
    }

    /// Swap the typosquat reference list (tests, out-of-band refresh).
    pub fn with_top_packages(mut self, top_packages: TopPackages) -> Self {
        self.top_packages = top_packages;
        self
    }

    /// Token callers may use to stop the run from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the full pipeline. Partial results are discarded on
    /// cancellation.
    pub fn analyze<P: AsRef<Path>>(&self, root: P, config: &Config) -> anyhow::Result<Report> {
        config.validate()?;
        let started = Instant::now();

        let scanner = FileScanner::new(root.as_ref(), &config.scanning)?;
        let files = scanner.scan();
        let ignore = IgnoreMatcher::new(config)?;

        let ctx = RuleContext {
            root: scanner.root(),
            config,
            files: &files,
            registry: self.registry,
            scorecard: self.scorecard,
            top_packages: &self.top_packages,
            cancel: &self.cancel,
        };

        let mut alerts: Vec<Alert> = Vec::new();
        for module in registered_modules() {
            if self.cancel.is_cancelled() {
                break;
            }
            if !module.is_enabled(config) {
                continue;
            }
            if let Err(e) = module.analyze(&ctx, &mut alerts) {
                warn!("module {} failed: {:#}", module.name(), e);
            }
        }

        if self.cancel.is_cancelled() {
            anyhow::bail!("scan cancelled");
        }

        // Suppressions, severity filter, dedup (first occurrence wins),
        // then the deterministic final order.
        alerts.retain(|a| !ignore.is_suppressed(a.rule, &a.file));
        alerts.retain(|a| config.severity_enabled(a.severity));

        let mut seen = HashSet::new();
        alerts.retain(|a| seen.insert(a.dedup_key()));

        alerts.sort_by_key(|a| a.sort_key());
        for (idx, alert) in alerts.iter_mut().enumerate() {
            alert.id = idx + 1;
        }

        let summary = Summary::from_alerts(&alerts);

        Ok(Report {
            score: score::score(&summary),
            summary,
            alerts,
            metadata: ScanMetadata {
                root: scanner.root().display().to_string(),
                file_count: files.len(),
                duration_ms: started.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
                config: config.clone(),
            },
        })
    }
}
