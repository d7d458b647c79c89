//! Rule modules.
//!
//! Each module exposes a name, an enable switch, and an analyze pass that
//! appends alerts to the shared accumulator. Modules run in a fixed order:
//! hallucination, laziness, security, architecture, cost. A failure inside
//! one module is isolated by the coordinator and never aborts the run.

mod architecture;
mod cost;
mod hallucination;
mod laziness;
mod security;
mod textscan;
mod toplist;

pub use toplist::{levenshtein, TopPackages};

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::alert::Alert;
use crate::config::Config;
use crate::registry::{PackageSource, ScorecardSource};
use crate::scanner::FileRecord;

/// Cooperative cancellation flag checked between units of work.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Everything a rule module may consult during a run.
pub struct RuleContext<'a> {
    /// Scan root; alert paths are relative to it.
    pub root: &'a Path,
    pub config: &'a Config,
    pub files: &'a [FileRecord],
    pub registry: &'a dyn PackageSource,
    pub scorecard: &'a dyn ScorecardSource,
    pub top_packages: &'a TopPackages,
    pub cancel: &'a CancelToken,
}

/// A pluggable analysis module.
pub trait RuleModule: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_enabled(&self, config: &Config) -> bool;

    /// Run the module, appending to the shared alert accumulator. Modules
    /// may observe alerts emitted by earlier modules; none currently do.
    fn analyze(&self, ctx: &RuleContext, alerts: &mut Vec<Alert>) -> anyhow::Result<()>;
}

/// The modules in their fixed execution order.
pub fn registered_modules() -> Vec<Box<dyn RuleModule>> {
    vec![
        Box::new(hallucination::HallucinationModule),
        Box::new(laziness::LazinessModule),
        Box::new(security::SecurityModule),
        Box::new(architecture::ArchitectureModule),
        Box::new(cost::CostModule),
    ]
}

/// Read a file for analysis, logging and skipping on failure so one
/// unreadable file never poisons the run.
pub(crate) fn read_source(record: &FileRecord) -> Option<String> {
    match std::fs::read_to_string(&record.path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!("cannot read {}: {}", record.path.display(), e);
            None
        }
    }
}
