//! Slopscan - static analysis for careless and AI-generated code.
//!
//! Slopscan walks a mixed-language source tree (JavaScript, TypeScript,
//! Python, Rust, Go, plus Vue/Svelte components) and flags the patterns
//! that betray unreviewed generation: fabricated dependencies, hollow
//! function bodies, hardcoded secrets, architectural smells, and
//! cost-unsafe API usage. Results are heuristic and advisory.
//!
//! # Architecture
//!
//! - `scanner`: file discovery and language classification
//! - `manifest`: dependency manifest parsing (npm/pypi/crates/go formats)
//! - `registry`: package registry and scorecard clients, with caching
//! - `syntax`: tree-sitter facade over the supported grammars
//! - `graph`: cross-file import graph and cycle detection
//! - `rules`: the five analysis modules that emit alerts
//! - `coordinator`: pipeline driver producing a [`report::Report`]
//!
//! # Entry point
//!
//! ```no_run
//! let config = slopscan::Config::default();
//! let report = slopscan::analyze("path/to/project", &config).unwrap();
//! println!("{} alerts, score {:.1}", report.summary.total, report.score);
//! ```

pub mod alert;
pub mod config;
pub mod coordinator;
pub mod graph;
pub mod ignore;
pub mod manifest;
pub mod registry;
pub mod report;
pub mod rules;
pub mod scanner;
pub mod score;
pub mod syntax;

pub use alert::{Alert, RuleId, Severity};
pub use config::{Config, ConfigError};
pub use coordinator::{analyze, Coordinator};
pub use registry::{PackageSource, RegistryClient, RegistryKind, ScorecardSource};
pub use report::{Report, ScanMetadata};
pub use rules::{CancelToken, TopPackages};
pub use scanner::{FileRecord, FileScanner, Language};
pub use score::Summary;
