//! Registry clients for verifying package existence and metadata.
//!
//! One async client per ecosystem registry:
//! - npm (Node Package Manager)
//! - PyPI (Python Package Index)
//! - crates.io (Rust crates)
//! - Go module proxy
//!
//! Lookups are cached in memory for five minutes per (registry, name),
//! negative (404) results included. A 404 is a legitimate answer, never an
//! error; everything else propagates as [`RegistryError`] and is handled at
//! the rule-module boundary.

mod cache;
mod crates;
mod go;
mod npm;
mod pypi;
pub mod scorecard;

pub use cache::TtlCache;
pub use scorecard::{Scorecard, ScorecardCheck, ScorecardClient, ScorecardSource};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Per-request timeout for registry calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long lookup results stay cached.
const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Errors from registry lookups. A 404 is not an error.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

/// The ecosystem registry a package belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    Npm,
    #[serde(rename = "pypi")]
    PyPI,
    Crates,
    Go,
}

impl RegistryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryKind::Npm => "npm",
            RegistryKind::PyPI => "pypi",
            RegistryKind::Crates => "crates",
            RegistryKind::Go => "go",
        }
    }
}

impl std::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata returned by a registry for one package.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageInfo {
    pub name: String,
    pub latest_version: String,
    pub description: Option<String>,
    /// First-published timestamp; the present instant when the registry
    /// omits one.
    pub created_at: DateTime<Utc>,
    pub downloads: Option<u64>,
    pub maintainers: Vec<String>,
    /// Canonical source repository URL, normalized (no `git+` prefix, no
    /// `.git` suffix).
    pub repository: Option<String>,
}

impl PackageInfo {
    /// Package age in whole days relative to `now`.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days()
    }
}

/// Lookup seam for rule modules. The production implementation is
/// [`RegistryClient`]; tests substitute an in-memory fake.
pub trait PackageSource: Send + Sync {
    /// Returns false iff the registry answered 404 for this name. Any other
    /// failure propagates.
    fn exists(&self, registry: RegistryKind, name: &str) -> Result<bool, RegistryError>;

    /// Package metadata, or `None` for a 404.
    fn info(
        &self,
        registry: RegistryKind,
        name: &str,
    ) -> Result<Option<PackageInfo>, RegistryError>;
}

/// HTTP client over the four registries, with a shared TTL cache.
pub struct RegistryClient {
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    cache: TtlCache<Option<PackageInfo>>,
}

impl RegistryClient {
    pub fn new() -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("slopscan/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            http,
            runtime,
            cache: TtlCache::new(CACHE_TTL),
        })
    }

    fn cache_key(registry: RegistryKind, name: &str) -> String {
        format!("{}:{}", registry.as_str(), name)
    }

    /// Look up a package, consulting the cache first. `Ok(None)` means 404.
    fn lookup(
        &self,
        registry: RegistryKind,
        name: &str,
    ) -> Result<Option<PackageInfo>, RegistryError> {
        let key = Self::cache_key(registry, name);
        if let Some(cached) = self.cache.get(&key) {
            debug!(registry = registry.as_str(), name, "registry cache hit");
            return Ok(cached);
        }

        let result = self.runtime.block_on(async {
            match registry {
                RegistryKind::Npm => npm::fetch(&self.http, name, REQUEST_TIMEOUT).await,
                RegistryKind::PyPI => pypi::fetch(&self.http, name, REQUEST_TIMEOUT).await,
                RegistryKind::Crates => crates::fetch(&self.http, name, REQUEST_TIMEOUT).await,
                RegistryKind::Go => go::fetch(&self.http, name, REQUEST_TIMEOUT).await,
            }
        })?;

        self.cache.set(&key, result.clone());
        Ok(result)
    }
}

impl PackageSource for RegistryClient {
    fn exists(&self, registry: RegistryKind, name: &str) -> Result<bool, RegistryError> {
        Ok(self.lookup(registry, name)?.is_some())
    }

    fn info(
        &self,
        registry: RegistryKind,
        name: &str,
    ) -> Result<Option<PackageInfo>, RegistryError> {
        self.lookup(registry, name)
    }
}

/// Map an HTTP response to `Ok(Some(body))`, `Ok(None)` for 404, or an
/// error for anything else. Shared by the per-registry fetchers.
pub(crate) async fn read_json(
    response: reqwest::Response,
) -> Result<Option<serde_json::Value>, RegistryError> {
    match response.status().as_u16() {
        200 => {
            let value = response.json().await.map_err(RegistryError::Network)?;
            Ok(Some(value))
        }
        404 | 410 => Ok(None),
        status => Err(RegistryError::Unavailable(format!("HTTP {}", status))),
    }
}

/// Classify a transport error, distinguishing timeouts.
pub(crate) fn transport_error(e: reqwest::Error) -> RegistryError {
    if e.is_timeout() {
        RegistryError::Timeout
    } else {
        RegistryError::Network(e)
    }
}

/// Strip `git+` prefix and `.git` suffix from a repository URL.
pub(crate) fn normalize_repo_url(url: &str) -> String {
    let url = url.strip_prefix("git+").unwrap_or(url);
    let url = url.strip_suffix(".git").unwrap_or(url);
    url.to_string()
}
