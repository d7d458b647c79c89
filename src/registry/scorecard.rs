//! OpenSSF Scorecard client.
//!
//! GET https://api.securityscorecards.dev/projects/{host}/{org}/{repo}
//! Only github.com and gitlab.com repositories are supported; every other
//! host yields nothing. Results (404s included) are cached for an hour per
//! normalized repository key.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{cache::TtlCache, transport_error, RegistryError};

/// Per-request timeout for scorecard calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How long scorecard results stay cached.
const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// One scorecard check detail.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorecardCheck {
    pub name: String,
    /// -1 when the check could not run.
    pub score: f64,
    pub reason: Option<String>,
}

/// A repository's security scorecard.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    /// Aggregate score in [0, 10].
    pub score: f64,
    pub checks: Vec<ScorecardCheck>,
    pub as_of: DateTime<Utc>,
}

/// Lookup seam for the security module; tests substitute an in-memory fake.
pub trait ScorecardSource: Send + Sync {
    /// Fetch the scorecard for a repository URL, or `None` when the host is
    /// unsupported or the project is unknown to the scorecard service.
    fn fetch(&self, repo_url: &str) -> Result<Option<Scorecard>, RegistryError>;
}

/// HTTP client for the scorecard API.
pub struct ScorecardClient {
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    cache: TtlCache<Option<Scorecard>>,
}

impl ScorecardClient {
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

    async fn fetch_remote(&self, key: &str) -> Result<Option<Scorecard>, RegistryError> {
        let url = format!("https://api.securityscorecards.dev/projects/{}", key);

        let response = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;

        let Some(body) = super::read_json(response).await? else {
            return Ok(None);
        };

        Ok(Some(parse_scorecard(&body)))
    }
}

impl ScorecardSource for ScorecardClient {
    fn fetch(&self, repo_url: &str) -> Result<Option<Scorecard>, RegistryError> {
        let Some(key) = normalize_repo_key(repo_url) else {
            return Ok(None);
        };

        if let Some(cached) = self.cache.get(&key) {
            debug!(key = key.as_str(), "scorecard cache hit");
            return Ok(cached);
        }

        let result = self.runtime.block_on(self.fetch_remote(&key))?;
        self.cache.set(&key, result.clone());
        Ok(result)
    }
}

/// Reduce a repository URL to `host/org/repo`, or `None` for unsupported
/// hosts and malformed URLs.
pub fn normalize_repo_key(repo_url: &str) -> Option<String> {
    let rest = repo_url
        .trim()
        .strip_prefix("https://")
        .or_else(|| repo_url.trim().strip_prefix("http://"))
        .unwrap_or(repo_url.trim());
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    let mut parts = rest.split('/').filter(|p| !p.is_empty());
    let host = parts.next()?;
    if host != "github.com" && host != "gitlab.com" {
        return None;
    }
    let org = parts.next()?;
    let repo = parts.next()?.trim_end_matches(".git");
    if org.is_empty() || repo.is_empty() {
        return None;
    }

    Some(format!("{}/{}/{}", host, org, repo))
}

fn parse_scorecard(body: &Value) -> Scorecard {
    let score = body.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0);

    let as_of = body
        .get("date")
        .and_then(|v| v.as_str())
        .and_then(parse_scorecard_date)
        .unwrap_or_else(Utc::now);

    let checks = body
        .get("checks")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .map(|c| ScorecardCheck {
                    name: c
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string(),
                    score: c.get("score").and_then(|v| v.as_f64()).unwrap_or(-1.0),
                    reason: c
                        .get("reason")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string()),
                })
                .collect()
        })
        .unwrap_or_default();

    Scorecard {
        score,
        checks,
        as_of,
    }
}

/// The API reports dates both as RFC 3339 and as bare `YYYY-MM-DD`.
fn parse_scorecard_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_repo_key() {
        assert_eq!(
            normalize_repo_key("https://github.com/org/repo").as_deref(),
            Some("github.com/org/repo")
        );
        assert_eq!(
            normalize_repo_key("https://gitlab.com/org/repo.git").as_deref(),
            Some("gitlab.com/org/repo")
        );
        assert_eq!(
            normalize_repo_key("https://github.com/org/repo/tree/main").as_deref(),
            Some("github.com/org/repo")
        );
        assert_eq!(normalize_repo_key("https://bitbucket.org/org/repo"), None);
        assert_eq!(normalize_repo_key("https://github.com/org"), None);
    }

    #[test]
    fn test_parse_scorecard() {
        let body = json!({
            "score": 6.7,
            "date": "2024-05-01",
            "checks": [
                {"name": "Maintained", "score": 10, "reason": "30 commits"},
                {"name": "Fuzzing", "score": -1}
            ]
        });
        let card = parse_scorecard(&body);
        assert!((card.score - 6.7).abs() < f64::EPSILON);
        assert_eq!(card.checks.len(), 2);
        assert_eq!(card.checks[0].name, "Maintained");
        assert_eq!(card.checks[1].score, -1.0);
        assert_eq!(card.as_of.format("%Y-%m-%d").to_string(), "2024-05-01");
    }

    #[test]
    fn test_parse_degrades_on_empty_body() {
        let card = parse_scorecard(&json!({}));
        assert_eq!(card.score, 0.0);
        assert!(card.checks.is_empty());
    }
}
