//! PyPI registry client.
//!
//! GET https://pypi.org/pypi/{package}/json; 404 means the package does not
//! exist. Names are normalized per PEP 503 before the request.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::{read_json, transport_error, PackageInfo, RegistryError};

/// project_urls keys tried in order for the source repository.
const REPO_URL_KEYS: &[&str] = &["Source", "Repository", "GitHub", "Source Code"];

/// Fetch PyPI metadata for a package. `None` means 404.
pub async fn fetch(
    client: &Client,
    package: &str,
    timeout: Duration,
) -> Result<Option<PackageInfo>, RegistryError> {
    let normalized = normalize_package_name(package);
    let url = format!("https://pypi.org/pypi/{}/json", normalized);

    let response = client
        .get(&url)
        .timeout(timeout)
        .send()
        .await
        .map_err(transport_error)?;

    let Some(body) = read_json(response).await? else {
        return Ok(None);
    };

    Ok(Some(parse_info(package, &body)))
}

fn parse_info(package: &str, body: &Value) -> PackageInfo {
    let info = body.get("info").cloned().unwrap_or(Value::Null);

    let latest_version = info
        .get("version")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let description = info
        .get("summary")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let maintainers: Vec<String> = ["maintainer", "author"]
        .iter()
        .filter_map(|key| info.get(*key).and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();

    PackageInfo {
        name: package.to_string(),
        latest_version,
        description,
        created_at: earliest_upload(body).unwrap_or_else(Utc::now),
        downloads: None,
        maintainers,
        repository: extract_repository(&info),
    }
}

/// First-published timestamp: the earliest upload time across all releases.
fn earliest_upload(body: &Value) -> Option<DateTime<Utc>> {
    let releases = body.get("releases")?.as_object()?;
    releases
        .values()
        .filter_map(|files| files.as_array())
        .flatten()
        .filter_map(|f| f.get("upload_time_iso_8601").and_then(|t| t.as_str()))
        .filter_map(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .min()
}

/// Try project_urls keys in order; fall back to home_page only when it
/// points at a known forge.
fn extract_repository(info: &Value) -> Option<String> {
    if let Some(urls) = info.get("project_urls").and_then(|v| v.as_object()) {
        for key in REPO_URL_KEYS {
            if let Some(url) = urls.get(*key).and_then(|v| v.as_str()) {
                if !url.is_empty() {
                    return Some(url.to_string());
                }
            }
        }
    }

    let home = info.get("home_page").and_then(|v| v.as_str())?;
    if home.contains("github.com") || home.contains("gitlab.com") {
        Some(home.to_string())
    } else {
        None
    }
}

/// Normalize a Python package name per PEP 503: lowercase, runs of `-_.`
/// collapse to a single `-`.
fn normalize_package_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_separator = false;

    for c in name.chars() {
        match c {
            '-' | '_' | '.' => {
                if !prev_separator {
                    result.push('-');
                    prev_separator = true;
                }
            }
            c => {
                result.push(c.to_ascii_lowercase());
                prev_separator = false;
            }
        }
    }

    result
}
