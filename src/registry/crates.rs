//! crates.io registry client.
//!
//! GET https://crates.io/api/v1/crates/{crate}; 404 means the crate does not
//! exist.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::{read_json, transport_error, PackageInfo, RegistryError};

/// Fetch crates.io metadata for a crate. `None` means 404.
pub async fn fetch(
    client: &Client,
    crate_name: &str,
    timeout: Duration,
) -> Result<Option<PackageInfo>, RegistryError> {
    let url = format!("https://crates.io/api/v1/crates/{}", crate_name);

    let response = client
        .get(&url)
        .timeout(timeout)
        .send()
        .await
        .map_err(transport_error)?;

    let Some(body) = read_json(response).await? else {
        return Ok(None);
    };

    Ok(Some(parse_info(crate_name, &body)))
}

fn parse_info(crate_name: &str, body: &Value) -> PackageInfo {
    let krate = body.get("crate").cloned().unwrap_or(Value::Null);

    let latest_version = krate
        .get("newest_version")
        .or_else(|| krate.get("max_version"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    PackageInfo {
        name: crate_name.to_string(),
        latest_version,
        description: krate
            .get("description")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        created_at: krate
            .get("created_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now),
        downloads: krate.get("downloads").and_then(|v| v.as_u64()),
        maintainers: Vec::new(),
        repository: krate
            .get("repository")
            .and_then(|v| v.as_str())
            .map(super::normalize_repo_url),
    }
}
