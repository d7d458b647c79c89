//! npm registry client.
//!
//! GET https://registry.npmjs.org/{package}; 404 means the package does not
//! exist. Handles scoped packages like @org/package.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::{normalize_repo_url, read_json, transport_error, PackageInfo, RegistryError};

/// Fetch npm metadata for a package. `None` means 404.
pub async fn fetch(
    client: &Client,
    package: &str,
    timeout: Duration,
) -> Result<Option<PackageInfo>, RegistryError> {
    let encoded = encode_package_name(package);
    let url = format!("https://registry.npmjs.org/{}", encoded);

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

/// Map the npm document to [`PackageInfo`], tolerating absent or oddly
/// shaped fields.
fn parse_info(package: &str, body: &Value) -> PackageInfo {
    let latest_version = body
        .pointer("/dist-tags/latest")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let description = body
        .get("description")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let created_at = body
        .pointer("/time/created")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let maintainers = body
        .get("maintainers")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    PackageInfo {
        name: package.to_string(),
        latest_version,
        description,
        created_at,
        downloads: None,
        maintainers,
        repository: extract_repository(body),
    }
}

/// The `repository` field may be a plain string or an object with a `url`
/// key; both carry `git+`/`.git` noise.
fn extract_repository(body: &Value) -> Option<String> {
    let raw = match body.get("repository") {
        Some(Value::String(s)) => s.as_str(),
        Some(Value::Object(map)) => map.get("url")?.as_str()?,
        _ => return None,
    };
    Some(normalize_repo_url(raw))
}

/// URL encode a package name for the npm registry. Scoped packages need @
/// and / encoded.
fn encode_package_name(name: &str) -> String {
    if name.starts_with('@') {
        name.replace('@', "%40").replace('/', "%2f")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_regular_package() {
        assert_eq!(encode_package_name("lodash"), "lodash");
        assert_eq!(encode_package_name("express"), "express");
    }

    #[test]
    fn test_encode_scoped_package() {
        assert_eq!(encode_package_name("@types/node"), "%40types%2fnode");
        assert_eq!(encode_package_name("@babel/core"), "%40babel%2fcore");
    }

    #[test]
    fn test_parse_full_document() {
        let body = json!({
            "dist-tags": {"latest": "18.3.1"},
            "description": "React is a JavaScript library",
            "time": {"created": "2011-10-26T17:46:21.942Z"},
            "maintainers": [{"name": "fb", "email": "x@example.com"}],
            "repository": {"type": "git", "url": "git+https://github.com/facebook/react.git"}
        });
        let info = parse_info("react", &body);
        assert_eq!(info.latest_version, "18.3.1");
        assert_eq!(info.maintainers, vec!["fb".to_string()]);
        assert_eq!(
            info.repository.as_deref(),
            Some("https://github.com/facebook/react")
        );
        assert_eq!(info.created_at.format("%Y").to_string(), "2011");
    }

    #[test]
    fn test_parse_repository_as_string() {
        let body = json!({"repository": "https://github.com/org/repo.git"});
        assert_eq!(
            extract_repository(&body).as_deref(),
            Some("https://github.com/org/repo")
        );
    }

    #[test]
    fn test_parse_degrades_on_missing_fields() {
        let info = parse_info("bare", &json!({}));
        assert_eq!(info.latest_version, "");
        assert!(info.description.is_none());
        assert!(info.repository.is_none());
        assert!(info.maintainers.is_empty());
    }
}
