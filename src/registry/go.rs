//! Go module proxy registry client.
//!
//! GET https://proxy.golang.org/{module}/@v/list returns a newline-separated
//! version list for known modules, 404 for unknown ones. The proxy carries
//! no description/maintainer metadata; the info record is filled from the
//! version list and the module path itself.

use chrono::Utc;
use reqwest::Client;
use std::time::Duration;

use super::{transport_error, PackageInfo, RegistryError};

/// Fetch Go module metadata. `None` means 404.
pub async fn fetch(
    client: &Client,
    module: &str,
    timeout: Duration,
) -> Result<Option<PackageInfo>, RegistryError> {
    let encoded = encode_module_path(module);
    let url = format!("https://proxy.golang.org/{}/@v/list", encoded);

    let response = client
        .get(&url)
        .timeout(timeout)
        .send()
        .await
        .map_err(transport_error)?;

    let body = match response.status().as_u16() {
        200 => response.text().await.map_err(RegistryError::Network)?,
        404 | 410 => return Ok(None),
        status => return Err(RegistryError::Unavailable(format!("HTTP {}", status))),
    };

    let latest_version = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .max()
        .unwrap_or("")
        .to_string();

    Ok(Some(PackageInfo {
        name: module.to_string(),
        latest_version,
        description: None,
        // The list endpoint carries no timestamps.
        created_at: Utc::now(),
        downloads: None,
        maintainers: Vec::new(),
        repository: repository_from_module_path(module),
    }))
}

/// Modules hosted on a known forge are their own repository URL.
fn repository_from_module_path(module: &str) -> Option<String> {
    let mut parts = module.split('/');
    let host = parts.next()?;
    if host != "github.com" && host != "gitlab.com" {
        return None;
    }
    let org = parts.next()?;
    let repo = parts.next()?;
    Some(format!("https://{}/{}/{}", host, org, repo))
}

/// Encode a Go module path for the proxy: uppercase letters become
/// !lowercase (e.g. GitHub -> !github).
fn encode_module_path(path: &str) -> String {
    let mut result = String::with_capacity(path.len() * 2);

    for c in path.chars() {
        if c.is_ascii_uppercase() {
            result.push('!');
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_module_path() {
        assert_eq!(
            encode_module_path("github.com/user/repo"),
            "github.com/user/repo"
        );
        assert_eq!(
            encode_module_path("github.com/BurntSushi/toml"),
            "github.com/!burnt!sushi/toml"
        );
    }

    #[test]
    fn test_repository_from_module_path() {
        assert_eq!(
            repository_from_module_path("github.com/spf13/cobra").as_deref(),
            Some("https://github.com/spf13/cobra")
        );
        assert_eq!(
            repository_from_module_path("gitlab.com/org/proj/v2").as_deref(),
            Some("https://gitlab.com/org/proj")
        );
        assert_eq!(repository_from_module_path("golang.org/x/sync"), None);
        assert_eq!(repository_from_module_path("github.com"), None);
    }
}
