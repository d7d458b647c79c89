//! Dependency manifest parsing.
//!
//! Turns a single manifest file into a flat list of declared dependencies.
//! Parsing is deliberately line-oriented and forgiving: a malformed manifest
//! yields an empty list and never aborts the pipeline.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::registry::RegistryKind;

/// The declaration section a dependency came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Production,
    Development,
    Peer,
    Optional,
}

/// A single declared package dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub version: Option<String>,
    pub kind: DependencyKind,
    pub registry: RegistryKind,
    /// Path of the manifest this came from, as cited in alerts.
    pub manifest_path: String,
}

lazy_static! {
    /// Name plus optional version constraint, shared by requirements.txt and
    /// pyproject.toml entries: `requests>=2.0`, `flask`.
    static ref PYTHON_REQUIREMENT: Regex =
        Regex::new(r"^([A-Za-z0-9._\-]+)([><=!]+(.+))?").unwrap();
    /// `key = "value"` lines in Cargo.toml outside table headers.
    static ref CARGO_KV: Regex =
        Regex::new(r#"^\s*([A-Za-z0-9_\-]+)\s*=\s*"([^"]*)"\s*$"#).unwrap();
}

/// Parse a manifest file into dependencies, dispatching on its basename
/// (case-insensitive). Unrecognized basenames and unreadable files yield an
/// empty list.
pub fn parse_manifest(path: &Path) -> Vec<Dependency> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    parse_manifest_str(path, &content)
}

/// Parse manifest content already in memory.
pub fn parse_manifest_str(path: &Path, content: &str) -> Vec<Dependency> {
    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let manifest_path = path.to_string_lossy().to_string();

    match basename.as_str() {
        "package.json" => parse_package_json(content, &manifest_path),
        "requirements.txt" => parse_requirements_txt(content, &manifest_path),
        "pyproject.toml" => parse_pyproject_toml(content, &manifest_path),
        "cargo.toml" => parse_cargo_toml(content, &manifest_path),
        "go.mod" => parse_go_mod(content, &manifest_path),
        _ => Vec::new(),
    }
}

fn parse_package_json(content: &str, manifest_path: &str) -> Vec<Dependency> {
    let value: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let sections = [
        ("dependencies", DependencyKind::Production),
        ("devDependencies", DependencyKind::Development),
        ("peerDependencies", DependencyKind::Peer),
        ("optionalDependencies", DependencyKind::Optional),
    ];

    let mut deps = Vec::new();
    for (section, kind) in sections {
        let Some(map) = value.get(section).and_then(|v| v.as_object()) else {
            continue;
        };
        for (name, version) in map {
            deps.push(Dependency {
                name: name.clone(),
                version: version.as_str().map(|s| s.to_string()),
                kind,
                registry: RegistryKind::Npm,
                manifest_path: manifest_path.to_string(),
            });
        }
    }
    deps
}

fn parse_requirements_txt(content: &str, manifest_path: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(dep) = parse_python_requirement(line, manifest_path) {
            deps.push(dep);
        }
    }
    deps
}

fn parse_python_requirement(entry: &str, manifest_path: &str) -> Option<Dependency> {
    let caps = PYTHON_REQUIREMENT.captures(entry)?;
    let name = caps.get(1)?.as_str().to_string();
    let version = caps.get(3).map(|m| m.as_str().trim().to_string());
    Some(Dependency {
        name,
        version,
        kind: DependencyKind::Production,
        registry: RegistryKind::PyPI,
        manifest_path: manifest_path.to_string(),
    })
}

/// Scan for a `dependencies = [ ... ]` list and split it on commas. No full
/// TOML parse; the bracketed list may span lines.
fn parse_pyproject_toml(content: &str, manifest_path: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    let mut in_list = false;
    let mut buffer = String::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if !in_list {
            if let Some(rest) = trimmed
                .strip_prefix("dependencies")
                .map(|r| r.trim_start())
                .and_then(|r| r.strip_prefix('='))
            {
                let rest = rest.trim_start();
                if let Some(open) = rest.strip_prefix('[') {
                    if let Some(end) = open.find(']') {
                        buffer.push_str(&open[..end]);
                    } else {
                        buffer.push_str(open);
                        in_list = true;
                        continue;
                    }
                }
            }
        } else if let Some(end) = trimmed.find(']') {
            buffer.push_str(&trimmed[..end]);
            in_list = false;
        } else {
            buffer.push_str(trimmed);
            buffer.push(',');
        }
    }

    for entry in buffer.split(',') {
        let entry = entry.trim().trim_matches(|c| c == '"' || c == '\'');
        if entry.is_empty() {
            continue;
        }
        if let Some(dep) = parse_python_requirement(entry, manifest_path) {
            deps.push(dep);
        }
    }
    deps
}

/// Line-oriented Cargo.toml scan: `name = "version"` pairs outside `[...]`
/// header lines. The `[package]` name/version keys match this shape too;
/// registry lookups for them are harmless and cheap.
fn parse_cargo_toml(content: &str, manifest_path: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            continue;
        }
        if let Some(caps) = CARGO_KV.captures(trimmed) {
            deps.push(Dependency {
                name: caps[1].to_string(),
                version: Some(caps[2].to_string()),
                kind: DependencyKind::Production,
                registry: RegistryKind::Crates,
                manifest_path: manifest_path.to_string(),
            });
        }
    }
    deps
}

/// go.mod directive keywords; lines led by one are structural, not
/// dependency entries.
const GO_MOD_KEYWORDS: &[&str] = &[
    "module",
    "go",
    "toolchain",
    "require",
    "replace",
    "exclude",
    "retract",
];

fn parse_go_mod(content: &str, manifest_path: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    for line in content.lines() {
        let line = line.split("//").next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut tokens: Vec<&str> = line.split_whitespace().collect();
        // `require name version` on one line: strip the directive keyword,
        // keeping block bodies (`name version` inside `require ( ... )`).
        if tokens.first() == Some(&"require") && tokens.len() >= 3 {
            tokens.remove(0);
        }
        if tokens.len() < 2 {
            continue;
        }
        let name = tokens[0];
        if GO_MOD_KEYWORDS.contains(&name) || name == "(" || name == ")" {
            continue;
        }

        deps.push(Dependency {
            name: name.to_string(),
            version: Some(tokens[1].to_string()),
            kind: DependencyKind::Production,
            registry: RegistryKind::Go,
            manifest_path: manifest_path.to_string(),
        });
    }
    deps
}
