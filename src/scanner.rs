//! File discovery and classification.
//!
//! Walks a root directory, applies include/exclude globs plus a built-in
//! ignore set, and classifies each surviving file by language and kind.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::ScanningConfig;

/// Directories no scan should ever descend into.
const BUILTIN_IGNORES: &[&str] = &[
    "**/node_modules/**",
    "**/.git/**",
    "**/.venv/**",
    "**/dist/**",
    "**/build/**",
    "**/.next/**",
    "**/.nuxt/**",
    "**/.output/**",
    "**/target/**",
    "**/vendor/**",
];

/// Extensions considered source code.
const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "py", "rs", "go", "java", "kt", "cs", "cpp", "c", "h",
    "php", "rb", "swift", "scala", "vue", "svelte",
];

/// Dependency manifest basenames, compared case-insensitively.
const MANIFEST_BASENAMES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "cargo.toml",
    "go.mod",
];

/// Language tag assigned during classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Typescript,
    Python,
    Rust,
    Go,
    Vue,
    Svelte,
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Vue => "vue",
            Language::Svelte => "svelte",
            Language::Unknown => "unknown",
        }
    }

    /// Classify by file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "js" | "jsx" | "mjs" | "cjs" => Language::Javascript,
            "ts" | "tsx" | "mts" | "cts" => Language::Typescript,
            "py" => Language::Python,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "vue" => Language::Vue,
            "svelte" => Language::Svelte,
            _ => Language::Unknown,
        }
    }

    /// Manifest basenames map to their ecosystem language so the
    /// hallucination module can route them by registry.
    fn from_manifest_basename(basename: &str) -> Option<Self> {
        match basename {
            "package.json" => Some(Language::Javascript),
            "requirements.txt" | "pyproject.toml" => Some(Language::Python),
            "cargo.toml" => Some(Language::Rust),
            "go.mod" => Some(Language::Go),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One discovered file. Immutable once created.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute path.
    pub path: PathBuf,
    /// Path relative to the scan root, used in alerts and glob matching.
    pub relative: String,
    pub language: Language,
    pub size: u64,
    pub is_source: bool,
    pub is_manifest: bool,
}

impl FileRecord {
    fn classify(path: &Path, root: &Path, size: u64) -> Self {
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let is_manifest = MANIFEST_BASENAMES.contains(&basename.as_str());
        let language = Language::from_manifest_basename(&basename)
            .unwrap_or_else(|| Language::from_extension(&ext));
        let is_source = SOURCE_EXTENSIONS.contains(&ext.as_str());

        let relative = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        Self {
            path: path.to_path_buf(),
            relative,
            language,
            size,
            is_source,
            is_manifest,
        }
    }
}

/// Walks a root directory and produces the file list for a run.
pub struct FileScanner {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    max_file_size: u64,
    follow_symlinks: bool,
}

impl FileScanner {
    /// Build a scanner from validated configuration. Glob compilation only
    /// fails on patterns `Config::validate` would already have rejected.
    pub fn new<P: AsRef<Path>>(root: P, config: &ScanningConfig) -> anyhow::Result<Self> {
        let include = build_glob_set(&config.include)?;

        let mut exclude_patterns: Vec<String> = config.exclude.clone();
        exclude_patterns.extend(BUILTIN_IGNORES.iter().map(|s| s.to_string()));
        let exclude = build_glob_set(&exclude_patterns)?;

        let root = root.as_ref();
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

        Ok(Self {
            root,
            include,
            exclude,
            max_file_size: config.max_file_size,
            follow_symlinks: config.follow_symlinks,
        })
    }

    /// Produce the deduplicated, classified file list.
    ///
    /// Files that cannot be stat'd are skipped with a warning; they never
    /// abort the walk.
    pub fn scan(&self) -> Vec<FileRecord> {
        let mut records = Vec::new();
        let mut seen = std::collections::HashSet::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = match path.strip_prefix(&self.root) {
                Ok(r) => r,
                Err(_) => continue,
            };

            if !self.include.is_match(relative) || self.exclude.is_match(relative) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!("cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };

            if metadata.len() > self.max_file_size {
                continue;
            }

            if !seen.insert(path.to_path_buf()) {
                continue;
            }

            records.push(FileRecord::classify(path, &self.root, metadata.len()));
        }

        records
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn build_glob_set(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
