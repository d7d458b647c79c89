//! The top-package reference list and the edit-distance used against it.
//!
//! A process-wide constant enumeration of popular package names across
//! npm/pypi/crates/go, compared against declared dependencies to catch
//! typosquats. It may be swapped wholesale (tests, out-of-band refresh) but
//! is never mutated during a run.

/// Popular package names across the four ecosystems. Order is roughly by
/// download rank so truncation keeps the most-squatted names.
const BUILTIN_TOP_PACKAGES: &[&str] = &[
    // npm
    "react",
    "react-dom",
    "lodash",
    "express",
    "axios",
    "next",
    "vue",
    "typescript",
    "webpack",
    "vite",
    "eslint",
    "prettier",
    "jest",
    "vitest",
    "chalk",
    "commander",
    "dotenv",
    "uuid",
    "zod",
    "moment",
    "dayjs",
    "rxjs",
    "redux",
    "tailwindcss",
    "svelte",
    "prisma",
    "mongoose",
    "socket.io",
    "graphql",
    "jsonwebtoken",
    "bcrypt",
    "cors",
    "body-parser",
    "nodemon",
    "ts-node",
    "esbuild",
    "rollup",
    "babel",
    "postcss",
    "sass",
    "styled-components",
    "framer-motion",
    "date-fns",
    "classnames",
    "nanoid",
    "minimist",
    "glob",
    "rimraf",
    "fs-extra",
    "inquirer",
    // pypi
    "requests",
    "numpy",
    "pandas",
    "flask",
    "django",
    "fastapi",
    "pydantic",
    "pytest",
    "boto3",
    "urllib3",
    "setuptools",
    "pillow",
    "scipy",
    "matplotlib",
    "sqlalchemy",
    "celery",
    "click",
    "httpx",
    "aiohttp",
    "uvicorn",
    "gunicorn",
    "jinja2",
    "cryptography",
    "pyyaml",
    "redis",
    "openai",
    "anthropic",
    "langchain",
    "scikit-learn",
    "tensorflow",
    "torch",
    "transformers",
    "beautifulsoup4",
    "lxml",
    "psycopg2",
    "pymongo",
    "alembic",
    "black",
    "mypy",
    "ruff",
    // crates
    "serde",
    "tokio",
    "anyhow",
    "thiserror",
    "clap",
    "regex",
    "rand",
    "log",
    "tracing",
    "reqwest",
    "hyper",
    "axum",
    "actix-web",
    "futures",
    "rayon",
    "chrono",
    "itertools",
    "lazy_static",
    "once_cell",
    "bytes",
    "uuid",
    "base64",
    "sha2",
    "rustls",
    "walkdir",
    // go modules
    "github.com/gin-gonic/gin",
    "github.com/stretchr/testify",
    "github.com/spf13/cobra",
    "github.com/spf13/viper",
    "github.com/gorilla/mux",
    "github.com/sirupsen/logrus",
    "github.com/pkg/errors",
    "github.com/go-chi/chi",
    "github.com/joho/godotenv",
    "github.com/golang-jwt/jwt",
    "google.golang.org/grpc",
    "golang.org/x/sync",
    "golang.org/x/crypto",
    "gorm.io/gorm",
    "go.uber.org/zap",
];

/// The typosquat reference set for a run.
pub struct TopPackages {
    names: Vec<String>,
}

impl TopPackages {
    /// The built-in list, truncated to the configured count.
    pub fn builtin(count: usize) -> Self {
        Self {
            names: BUILTIN_TOP_PACKAGES
                .iter()
                .take(count)
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replace the list wholesale (tests, out-of-band refresh).
    pub fn custom(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// The top-package name at exactly `distance` edits from `name`, if any.
    /// Distance 0 (the name itself) never matches.
    pub fn near_match(&self, name: &str, distance: usize) -> Option<&str> {
        self.names
            .iter()
            .find(|candidate| {
                candidate.as_str() != name && levenshtein(name, candidate) == distance
            })
            .map(|s| s.as_str())
    }
}

/// Classic two-row Levenshtein distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("react", "react"), 0);
        assert_eq!(levenshtein("react", "reacts"), 1);
        assert_eq!(levenshtein("lodash", "lodsah"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn test_near_match() {
        let list = TopPackages::custom(vec!["react".to_string(), "lodash".to_string()]);
        assert_eq!(list.near_match("reacts", 1), Some("react"));
        assert_eq!(list.near_match("reacts", 2), None);
        // The name itself never matches at distance 0.
        assert_eq!(list.near_match("react", 1), None);
    }

    #[test]
    fn test_builtin_truncation() {
        let list = TopPackages::builtin(10);
        assert_eq!(list.names().len(), 10);
        assert!(list.contains("react"));

        let full = TopPackages::builtin(usize::MAX);
        assert!(full.contains("github.com/spf13/cobra"));
    }
}
