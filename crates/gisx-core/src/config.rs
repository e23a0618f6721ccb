//! Fetch configuration.
//!
//! A [`FetchConfig`] value is threaded through classifier and fetcher
//! construction; there is no process-global state. Values can be loaded
//! from an optional `gisx.toml` and overridden by the caller.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// URL of the official addon repository.
pub const OFFICIAL_REPO_URL: &str = "https://github.com/gisx/gisx-addons";

/// User agent sent with all HTTP requests.
///
/// Some hosting services reject the default library agent.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Major version of the running system, used for version-branch lookup.
pub const DEFAULT_MAJOR_VERSION: u32 = 2;

/// Configuration threaded through classifier and fetcher construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// URL of the official addon repository
    pub official_repo: String,
    /// Major version of the running system
    pub major_version: u32,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// Override for the working directory location
    pub workdir: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            official_repo: OFFICIAL_REPO_URL.to_string(),
            major_version: DEFAULT_MAJOR_VERSION,
            user_agent: USER_AGENT.to_string(),
            workdir: None,
        }
    }
}

impl FetchConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load `gisx.toml` from the given directory if present, defaults otherwise.
    pub fn load_or_default(dir: &Path) -> anyhow::Result<Self> {
        let path = dir.join("gisx.toml");
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Set the official repository URL.
    pub fn with_official_repo(mut self, url: impl Into<String>) -> Self {
        self.official_repo = url.into();
        self
    }

    /// Set the working directory override.
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_official_repo() {
        let config = FetchConfig::default();
        assert_eq!(config.official_repo, OFFICIAL_REPO_URL);
        assert!(config.workdir.is_none());
    }

    #[test]
    fn load_parses_partial_toml() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("gisx.toml");
        std::fs::write(&path, "major_version = 3\n").expect("Should write config");

        let config = FetchConfig::load(&path).expect("Should parse config");
        assert_eq!(config.major_version, 3);
        assert_eq!(config.official_repo, OFFICIAL_REPO_URL);
    }

    #[test]
    fn load_or_default_without_file() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let config = FetchConfig::load_or_default(temp.path()).expect("Should fall back");
        assert_eq!(config.user_agent, USER_AGENT);
    }
}
