//! Depot configuration (`depot.toml`).
//!
//! Built once at startup and shared by reference; nothing in the crate reads
//! ambient globals for the storage layout.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default number of commits pulled from the VCS log on revert.
pub const DEFAULT_LOG_DEPTH: usize = 100;

/// Top-level depot configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepotConfig {
    /// Where working trees and metadata records live.
    pub storage: StorageConfig,

    /// History reconciliation settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Identity recorded on every commit.
    #[serde(default)]
    pub author: AuthorConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Base directory; working trees live at `<base>/<owner>/<name>`.
    pub base: PathBuf,
    /// Directory holding the repository records (the metadata index).
    pub metadata: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    #[serde(default = "default_log_depth")]
    pub log_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            log_depth: default_log_depth(),
        }
    }
}

fn default_log_depth() -> usize {
    DEFAULT_LOG_DEPTH
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorConfig {
    #[serde(default = "default_author_name")]
    pub name: String,
    #[serde(default = "default_author_email")]
    pub email: String,
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            name: default_author_name(),
            email: default_author_email(),
        }
    }
}

fn default_author_name() -> String {
    "depot".to_owned()
}

fn default_author_email() -> String {
    "depot@localhost".to_owned()
}

impl DepotConfig {
    /// Default layout under a single directory: `<root>/repos` for working
    /// trees and `<root>/metadata` for records.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();

        Self {
            storage: StorageConfig {
                base: root.join("repos"),
                metadata: root.join("metadata"),
            },
            history: HistoryConfig::default(),
            author: AuthorConfig::default(),
        }
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: DepotConfig = toml::from_str(content)?;

        if config.history.log_depth == 0 {
            anyhow::bail!("history.log_depth must be at least 1");
        }

        Ok(config)
    }
}
