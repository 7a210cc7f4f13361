//! Project configuration.
//!
//! `storypaths.json` sits at the project root and is optional; every field has
//! a default, and command-line flags override what the file says.
use crate::cache::DEFAULT_CACHE_REL;
use crate::enumerate::DEFAULT_MAX_REVISITS;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for `storypaths.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Config file looked up in the project root when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "storypaths.json";
/// Path count above which a run warns about path explosion.
pub const DEFAULT_EXPLOSION_THRESHOLD: usize = 10_000;

/// Where committed revisions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySource {
    Git,
    /// Never consult history; every path is categorized as new.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default = "default_max_revisits")]
    pub max_revisits: usize,
    #[serde(default = "default_explosion_threshold")]
    pub explosion_threshold: usize,
    /// Cache file, relative to the project root unless absolute.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    #[serde(default = "default_history")]
    pub history: HistorySource,
}

fn default_schema_version() -> u32 {
    CONFIG_SCHEMA_VERSION
}

fn default_max_revisits() -> usize {
    DEFAULT_MAX_REVISITS
}

fn default_explosion_threshold() -> usize {
    DEFAULT_EXPLOSION_THRESHOLD
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_REL)
}

fn default_history() -> HistorySource {
    HistorySource::Git
}

impl Default for ProjectConfig {
    fn default() -> Self {
        default_config()
    }
}

/// Config used when the project has no `storypaths.json`.
pub fn default_config() -> ProjectConfig {
    ProjectConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        max_revisits: DEFAULT_MAX_REVISITS,
        explosion_threshold: DEFAULT_EXPLOSION_THRESHOLD,
        cache_path: default_cache_path(),
        history: HistorySource::Git,
    }
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<ProjectConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ProjectConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// Resolve the config for a project: an explicit path must exist, the
/// default file is optional.
pub fn resolve_config(project_root: &Path, explicit: Option<&Path>) -> Result<ProjectConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let path = project_root.join(CONFIG_FILE_NAME);
    if path.is_file() {
        tracing::debug!(config = %path.display(), "using project config");
        return load_config(&path);
    }
    Ok(default_config())
}

pub fn validate_config(config: &ProjectConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.max_revisits == 0 {
        return Err(anyhow!("max_revisits must be at least 1"));
    }
    if config.explosion_threshold == 0 {
        return Err(anyhow!("explosion_threshold must be at least 1"));
    }
    if config.cache_path.as_os_str().is_empty() {
        return Err(anyhow!("cache_path must be non-empty"));
    }
    Ok(())
}

impl ProjectConfig {
    /// Cache path resolved against the project root.
    pub fn cache_path_in(&self, project_root: &Path) -> PathBuf {
        if self.cache_path.is_absolute() {
            self.cache_path.clone()
        } else {
            project_root.join(&self.cache_path)
        }
    }
}
