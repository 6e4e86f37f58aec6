use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::dump::DEFAULT_INDENT;
use crate::store::{BranchProgress, StorePolicy};

const CONFIG_FILE_NAME: &str = "rollup.toml";

#[derive(Debug, Default, Deserialize)]
pub struct RollupConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub dump: DumpConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub protect_root: bool,
    #[serde(default)]
    pub branch_progress: BranchProgress,
    #[serde(default)]
    pub clamp_progress: bool,
}

impl PolicyConfig {
    pub fn store_policy(&self) -> StorePolicy {
        StorePolicy {
            protect_root: self.protect_root,
            branch_progress: self.branch_progress,
            clamp_progress: self.clamp_progress,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DumpConfig {
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
        }
    }
}

fn default_indent() -> usize {
    DEFAULT_INDENT
}

pub fn load() -> Result<RollupConfig> {
    let current_dir = std::env::current_dir()?;
    load_from(&current_dir)
}

pub fn load_from(start_dir: &Path) -> Result<RollupConfig> {
    let Some(path) = find_config_path(start_dir) else {
        return Ok(RollupConfig::default());
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}

fn find_config_path(start_dir: &Path) -> Option<PathBuf> {
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}
