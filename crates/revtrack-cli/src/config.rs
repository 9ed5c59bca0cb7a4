use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use revtrack_tree::TreeConfig;
use revtrack_upstream::UpstreamConfig;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "revtrack.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RevtrackConfig {
    pub(crate) upstream: UpstreamConfig,
    pub(crate) tree: TreeConfig,
}

impl RevtrackConfig {
    pub(crate) fn load(repo_root: &Path) -> Result<Self> {
        let path = config_path(repo_root);
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed reading config: {}", path.display()))?;
            Self::from_toml_str(&content)
                .with_context(|| format!("failed parsing config: {}", path.display()))?
        } else {
            tracing::debug!("no {} found, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub(crate) fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub(crate) fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(branch) = lookup("REVTRACK_UPSTREAM_BRANCH") {
            self.upstream.branch = branch;
        }
        if let Some(timeout) = lookup("REVTRACK_HTTP_TIMEOUT_SECS") {
            self.upstream.timeout_secs = timeout
                .trim()
                .parse()
                .context("failed to parse REVTRACK_HTTP_TIMEOUT_SECS as u64")?;
        }
        Ok(())
    }
}

fn config_path(repo_root: &Path) -> PathBuf {
    repo_root.join(CONFIG_FILE_NAME)
}
