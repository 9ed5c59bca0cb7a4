use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeConfig {
    pub versions_dir: PathBuf,
    pub state_file: PathBuf,
    pub legacy_state_dir: PathBuf,
    pub mirrored_packages: Vec<String>,
    pub manifest_file: String,
    pub lockfile_file: String,
    pub toolchain_file: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            versions_dir: PathBuf::from("versions"),
            state_file: PathBuf::from("codegen/revtrack-state.toml"),
            legacy_state_dir: PathBuf::from("codegen"),
            mirrored_packages: vec!["anyhow".to_string(), "tokio".to_string()],
            manifest_file: "Cargo.toml".to_string(),
            lockfile_file: "Cargo.lock".to_string(),
            toolchain_file: "rust-toolchain".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLayout {
    root: PathBuf,
    config: TreeConfig,
}

impl TreeLayout {
    pub fn new(root: impl Into<PathBuf>, config: TreeConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join(&self.config.versions_dir)
    }

    pub fn version_dir(&self, mc_version: &str) -> PathBuf {
        self.versions_dir().join(mc_version)
    }

    pub fn manifest_path(&self, mc_version: &str) -> PathBuf {
        self.version_dir(mc_version).join(&self.config.manifest_file)
    }

    pub fn lockfile_path(&self, mc_version: &str) -> PathBuf {
        self.version_dir(mc_version).join(&self.config.lockfile_file)
    }

    pub fn toolchain_path(&self, mc_version: &str) -> PathBuf {
        self.version_dir(mc_version).join(&self.config.toolchain_file)
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(&self.config.state_file)
    }

    pub fn legacy_revision_path(&self) -> PathBuf {
        self.root
            .join(&self.config.legacy_state_dir)
            .join("LATEST_AZALEA_OID")
    }

    pub fn legacy_version_path(&self) -> PathBuf {
        self.root
            .join(&self.config.legacy_state_dir)
            .join("LATEST_MC_VERSION")
    }
}

pub fn validate_target_version(mc_version: &str) -> Result<()> {
    if mc_version.is_empty() || mc_version.len() > 64 {
        anyhow::bail!("invalid target version: must be 1-64 characters");
    }
    if mc_version.starts_with('.') {
        anyhow::bail!("invalid target version: '{mc_version}'");
    }
    if !mc_version
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' || ch == '_' || ch == '+')
    {
        anyhow::bail!("invalid target version: '{mc_version}'");
    }
    Ok(())
}
