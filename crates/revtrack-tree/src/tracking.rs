use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::fs_ops::read_trimmed;
use crate::TreeLayout;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingState {
    pub revision: Option<String>,
    pub mc_version: Option<String>,
}

impl TrackingState {
    pub fn is_current(&self, revision: &str) -> bool {
        self.revision.as_deref() == Some(revision)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TrackingRecordFile {
    #[serde(default = "record_format")]
    format: u32,
    #[serde(default)]
    revision: String,
    #[serde(default)]
    mc_version: String,
}

fn record_format() -> u32 {
    1
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone)]
pub struct TrackingStateStore {
    layout: TreeLayout,
}

impl TrackingStateStore {
    pub fn new(layout: TreeLayout) -> Self {
        Self { layout }
    }

    pub fn load(&self) -> Result<TrackingState> {
        let path = self.layout.state_path();
        if !path.exists() {
            return self.load_legacy();
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed reading tracking state: {}", path.display()))?;
        let record: TrackingRecordFile = toml::from_str(&content)
            .with_context(|| format!("failed parsing tracking state: {}", path.display()))?;
        let expected = record_format();
        if record.format != expected {
            anyhow::bail!(
                "unsupported tracking state format {} (expected {}): {}",
                record.format,
                expected,
                path.display()
            );
        }

        Ok(TrackingState {
            revision: non_empty(record.revision),
            mc_version: non_empty(record.mc_version),
        })
    }

    fn load_legacy(&self) -> Result<TrackingState> {
        let revision = read_trimmed(&self.layout.legacy_revision_path())
            .context("failed reading legacy revision file")?;
        let mc_version = read_trimmed(&self.layout.legacy_version_path())
            .context("failed reading legacy version file")?;
        if revision.is_some() || mc_version.is_some() {
            tracing::debug!("tracking state loaded from legacy files");
        }
        Ok(TrackingState {
            revision,
            mc_version,
        })
    }

    pub fn save(&self, revision: &str, mc_version: &str) -> Result<()> {
        let path = self.layout.state_path();
        let parent = path
            .parent()
            .with_context(|| format!("tracking state path has no parent: {}", path.display()))?;
        fs::create_dir_all(parent).with_context(|| {
            format!("failed creating tracking state dir: {}", parent.display())
        })?;

        let record = TrackingRecordFile {
            format: record_format(),
            revision: revision.to_string(),
            mc_version: mc_version.to_string(),
        };
        let content = toml::to_string(&record)
            .with_context(|| format!("failed serializing tracking state: {}", path.display()))?;

        let mut staged = NamedTempFile::new_in(parent)
            .with_context(|| format!("failed staging tracking state in {}", parent.display()))?;
        staged
            .write_all(content.as_bytes())
            .and_then(|_| staged.as_file().sync_all())
            .with_context(|| {
                format!("failed writing staged tracking state for {}", path.display())
            })?;
        staged
            .persist(&path)
            .map_err(|err| err.error)
            .with_context(|| format!("failed replacing tracking state: {}", path.display()))?;
        Ok(())
    }
}
