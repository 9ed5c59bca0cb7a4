use std::fs;

use anyhow::Result;
use revtrack_core::{nightly_toolchain_from_commit_date, short_digest, PatchIoError};

use crate::TreeLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockfileReplacement {
    pub previous_digest: Option<String>,
    pub new_digest: String,
}

impl LockfileReplacement {
    pub fn changed(&self) -> bool {
        self.previous_digest.as_deref() != Some(self.new_digest.as_str())
    }
}

pub fn replace_lockfile(
    layout: &TreeLayout,
    mc_version: &str,
    upstream_lockfile: &str,
) -> Result<LockfileReplacement> {
    let path = layout.lockfile_path(mc_version);
    let previous_digest = match fs::read(&path) {
        Ok(bytes) => Some(short_digest(&bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(source) => return Err(PatchIoError::reading(&path, source).into()),
    };

    fs::write(&path, upstream_lockfile.as_bytes())
        .map_err(|source| PatchIoError::writing(&path, source))?;
    Ok(LockfileReplacement {
        previous_digest,
        new_digest: short_digest(upstream_lockfile.as_bytes()),
    })
}

pub fn write_toolchain_pin(
    layout: &TreeLayout,
    mc_version: &str,
    commit_date: &str,
) -> Result<String> {
    let path = layout.toolchain_path(mc_version);
    let toolchain = nightly_toolchain_from_commit_date(commit_date);
    fs::write(&path, toolchain.as_bytes())
        .map_err(|source| PatchIoError::writing(&path, source))?;
    Ok(toolchain)
}
