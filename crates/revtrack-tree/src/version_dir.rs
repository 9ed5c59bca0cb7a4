use std::fs;

use anyhow::{Context, Result};
use revtrack_core::{lenient_semver, MissingBaseError};

use crate::fs_ops::{copy_dir_recursive, unique_suffix};
use crate::{validate_target_version, TreeLayout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    Existing,
    Cloned { from: String },
}

pub fn plan_version_directory(
    layout: &TreeLayout,
    target: &str,
    base: Option<&str>,
) -> Result<EnsureOutcome> {
    validate_target_version(target)?;
    if layout.version_dir(target).is_dir() {
        return Ok(EnsureOutcome::Existing);
    }

    let Some(base) = base else {
        return Err(MissingBaseError::NoTrackedVersion {
            target: target.to_string(),
        }
        .into());
    };
    validate_target_version(base)?;
    let base_dir = layout.version_dir(base);
    if !base_dir.is_dir() {
        return Err(MissingBaseError::BaseDirectoryMissing {
            target: target.to_string(),
            base: base.to_string(),
            path: base_dir,
        }
        .into());
    }

    Ok(EnsureOutcome::Cloned {
        from: base.to_string(),
    })
}

/// The copy is staged next to the final path and renamed into place, so an
/// interrupted clone never leaves a half-populated directory that a later
/// run would mistake for an existing one.
pub fn ensure_version_directory(
    layout: &TreeLayout,
    target: &str,
    base: Option<&str>,
) -> Result<EnsureOutcome> {
    let outcome = plan_version_directory(layout, target, base)?;
    let EnsureOutcome::Cloned { from } = &outcome else {
        return Ok(outcome);
    };

    let base_dir = layout.version_dir(from);
    let target_dir = layout.version_dir(target);
    let staged_dir = layout
        .versions_dir()
        .join(format!(".{target}.tmp-{}", unique_suffix()));
    if let Err(err) = copy_dir_recursive(&base_dir, &staged_dir) {
        let _ = fs::remove_dir_all(&staged_dir);
        return Err(err)
            .with_context(|| format!("failed cloning version directory {from} to {target}"));
    }
    if let Err(err) = fs::rename(&staged_dir, &target_dir) {
        let _ = fs::remove_dir_all(&staged_dir);
        return Err(err).with_context(|| {
            format!(
                "failed moving cloned version directory into {}",
                target_dir.display()
            )
        });
    }

    tracing::info!(from = from.as_str(), to = target, "cloned version directory");
    Ok(outcome)
}

pub fn list_version_directories(layout: &TreeLayout) -> Result<Vec<String>> {
    let versions_dir = layout.versions_dir();
    if !versions_dir.exists() {
        return Ok(Vec::new());
    }

    let mut versions = Vec::new();
    for entry in fs::read_dir(&versions_dir)
        .with_context(|| format!("failed reading versions dir: {}", versions_dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        versions.push(name);
    }

    // Non-semver names (snapshots) sort after every release, by name.
    versions.sort_by_cached_key(|name| {
        let parsed = lenient_semver(name);
        (parsed.is_none(), parsed, name.clone())
    });
    Ok(versions)
}
