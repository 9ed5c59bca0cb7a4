use std::cmp::Ordering;

use anyhow::{Context, Result};
use revtrack_core::{compare_target_versions, extract_target_version, mirrored_pins, short_revision};
use revtrack_tree::{
    ensure_version_directory, patch_dependency_pins, patch_metadata_version, patch_revision_pins,
    plan_version_directory, replace_lockfile, validate_target_version, write_toolchain_pin,
    EnsureOutcome, TrackingStateStore, TreeLayout,
};
use revtrack_upstream::{validate_revision, UpstreamSource};

use crate::report::{UpdateReport, UpdateStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct UpdateRequest {
    pub(crate) revision: Option<String>,
    pub(crate) mc_version: Option<String>,
    pub(crate) dry_run: bool,
}

pub(crate) struct Updater<U> {
    upstream: U,
    layout: TreeLayout,
    store: TrackingStateStore,
    package_prefix: String,
}

impl<U: UpstreamSource> Updater<U> {
    pub(crate) fn new(upstream: U, layout: TreeLayout, package_prefix: impl Into<String>) -> Self {
        Self {
            upstream,
            store: TrackingStateStore::new(layout.clone()),
            layout,
            package_prefix: package_prefix.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn upstream(&self) -> &U {
        &self.upstream
    }

    pub(crate) fn run(&self, request: &UpdateRequest) -> UpdateReport {
        match self.try_run(request) {
            Ok(report) => report,
            Err(err) => {
                tracing::error!("update failed: {err:#}");
                UpdateReport::error(format!("Failed to update: {err:#}"))
            }
        }
    }

    fn try_run(&self, request: &UpdateRequest) -> Result<UpdateReport> {
        let revision = match request.revision.as_deref() {
            Some(revision) => revision.trim().to_string(),
            None => self.upstream.latest_revision()?,
        };
        validate_revision(&revision)?;

        let state = self.store.load()?;
        if state.is_current(&revision) {
            tracing::info!(revision = %revision, "already up to date");
            return Ok(UpdateReport::up_to_date());
        }
        tracing::info!(
            from = state.revision.as_deref().unwrap_or("<none>"),
            to = %revision,
            "updating upstream revision"
        );

        let commit = self
            .upstream
            .commit_info(&revision)
            .with_context(|| format!("failed fetching commit {revision}"))?;
        let manifest = self
            .upstream
            .manifest(&revision)
            .with_context(|| format!("failed fetching manifest at {revision}"))?;
        let lockfile = self
            .upstream
            .lockfile(&revision)
            .with_context(|| format!("failed fetching lockfile at {revision}"))?;

        let mc_version = match request.mc_version.as_deref() {
            Some(forced) => forced.trim().to_string(),
            None => extract_target_version(&manifest, || {
                self.upstream
                    .readme(&revision)
                    .with_context(|| format!("failed fetching readme at {revision}"))
            })?,
        };
        validate_target_version(&mc_version)?;
        if let Some(tracked) = state.mc_version.as_deref() {
            if compare_target_versions(&mc_version, tracked) == Some(Ordering::Less) {
                tracing::warn!(
                    tracked,
                    resolved = %mc_version,
                    "upstream now targets an older version than the tracked one"
                );
            }
        }

        let pins = mirrored_pins(&lockfile, &self.layout.config().mirrored_packages)?;
        let short = short_revision(&revision);

        if request.dry_run {
            let directory = plan_version_directory(
                &self.layout,
                &mc_version,
                state.mc_version.as_deref(),
            )?;
            let locked = pins.iter().filter(|pin| pin.version.is_some()).count();
            let directory_note = match directory {
                EnsureOutcome::Existing => "existing directory".to_string(),
                EnsureOutcome::Cloned { from } => format!("clone from {from}"),
            };
            let pin_note = format!("{locked}/{} pins locked", pins.len());
            return Ok(UpdateReport {
                status: UpdateStatus::Planned,
                message: format!(
                    "Would update to {short} (MC {mc_version}): {directory_note}, {pin_note}"
                ),
                mc_version: Some(mc_version),
            });
        }

        let directory =
            ensure_version_directory(&self.layout, &mc_version, state.mc_version.as_deref())?;
        if directory == EnsureOutcome::Existing {
            tracing::info!(mc_version = %mc_version, "patching existing version directory");
        }

        let revision_pins =
            patch_revision_pins(&self.layout, &mc_version, &self.package_prefix, &revision)?;
        let dependency_pins = patch_dependency_pins(&self.layout, &mc_version, &pins)?;
        patch_metadata_version(&self.layout, &mc_version)?;
        tracing::info!(revision_pins, dependency_pins, "manifest patched");

        let lockfile_replacement = replace_lockfile(&self.layout, &mc_version, &lockfile)?;
        tracing::info!(
            previous = lockfile_replacement.previous_digest.as_deref().unwrap_or("<none>"),
            current = %lockfile_replacement.new_digest,
            changed = lockfile_replacement.changed(),
            "lockfile replaced"
        );

        let toolchain =
            write_toolchain_pin(&self.layout, &mc_version, commit.committer_date())?;
        tracing::info!(toolchain = %toolchain, "toolchain pinned");

        self.store.save(&revision, &mc_version)?;

        Ok(UpdateReport {
            status: UpdateStatus::Updated,
            message: format!("Updated to {short} (MC {mc_version})"),
            mc_version: Some(mc_version),
        })
    }
}
