use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use clap::Parser;
use revtrack_tree::{TrackingState, TrackingStateStore, TreeConfig, TreeLayout};
use revtrack_upstream::{CommitInfo, CommitSignature, CommitSummary, UpstreamSource};

use super::*;
use crate::config::RevtrackConfig;
use crate::render::OutputStyle;
use crate::report::UpdateStatus;

const BASE_MANIFEST: &str = r#"[package]
name = "flex-update-mc-bot"
version = "0.1.0"
edition = "2024"

[package.metadata]
mc_version = "1.21.7"

[dependencies]
azalea = { git = "https://github.com/azalea-rs/azalea", rev = "aaa111" }
azalea-protocol = { git = "https://github.com/azalea-rs/azalea", rev = "aaa111" }
anyhow = "1.0.97"
tokio = "1.44.0"
common = { path = "../../common" }
"#;

const UPSTREAM_LOCK: &str = r#"version = 4

[[package]]
name = "anyhow"
version = "1.0.98"
source = "registry+https://github.com/rust-lang/crates.io-index"

[[package]]
name = "tokio"
version = "1.46.1"
source = "registry+https://github.com/rust-lang/crates.io-index"
"#;

fn upstream_manifest(version: &str) -> String {
    format!("[workspace]\nmembers = [\"azalea\"]\n\n[workspace.package]\nversion = \"{version}\"\n")
}

struct FakeUpstream {
    latest: String,
    commit_date: String,
    manifest: String,
    lockfile: String,
    readme: Option<String>,
    fail_manifest: bool,
    latest_calls: Cell<u32>,
    fetches: RefCell<Vec<String>>,
}

impl FakeUpstream {
    fn new(latest: &str, package_version: &str) -> Self {
        Self {
            latest: latest.to_string(),
            commit_date: "2025-07-14T10:30:00Z".to_string(),
            manifest: upstream_manifest(package_version),
            lockfile: UPSTREAM_LOCK.to_string(),
            readme: None,
            fail_manifest: false,
            latest_calls: Cell::new(0),
            fetches: RefCell::new(Vec::new()),
        }
    }

    fn record(&self, kind: &str, revision: &str) {
        self.fetches.borrow_mut().push(format!("{kind}:{revision}"));
    }

    fn fetches(&self) -> Vec<String> {
        self.fetches.borrow().clone()
    }
}

impl UpstreamSource for FakeUpstream {
    fn latest_revision(&self) -> Result<String> {
        self.latest_calls.set(self.latest_calls.get() + 1);
        Ok(self.latest.clone())
    }

    fn commit_info(&self, revision: &str) -> Result<CommitInfo> {
        self.record("commit", revision);
        Ok(CommitInfo {
            sha: revision.to_string(),
            commit: CommitSummary {
                committer: CommitSignature {
                    date: self.commit_date.clone(),
                },
            },
        })
    }

    fn manifest(&self, revision: &str) -> Result<String> {
        self.record("manifest", revision);
        if self.fail_manifest {
            return Err(anyhow!("upstream request failed: 502 Bad Gateway"));
        }
        Ok(self.manifest.clone())
    }

    fn lockfile(&self, revision: &str) -> Result<String> {
        self.record("lockfile", revision);
        Ok(self.lockfile.clone())
    }

    fn readme(&self, revision: &str) -> Result<String> {
        self.record("readme", revision);
        self.readme
            .clone()
            .ok_or_else(|| anyhow!("upstream request failed: 404 Not Found"))
    }
}

#[test]
fn update_clones_and_patches_new_version_directory() {
    let layout = test_layout();
    seed_version_dir(&layout, "1.21.7");
    TrackingStateStore::new(layout.clone())
        .save("aaa111", "1.21.7")
        .expect("must seed state");

    let updater = Updater::new(
        FakeUpstream::new("bbb222", "0.13.0+mc1.21.8"),
        layout.clone(),
        "azalea",
    );
    let report = updater.run(&UpdateRequest::default());

    assert_eq!(report.status, UpdateStatus::Updated, "{}", report.message);
    assert_eq!(report.mc_version.as_deref(), Some("1.21.8"));
    assert_eq!(report.message, "Updated to bbb222 (MC 1.21.8)");

    let manifest = fs::read_to_string(layout.manifest_path("1.21.8")).expect("must read manifest");
    assert_eq!(manifest.matches("rev = \"bbb222\"").count(), 2);
    assert!(manifest.contains("anyhow = \"1.0.98\""));
    assert!(manifest.contains("tokio = \"1.46.1\""));
    assert!(manifest.contains("mc_version = \"1.21.8\""));
    assert!(manifest.contains("common = { path = \"../../common\" }"));
    assert_eq!(
        fs::read_to_string(layout.lockfile_path("1.21.8")).expect("must read lockfile"),
        UPSTREAM_LOCK
    );
    assert_eq!(
        fs::read_to_string(layout.toolchain_path("1.21.8")).expect("must read toolchain"),
        "nightly-2025-07-14"
    );

    assert_eq!(
        fs::read_to_string(layout.manifest_path("1.21.7")).expect("must read base"),
        BASE_MANIFEST,
        "the base directory must not be patched"
    );

    let state = TrackingStateStore::new(layout.clone()).load().expect("must load");
    assert_eq!(
        state,
        TrackingState {
            revision: Some("bbb222".to_string()),
            mc_version: Some("1.21.8".to_string()),
        }
    );

    let _ = fs::remove_dir_all(layout.root());
}

#[test]
fn update_is_noop_when_revision_already_applied() {
    let layout = test_layout();
    seed_version_dir(&layout, "1.21.7");
    TrackingStateStore::new(layout.clone())
        .save("aaa111", "1.21.7")
        .expect("must seed state");

    let updater = Updater::new(
        FakeUpstream::new("bbb222", "0.13.0+mc1.21.8"),
        layout.clone(),
        "azalea",
    );
    let first = updater.run(&UpdateRequest::default());
    assert_eq!(first.status, UpdateStatus::Updated, "{}", first.message);
    let fetches_after_first = updater.upstream().fetches().len();
    let before = snapshot_tree(layout.root());

    let second = updater.run(&UpdateRequest::default());
    assert_eq!(second.status, UpdateStatus::UpToDate);
    assert_eq!(second.message, "Already up to date");
    assert_eq!(second.mc_version, None);
    assert_eq!(updater.upstream().fetches().len(), fetches_after_first);
    assert_eq!(before, snapshot_tree(layout.root()), "second run must not write");

    let _ = fs::remove_dir_all(layout.root());
}

#[test]
fn first_run_without_baseline_fails_instead_of_guessing() {
    let layout = test_layout();
    fs::create_dir_all(layout.root()).expect("must create root");

    let updater = Updater::new(
        FakeUpstream::new("deadbeef", "0.11.0+mc1.20.0"),
        layout.clone(),
        "azalea",
    );
    let report = updater.run(&UpdateRequest::default());

    assert_eq!(report.status, UpdateStatus::Error);
    assert!(
        report.message.contains("no base version to copy from"),
        "unexpected message: {}",
        report.message
    );
    assert!(
        !layout.versions_dir().exists()
            || fs::read_dir(layout.versions_dir()).expect("read").count() == 0
    );
    assert!(!layout.state_path().exists());

    let _ = fs::remove_dir_all(layout.root());
}

#[test]
fn update_fails_when_tracked_base_directory_is_missing() {
    let layout = test_layout();
    TrackingStateStore::new(layout.clone())
        .save("aaa111", "1.21.7")
        .expect("must seed state");

    let updater = Updater::new(
        FakeUpstream::new("bbb222", "0.13.0+mc1.21.8"),
        layout.clone(),
        "azalea",
    );
    let report = updater.run(&UpdateRequest::default());

    assert_eq!(report.status, UpdateStatus::Error);
    assert!(report.message.contains("source version directory not found"));
    let state = TrackingStateStore::new(layout.clone()).load().expect("must load");
    assert_eq!(state.revision.as_deref(), Some("aaa111"));

    let _ = fs::remove_dir_all(layout.root());
}

#[test]
fn update_patches_existing_directory_in_place_for_same_target_version() {
    let layout = test_layout();
    seed_version_dir(&layout, "1.21.7");
    TrackingStateStore::new(layout.clone())
        .save("aaa111", "1.21.7")
        .expect("must seed state");

    let updater = Updater::new(
        FakeUpstream::new("ccc333", "0.13.0+mc1.21.7"),
        layout.clone(),
        "azalea",
    );
    let report = updater.run(&UpdateRequest::default());

    assert_eq!(report.status, UpdateStatus::Updated, "{}", report.message);
    let manifest = fs::read_to_string(layout.manifest_path("1.21.7")).expect("must read");
    assert_eq!(manifest.matches("rev = \"ccc333\"").count(), 2);
    assert_eq!(
        list_version_directories(&layout).expect("must list"),
        vec!["1.21.7"]
    );

    let _ = fs::remove_dir_all(layout.root());
}

#[test]
fn explicit_revision_skips_latest_lookup_and_threads_into_readme_fallback() {
    let layout = test_layout();
    seed_version_dir(&layout, "1.21.7");
    TrackingStateStore::new(layout.clone())
        .save("aaa111", "1.21.7")
        .expect("must seed state");

    let mut upstream = FakeUpstream::new("ffff999", "0.14.0");
    upstream.readme = Some("Currently supported Minecraft version: `1.22.0`\n".to_string());
    let updater = Updater::new(upstream, layout.clone(), "azalea");
    let report = updater.run(&UpdateRequest {
        revision: Some("eee444".to_string()),
        ..UpdateRequest::default()
    });

    assert_eq!(report.status, UpdateStatus::Updated, "{}", report.message);
    assert_eq!(report.mc_version.as_deref(), Some("1.22.0"));
    assert_eq!(updater.upstream().latest_calls.get(), 0);
    assert_eq!(
        updater.upstream().fetches(),
        vec![
            "commit:eee444",
            "manifest:eee444",
            "lockfile:eee444",
            "readme:eee444"
        ]
    );
    assert!(layout.version_dir("1.22.0").is_dir());

    let _ = fs::remove_dir_all(layout.root());
}

#[test]
fn extraction_failure_leaves_tree_and_state_untouched() {
    let layout = test_layout();
    seed_version_dir(&layout, "1.21.7");
    TrackingStateStore::new(layout.clone())
        .save("aaa111", "1.21.7")
        .expect("must seed state");
    let before = snapshot_tree(layout.root());

    let updater = Updater::new(
        FakeUpstream::new("bbb222", "0.14.0"),
        layout.clone(),
        "azalea",
    );
    let report = updater.run(&UpdateRequest::default());

    assert_eq!(report.status, UpdateStatus::Error);
    assert!(report.message.starts_with("Failed to update: "));
    assert!(report.message.contains("could not extract MC version from: 0.14.0"));
    assert_eq!(before, snapshot_tree(layout.root()));

    let _ = fs::remove_dir_all(layout.root());
}

#[test]
fn upstream_failure_is_reported_as_error_without_writes() {
    let layout = test_layout();
    seed_version_dir(&layout, "1.21.7");
    TrackingStateStore::new(layout.clone())
        .save("aaa111", "1.21.7")
        .expect("must seed state");
    let before = snapshot_tree(layout.root());

    let mut upstream = FakeUpstream::new("bbb222", "0.13.0+mc1.21.8");
    upstream.fail_manifest = true;
    let updater = Updater::new(upstream, layout.clone(), "azalea");
    let report = updater.run(&UpdateRequest::default());

    assert_eq!(report.status, UpdateStatus::Error);
    assert!(report.message.contains("failed fetching manifest at bbb222"));
    assert!(report.message.contains("502 Bad Gateway"));
    assert_eq!(before, snapshot_tree(layout.root()));

    let _ = fs::remove_dir_all(layout.root());
}

#[test]
fn dry_run_reports_plan_without_writes() {
    let layout = test_layout();
    seed_version_dir(&layout, "1.21.7");
    TrackingStateStore::new(layout.clone())
        .save("aaa111", "1.21.7")
        .expect("must seed state");
    let before = snapshot_tree(layout.root());

    let updater = Updater::new(
        FakeUpstream::new("bbb222", "0.13.0+mc1.21.8"),
        layout.clone(),
        "azalea",
    );
    let report = updater.run(&UpdateRequest {
        dry_run: true,
        ..UpdateRequest::default()
    });

    assert_eq!(report.status, UpdateStatus::Planned, "{}", report.message);
    assert_eq!(
        report.message,
        "Would update to bbb222 (MC 1.21.8): clone from 1.21.7, 2/2 pins locked"
    );
    assert_eq!(before, snapshot_tree(layout.root()));

    let _ = fs::remove_dir_all(layout.root());
}

#[test]
fn forced_mc_version_skips_extraction() {
    let layout = test_layout();
    seed_version_dir(&layout, "1.21.7");
    TrackingStateStore::new(layout.clone())
        .save("aaa111", "1.21.7")
        .expect("must seed state");

    let updater = Updater::new(
        FakeUpstream::new("bbb222", "0.14.0"),
        layout.clone(),
        "azalea",
    );
    let report = updater.run(&UpdateRequest {
        mc_version: Some("1.21.9".to_string()),
        ..UpdateRequest::default()
    });

    assert_eq!(report.status, UpdateStatus::Updated, "{}", report.message);
    assert_eq!(report.mc_version.as_deref(), Some("1.21.9"));
    assert!(!updater
        .upstream()
        .fetches()
        .iter()
        .any(|fetch| fetch.starts_with("readme:")));

    let _ = fs::remove_dir_all(layout.root());
}

#[test]
fn invalid_explicit_revision_is_rejected() {
    let layout = test_layout();
    let updater = Updater::new(
        FakeUpstream::new("bbb222", "0.13.0+mc1.21.8"),
        layout.clone(),
        "azalea",
    );
    let report = updater.run(&UpdateRequest {
        revision: Some("../main".to_string()),
        ..UpdateRequest::default()
    });
    assert_eq!(report.status, UpdateStatus::Error);
    assert!(report.message.contains("invalid revision"));
    assert!(updater.upstream().fetches().is_empty());
}

#[test]
fn report_json_omits_missing_mc_version() {
    let json = UpdateReport::up_to_date().to_json().expect("must serialize");
    let value: serde_json::Value = serde_json::from_str(&json).expect("must parse");
    assert_eq!(value["status"], "up_to_date");
    assert_eq!(value["message"], "Already up to date");
    assert!(value.get("mc_version").is_none());

    let updated = UpdateReport {
        status: UpdateStatus::Updated,
        message: "Updated to bbb22200 (MC 1.21.8)".to_string(),
        mc_version: Some("1.21.8".to_string()),
    };
    let value: serde_json::Value =
        serde_json::from_str(&updated.to_json().expect("must serialize")).expect("must parse");
    assert_eq!(value["status"], "updated");
    assert_eq!(value["mc_version"], "1.21.8");
}

#[test]
fn report_exit_code_is_failure_only_for_errors() {
    assert_eq!(
        format!("{:?}", UpdateReport::error("boom").exit_code()),
        format!("{:?}", ExitCode::FAILURE)
    );
    assert_eq!(
        format!("{:?}", UpdateReport::up_to_date().exit_code()),
        format!("{:?}", ExitCode::SUCCESS)
    );
}

#[test]
fn ci_outputs_append_key_value_lines() {
    let layout = test_layout();
    fs::create_dir_all(layout.root()).expect("must create root");
    let output = layout.root().join("github_output");
    fs::write(&output, "previous=1\n").expect("must seed output");

    let report = UpdateReport {
        status: UpdateStatus::Error,
        message: "Failed to update: line one\nline two".to_string(),
        mc_version: None,
    };
    append_ci_outputs(&output, &report).expect("must append");

    assert_eq!(
        fs::read_to_string(&output).expect("must read"),
        "previous=1\nstatus=error\nmessage=Failed to update: line one line two\n"
    );

    let _ = fs::remove_dir_all(layout.root());
}

#[test]
fn config_defaults_apply_without_file_and_env_overrides_win() {
    let mut config = RevtrackConfig::from_toml_str(
        "[upstream]\nbranch = \"dev\"\n\n[tree]\nmirrored_packages = [\"tokio\", \"serde\"]\n",
    )
    .expect("must parse config");
    assert_eq!(config.upstream.branch, "dev");
    assert_eq!(config.upstream.repo, "azalea");
    assert_eq!(config.tree.mirrored_packages, vec!["tokio", "serde"]);

    config
        .apply_env_overrides(|key| match key {
            "REVTRACK_UPSTREAM_BRANCH" => Some("main".to_string()),
            "REVTRACK_HTTP_TIMEOUT_SECS" => Some(" 45 ".to_string()),
            _ => None,
        })
        .expect("must apply overrides");
    assert_eq!(config.upstream.branch, "main");
    assert_eq!(config.upstream.timeout_secs, 45);

    let err = config
        .apply_env_overrides(|key| {
            (key == "REVTRACK_HTTP_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .expect_err("must reject non-numeric timeout");
    assert!(err.to_string().contains("REVTRACK_HTTP_TIMEOUT_SECS"));
}

#[test]
fn config_rejects_unknown_tables() {
    let err = RevtrackConfig::from_toml_str("[notifier]\nurl = \"https://example.test\"\n")
        .expect_err("must reject unknown table");
    assert!(err.to_string().contains("notifier"));
}

#[test]
fn config_load_reads_file_from_repo_root() {
    let layout = test_layout();
    fs::create_dir_all(layout.root()).expect("must create root");
    fs::write(
        layout.root().join("revtrack.toml"),
        "[tree]\nversions_dir = \"pinned\"\n",
    )
    .expect("must write config");

    let config = RevtrackConfig::load(layout.root()).expect("must load config");
    assert_eq!(config.tree.versions_dir, PathBuf::from("pinned"));

    let _ = fs::remove_dir_all(layout.root());
}

#[test]
fn status_lines_mark_tracked_version() {
    let state = TrackingState {
        revision: Some("bbb222".to_string()),
        mc_version: Some("1.21.8".to_string()),
    };
    let versions = vec!["1.21.7".to_string(), "1.21.8".to_string()];
    assert_eq!(
        format_status_lines(&state, &versions, OutputStyle::Plain),
        vec![
            "revision: bbb222",
            "version: 1.21.8",
            "directories:",
            "  1.21.7",
            "* 1.21.8",
        ]
    );
    assert_eq!(
        format_status_lines(&TrackingState::default(), &[], OutputStyle::Plain),
        vec!["revision: (none)", "version: (none)", "directories: (none)"]
    );
}

#[test]
fn cli_parses_update_flags() {
    let cli = Cli::try_parse_from([
        "revtrack",
        "--repo-root",
        "/srv/bot",
        "update",
        "--commit",
        "bbb222",
        "--dry-run",
    ])
    .expect("must parse");
    assert_eq!(cli.repo_root, PathBuf::from("/srv/bot"));
    match cli.command {
        Commands::Update {
            commit,
            mc_version,
            dry_run,
        } => {
            assert_eq!(commit.as_deref(), Some("bbb222"));
            assert_eq!(mc_version, None);
            assert!(dry_run);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn completions_mention_binary_name() {
    let mut out = Vec::new();
    write_completions_script(Shell::Bash, &mut out).expect("must generate");
    let script = String::from_utf8(out).expect("utf-8 script");
    assert!(script.contains("revtrack"));
    assert!(script.contains("update"));
}

fn seed_version_dir(layout: &TreeLayout, mc_version: &str) {
    fs::create_dir_all(layout.version_dir(mc_version).join("src")).expect("must create dir");
    fs::write(layout.manifest_path(mc_version), BASE_MANIFEST).expect("must write manifest");
    fs::write(
        layout.lockfile_path(mc_version),
        "version = 4\n\n[[package]]\nname = \"anyhow\"\nversion = \"1.0.97\"\n",
    )
    .expect("must write lockfile");
    fs::write(layout.toolchain_path(mc_version), "nightly-2025-06-01").expect("must write pin");
    fs::write(
        layout.version_dir(mc_version).join("src/main.rs"),
        "fn main() {}\n",
    )
    .expect("must write source");
}

fn snapshot_tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).expect("must read dir") {
            let entry = entry.expect("must read entry");
            let path = entry.path();
            if path.is_dir() {
                files.push((path.clone(), Vec::new()));
                pending.push(path);
            } else {
                let bytes = fs::read(&path).expect("must read file");
                files.push((path, bytes));
            }
        }
    }
    files.sort();
    files
}

static TEST_LAYOUT_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_layout() -> TreeLayout {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let sequence = TEST_LAYOUT_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut path = std::env::temp_dir();
    path.push(format!(
        "revtrack-cli-tests-{}-{}-{}",
        std::process::id(),
        nanos,
        sequence
    ));
    TreeLayout::new(path, TreeConfig::default())
}
