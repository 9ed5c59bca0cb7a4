use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use revtrack_tree::{list_version_directories, TrackingStateStore, TreeLayout};
use revtrack_upstream::GithubUpstream;
use tracing_subscriber::EnvFilter;

mod completion;
mod config;
mod render;
mod report;
mod update_flow;

use completion::write_completions_script;
use config::RevtrackConfig;
use render::{current_output_style, format_status_lines};
use report::{append_ci_outputs, UpdateReport};
use update_flow::{UpdateRequest, Updater};

const LOG_ENV: &str = "REVTRACK_LOG";
const CI_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

#[derive(Parser, Debug)]
#[command(name = "revtrack")]
#[command(about = "Track an upstream revision into per-version directories", long_about = None)]
pub(crate) struct Cli {
    #[arg(long, global = true, default_value = ".")]
    repo_root: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Update {
        #[arg(long)]
        commit: Option<String>,
        #[arg(long)]
        mc_version: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    Status,
    Completions {
        shell: Shell,
    },
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_cli(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Update {
            commit,
            mc_version,
            dry_run,
        } => {
            let request = UpdateRequest {
                revision: commit,
                mc_version,
                dry_run,
            };
            run_update_command(&cli.repo_root, &request)
        }
        Commands::Status => {
            let config = RevtrackConfig::load(&cli.repo_root)?;
            let layout = TreeLayout::new(&cli.repo_root, config.tree);
            let state = TrackingStateStore::new(layout.clone()).load()?;
            let versions = list_version_directories(&layout)?;
            for line in format_status_lines(&state, &versions, current_output_style()) {
                println!("{line}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completions { shell } => {
            write_completions_script(shell, &mut std::io::stdout())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_update_command(repo_root: &Path, request: &UpdateRequest) -> Result<ExitCode> {
    let report = match build_updater(repo_root) {
        Ok(updater) => updater.run(request),
        Err(err) => UpdateReport::error(format!("Failed to update: {err:#}")),
    };

    println!("{}", report.to_json()?);
    if let Some(path) = std::env::var_os(CI_OUTPUT_ENV).filter(|value| !value.is_empty()) {
        append_ci_outputs(Path::new(&path), &report)?;
    }
    Ok(report.exit_code())
}

fn build_updater(repo_root: &Path) -> Result<Updater<GithubUpstream>> {
    let config = RevtrackConfig::load(repo_root)?;
    let package_prefix = config.upstream.package_prefix.clone();
    let upstream = GithubUpstream::new(config.upstream)?;
    let layout = TreeLayout::new(repo_root, config.tree);
    Ok(Updater::new(upstream, layout, package_prefix))
}

#[cfg(test)]
mod tests;
