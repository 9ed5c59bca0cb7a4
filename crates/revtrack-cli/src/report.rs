use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum UpdateStatus {
    UpToDate,
    Updated,
    Planned,
    Error,
}

impl UpdateStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::UpToDate => "up_to_date",
            Self::Updated => "updated",
            Self::Planned => "planned",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct UpdateReport {
    pub(crate) status: UpdateStatus,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) mc_version: Option<String>,
}

impl UpdateReport {
    pub(crate) fn up_to_date() -> Self {
        Self {
            status: UpdateStatus::UpToDate,
            message: "Already up to date".to_string(),
            mc_version: None,
        }
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self {
            status: UpdateStatus::Error,
            message: message.into(),
            mc_version: None,
        }
    }

    pub(crate) fn exit_code(&self) -> ExitCode {
        match self.status {
            UpdateStatus::Error => ExitCode::FAILURE,
            _ => ExitCode::SUCCESS,
        }
    }

    pub(crate) fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed serializing update report")
    }

    pub(crate) fn ci_output_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("status={}", self.status.as_str()),
            format!("message={}", self.message.replace(['\r', '\n'], " ")),
        ];
        if let Some(mc_version) = &self.mc_version {
            lines.push(format!("mc_version={mc_version}"));
        }
        lines
    }
}

pub(crate) fn append_ci_outputs(path: &Path, report: &UpdateReport) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed opening CI output file: {}", path.display()))?;
    for line in report.ci_output_lines() {
        writeln!(file, "{line}")
            .with_context(|| format!("failed writing CI output file: {}", path.display()))?;
    }
    Ok(())
}
