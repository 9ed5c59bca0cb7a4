use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("could not extract MC version from: {raw_version}")]
pub struct ExtractionError {
    pub raw_version: String,
}

#[derive(Debug, Error)]
pub enum MissingBaseError {
    #[error("no base version to copy from for {target}: tracking state has no version")]
    NoTrackedVersion { target: String },
    #[error("source version directory not found for {target}: {}", path.display())]
    BaseDirectoryMissing {
        target: String,
        base: String,
        path: PathBuf,
    },
}

#[derive(Debug, Error)]
#[error("failed {action} {}", path.display())]
pub struct PatchIoError {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl PatchIoError {
    pub fn reading(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            action: "reading",
            path: path.into(),
            source,
        }
    }

    pub fn writing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            action: "writing",
            path: path.into(),
            source,
        }
    }
}
