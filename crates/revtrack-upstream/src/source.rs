use anyhow::Result;
use serde::{Deserialize, Serialize};

pub trait UpstreamSource {
    fn latest_revision(&self) -> Result<String>;
    fn commit_info(&self, revision: &str) -> Result<CommitInfo>;
    fn manifest(&self, revision: &str) -> Result<String>;
    fn lockfile(&self, revision: &str) -> Result<String>;
    fn readme(&self, revision: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub commit: CommitSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub committer: CommitSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSignature {
    pub date: String,
}

impl CommitInfo {
    pub fn committer_date(&self) -> &str {
        &self.commit.committer.date
    }
}

pub fn validate_revision(revision: &str) -> Result<()> {
    if revision.is_empty() {
        anyhow::bail!("invalid revision: must not be empty");
    }
    if !revision
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.')
    {
        anyhow::bail!("invalid revision: '{revision}'");
    }
    if revision.chars().all(|ch| ch == '.') {
        anyhow::bail!("invalid revision: '{revision}' is a path segment");
    }
    Ok(())
}
