use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use thiserror::Error;

use crate::{validate_revision, CommitInfo, UpstreamConfig, UpstreamSource};

const GITHUB_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Error)]
#[error("upstream request failed: {url}")]
pub struct NetworkError {
    pub url: String,
    #[source]
    pub source: reqwest::Error,
}

#[derive(Debug, Clone)]
pub struct GithubUpstream {
    client: Client,
    config: UpstreamConfig,
}

impl GithubUpstream {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("revtrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed building upstream HTTP client")?;
        Ok(Self { client, config })
    }

    fn get_api(&self, url: &str) -> Result<Response> {
        tracing::debug!(%url, "fetching upstream api");
        self.client
            .get(url)
            .header(ACCEPT, GITHUB_JSON)
            .send()
            .and_then(Response::error_for_status)
            .map_err(|source| network_error(url, source))
    }

    fn get_raw(&self, revision: &str, path: &str) -> Result<String> {
        validate_revision(revision)?;
        let url = self.config.raw_url(revision, path);
        tracing::debug!(%url, "fetching upstream file");
        self.client
            .get(&url)
            .send()
            .and_then(Response::error_for_status)
            .and_then(Response::text)
            .map_err(|source| network_error(&url, source))
    }

    fn fetch_commit(&self, reference: &str) -> Result<CommitInfo> {
        let url = self.config.commit_url(reference);
        self.get_api(&url)?
            .json::<CommitInfo>()
            .map_err(|source| network_error(&url, source))
    }
}

fn network_error(url: &str, source: reqwest::Error) -> anyhow::Error {
    NetworkError {
        url: url.to_string(),
        source,
    }
    .into()
}

impl UpstreamSource for GithubUpstream {
    fn latest_revision(&self) -> Result<String> {
        let commit = self
            .fetch_commit(&self.config.branch)
            .with_context(|| {
                format!("failed resolving latest revision of '{}'", self.config.branch)
            })?;
        validate_revision(&commit.sha)?;
        Ok(commit.sha)
    }

    fn commit_info(&self, revision: &str) -> Result<CommitInfo> {
        validate_revision(revision)?;
        self.fetch_commit(revision)
    }

    fn manifest(&self, revision: &str) -> Result<String> {
        self.get_raw(revision, &self.config.manifest_path)
    }

    fn lockfile(&self, revision: &str) -> Result<String> {
        self.get_raw(revision, &self.config.lockfile_path)
    }

    fn readme(&self, revision: &str) -> Result<String> {
        self.get_raw(revision, &self.config.readme_path)
    }
}
