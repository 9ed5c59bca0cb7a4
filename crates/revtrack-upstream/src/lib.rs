mod config;
mod github;
mod source;

pub use config::UpstreamConfig;
pub use github::{GithubUpstream, NetworkError};
pub use source::{validate_revision, CommitInfo, CommitSignature, CommitSummary, UpstreamSource};
