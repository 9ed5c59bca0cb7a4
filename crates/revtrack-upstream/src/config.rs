use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_base: String,
    pub raw_base: String,
    pub timeout_secs: u64,
    pub package_prefix: String,
    pub manifest_path: String,
    pub lockfile_path: String,
    pub readme_path: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            owner: "azalea-rs".to_string(),
            repo: "azalea".to_string(),
            branch: "main".to_string(),
            api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            timeout_secs: 20,
            package_prefix: "azalea".to_string(),
            manifest_path: "Cargo.toml".to_string(),
            lockfile_path: "Cargo.lock".to_string(),
            readme_path: "README.md".to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn commit_url(&self, reference: &str) -> String {
        format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            reference
        )
    }

    pub fn raw_url(&self, revision: &str, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            revision,
            path.trim_start_matches('/')
        )
    }
}
