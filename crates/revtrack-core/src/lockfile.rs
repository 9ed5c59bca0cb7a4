use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPin {
    pub name: String,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LockfileDocument {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

fn parse_lockfile(content: &str) -> Result<LockfileDocument> {
    toml::from_str(content).context("failed parsing upstream lockfile")
}

pub fn mirrored_pins(content: &str, names: &[String]) -> Result<Vec<DependencyPin>> {
    let document = parse_lockfile(content)?;
    Ok(names
        .iter()
        .map(|name| DependencyPin {
            name: name.clone(),
            version: first_locked_version(&document, name),
        })
        .collect())
}

fn first_locked_version(document: &LockfileDocument, name: &str) -> Option<String> {
    document
        .package
        .iter()
        .find(|package| package.name == name)
        .and_then(|package| package.version.clone())
}
