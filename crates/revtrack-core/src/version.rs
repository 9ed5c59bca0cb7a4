use std::cmp::Ordering;
use std::sync::OnceLock;

use anyhow::Result;
use regex_lite::Regex;
use semver::Version;

use crate::ExtractionError;

// `fetch_readme` must read the same revision the manifest came from.
pub fn extract_target_version<F>(manifest: &str, fetch_readme: F) -> Result<String>
where
    F: FnOnce() -> Result<String>,
{
    let raw_version = manifest_package_version(manifest);
    if let Some(mc_version) = raw_version
        .as_deref()
        .and_then(mc_version_from_package_version)
    {
        return Ok(mc_version);
    }

    tracing::debug!(
        raw_version = raw_version.as_deref().unwrap_or(""),
        "package version has no +mc suffix, scanning readme"
    );
    match fetch_readme() {
        Ok(readme) => {
            if let Some(mc_version) = mc_version_from_readme(&readme) {
                return Ok(mc_version);
            }
        }
        Err(err) => tracing::warn!("readme fallback unavailable: {err:#}"),
    }

    Err(ExtractionError {
        raw_version: raw_version.unwrap_or_default(),
    }
    .into())
}

fn manifest_package_version(manifest: &str) -> Option<String> {
    let table = match toml::from_str::<toml::Table>(manifest) {
        Ok(table) => table,
        Err(err) => {
            tracing::warn!("upstream manifest is not valid TOML: {err}");
            return None;
        }
    };
    table
        .get("workspace")
        .and_then(|workspace| workspace.get("package"))
        .and_then(|package| package.get("version"))
        .and_then(|version| version.as_str())
        .map(str::to_string)
}

pub fn mc_version_from_package_version(version: &str) -> Option<String> {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    let re = SUFFIX.get_or_init(|| Regex::new(r"\+mc(.+)$").expect("valid mc suffix regex"));
    let caps = re.captures(version.trim())?;
    let mc_version = caps.get(1)?.as_str().trim();
    (!mc_version.is_empty()).then(|| mc_version.to_string())
}

const SUPPORTED_VERSION_PATTERN: &str =
    r"(?i)Currently supported Minecraft version:\s*`?([0-9]+\.[0-9]+(?:\.[0-9]+)?)`?";

pub fn mc_version_from_readme(readme: &str) -> Option<String> {
    static SUPPORTED: OnceLock<Regex> = OnceLock::new();
    let re = SUPPORTED.get_or_init(|| {
        Regex::new(SUPPORTED_VERSION_PATTERN).expect("valid readme version regex")
    });
    re.captures(readme)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn lenient_semver(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    if let Ok(parsed) = Version::parse(trimmed) {
        return Some(parsed);
    }

    let parts = trimmed.split('.').collect::<Vec<_>>();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut numbers = [0_u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part.parse().ok()?;
    }
    Some(Version::new(numbers[0], numbers[1], numbers[2]))
}

pub fn compare_target_versions(left: &str, right: &str) -> Option<Ordering> {
    Some(lenient_semver(left)?.cmp(&lenient_semver(right)?))
}

pub fn short_revision(revision: &str) -> String {
    revision.chars().take(8).collect()
}
