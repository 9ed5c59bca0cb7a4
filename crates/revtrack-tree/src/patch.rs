use std::fs;

use anyhow::Result;
use regex_lite::{Captures, Regex};
use revtrack_core::{DependencyPin, PatchIoError};

use crate::TreeLayout;

pub fn rewrite_revision_pins(text: &str, package_prefix: &str, revision: &str) -> (String, usize) {
    let pattern = format!(
        r#"(?m)^([ \t]*{}[A-Za-z0-9_-]*[ \t]*=[ \t]*\{{[^}}\n]*\brev[ \t]*=[ \t]*")[^"\n]*(")"#,
        regex_lite::escape(package_prefix)
    );
    replace_quoted_value(&pattern, text, revision)
}

pub fn rewrite_dependency_version(text: &str, name: &str, version: &str) -> (String, usize) {
    let pattern = format!(
        r#"(?m)^([ \t]*{}[ \t]*=[ \t]*")[^"\n]*(")"#,
        regex_lite::escape(name)
    );
    replace_quoted_value(&pattern, text, version)
}

pub fn rewrite_metadata_version(text: &str, mc_version: &str) -> (String, usize) {
    replace_quoted_value(
        r#"(?m)^([ \t]*mc_version[ \t]*=[ \t]*")[^"\n]*(")"#,
        text,
        mc_version,
    )
}

fn replace_quoted_value(pattern: &str, text: &str, value: &str) -> (String, usize) {
    let re = Regex::new(pattern).expect("manifest field patterns are valid");
    let count = re.find_iter(text).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    let rewritten = re
        .replace_all(text, |caps: &Captures| format!("{}{}{}", &caps[1], value, &caps[2]))
        .into_owned();
    (rewritten, count)
}

fn patch_manifest<F>(layout: &TreeLayout, mc_version: &str, rewrite: F) -> Result<usize>
where
    F: FnOnce(&str) -> (String, usize),
{
    let path = layout.manifest_path(mc_version);
    let original =
        fs::read_to_string(&path).map_err(|source| PatchIoError::reading(&path, source))?;
    let (patched, count) = rewrite(&original);
    if patched != original {
        fs::write(&path, patched).map_err(|source| PatchIoError::writing(&path, source))?;
    }
    Ok(count)
}

pub fn patch_revision_pins(
    layout: &TreeLayout,
    mc_version: &str,
    package_prefix: &str,
    revision: &str,
) -> Result<usize> {
    let count = patch_manifest(layout, mc_version, |text| {
        rewrite_revision_pins(text, package_prefix, revision)
    })?;
    if count == 0 {
        tracing::warn!(
            prefix = package_prefix,
            "no revision pins matched in {}",
            layout.manifest_path(mc_version).display()
        );
    }
    Ok(count)
}

pub fn patch_dependency_pins(
    layout: &TreeLayout,
    mc_version: &str,
    pins: &[DependencyPin],
) -> Result<usize> {
    patch_manifest(layout, mc_version, |text| {
        let mut current = text.to_string();
        let mut total = 0;
        for pin in pins {
            let Some(version) = pin.version.as_deref() else {
                tracing::debug!(package = %pin.name, "package not locked upstream, skipping");
                continue;
            };
            let (next, count) = rewrite_dependency_version(&current, &pin.name, version);
            if count == 0 {
                tracing::warn!(package = %pin.name, "no version declaration matched");
            }
            current = next;
            total += count;
        }
        (current, total)
    })
}

pub fn patch_metadata_version(layout: &TreeLayout, mc_version: &str) -> Result<usize> {
    patch_manifest(layout, mc_version, |text| {
        rewrite_metadata_version(text, mc_version)
    })
}
