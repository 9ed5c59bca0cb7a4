use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

pub(crate) fn copy_dir_recursive(source_root: &Path, destination_root: &Path) -> Result<()> {
    if !source_root.is_dir() {
        anyhow::bail!("copy source is not a directory: {}", source_root.display());
    }
    if destination_root.exists() {
        anyhow::bail!(
            "copy destination already exists: {}",
            destination_root.display()
        );
    }
    fs::create_dir_all(destination_root).with_context(|| {
        format!(
            "failed creating directory {}",
            destination_root.display()
        )
    })?;

    // Canonical ancestor paths per queued directory; a link to one is a cycle.
    let mut queue: VecDeque<(PathBuf, PathBuf, Vec<PathBuf>)> = VecDeque::new();
    queue.push_back((
        source_root.to_path_buf(),
        destination_root.to_path_buf(),
        vec![canonical_dir(source_root)?],
    ));

    while let Some((from_dir, to_dir, ancestors)) = queue.pop_front() {
        for entry in fs::read_dir(&from_dir)
            .with_context(|| format!("failed reading directory {}", from_dir.display()))?
        {
            let entry = entry?;
            let from_path = entry.path();
            let to_path = to_dir.join(entry.file_name());
            let mut file_type = entry.file_type()?;
            // Links are copied as what they point to.
            if file_type.is_symlink() {
                file_type = fs::metadata(&from_path)
                    .with_context(|| format!("failed resolving symlink {}", from_path.display()))?
                    .file_type();
            }
            if file_type.is_dir() {
                let canonical = canonical_dir(&from_path)?;
                if ancestors.contains(&canonical) {
                    anyhow::bail!("symlink cycle while copying {}", from_path.display());
                }
                fs::create_dir_all(&to_path)
                    .with_context(|| format!("failed creating directory {}", to_path.display()))?;
                let mut chain = ancestors.clone();
                chain.push(canonical);
                queue.push_back((from_path, to_path, chain));
            } else if file_type.is_file() {
                fs::copy(&from_path, &to_path).with_context(|| {
                    format!(
                        "failed copying file from {} to {}",
                        from_path.display(),
                        to_path.display()
                    )
                })?;
            } else {
                tracing::warn!(path = %from_path.display(), "skipping special file");
            }
        }
    }

    Ok(())
}

fn canonical_dir(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("failed resolving {}", path.display()))
}

pub(crate) fn read_trimmed(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let value = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed.to_string()))
}

pub(crate) fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}
