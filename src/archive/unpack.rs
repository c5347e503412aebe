use crate::archive::format::{normalize_path, Entry, PATH_SEPARATOR};
use crate::error::{ArchiveError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Resolve where `entry` lands below `root`, rejecting names that would escape it
pub(crate) fn entry_destination(root: &Path, entry: &Entry) -> Result<PathBuf> {
    let normalized = normalize_path(&entry.path);
    if normalized.starts_with(PATH_SEPARATOR) {
        return Err(ArchiveError::UnsafePath(entry.path.clone()));
    }

    let mut destination = root.to_path_buf();
    for part in normalized.split(PATH_SEPARATOR) {
        if part.is_empty() || part == "." {
            continue;
        }

        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => destination.push(name),
            _ => return Err(ArchiveError::UnsafePath(entry.path.clone())),
        }
    }

    Ok(destination)
}

/// Write extracted bytes, creating parent directories as needed
pub(crate) fn write_file(destination: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(destination, contents)?;
    Ok(())
}
