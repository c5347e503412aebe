//! Recursive packing of a filesystem subtree into archive entries
//!
//! The walk is depth-first and pre-order: a directory entry is always staged
//! before anything inside it. Children are visited in the order the OS lists
//! them unless sorted traversal is enabled.

use crate::archive::format::{normalize_path, SymlinkPolicy, PATH_SEPARATOR};
use crate::archive::handle::ArchiveHandle;
use crate::error::{ArchiveError, Result};
use std::fs;
use std::io;
use std::path::{Component, Path};
use tracing::{trace, warn};
use walkdir::WalkDir;

/// Stage `source` and everything below it under `archive_root`
pub(crate) fn add_tree(handle: &mut ArchiveHandle, source: &Path, archive_root: &str) -> Result<()> {
    let metadata = fs::metadata(source).map_err(|e| ArchiveError::entry_source(source, e))?;
    if !metadata.is_dir() {
        return Err(ArchiveError::entry_source(
            source,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let root = normalize_path(archive_root);
    let root = root.trim_end_matches(PATH_SEPARATOR);
    if !root.is_empty() {
        handle.create_directory(root)?;
    }

    let policy = handle.options().symlinks;
    let mut walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(policy == SymlinkPolicy::Follow);
    if handle.options().sorted {
        walker = walker.sort_by_file_name();
    }

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(source, e))?;
        let name = archive_name(root, source, entry.path())?;

        if entry.path_is_symlink() {
            match policy {
                SymlinkPolicy::Follow => {}
                SymlinkPolicy::Skip => {
                    warn!(path = %entry.path().display(), "skipping symbolic link");
                    continue;
                }
                SymlinkPolicy::Error => {
                    return Err(ArchiveError::entry_source(
                        entry.path(),
                        io::Error::new(io::ErrorKind::InvalidInput, "symbolic link in source tree"),
                    ));
                }
            }
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            handle.create_directory(&name)?;
        } else if file_type.is_file() {
            handle.add_file(entry.path(), &name)?;
        } else {
            trace!(path = %entry.path().display(), "skipping special file");
        }
    }

    Ok(())
}

/// Archive name for `path`, a descendant of `source`, placed under `root`
fn archive_name(root: &str, source: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(source).map_err(|_| {
        ArchiveError::entry_source(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "path outside source directory"),
        )
    })?;

    let mut name = String::from(root);
    for component in relative.components() {
        let Component::Normal(part) = component else {
            continue;
        };
        let part = part.to_str().ok_or_else(|| {
            ArchiveError::entry_source(
                path,
                io::Error::new(io::ErrorKind::InvalidData, "file name is not valid UTF-8"),
            )
        })?;

        if !name.is_empty() {
            name.push(PATH_SEPARATOR);
        }
        name.push_str(part);
    }

    Ok(name)
}

fn walk_error(source: &Path, err: walkdir::Error) -> ArchiveError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| source.to_path_buf());
    let message = err.to_string();
    let io_err = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::InvalidData, message));
    ArchiveError::entry_source(path, io_err)
}
