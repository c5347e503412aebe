//! One-call helpers composed from [`ArchiveHandle`] operations

use crate::archive::{ArchiveHandle, OpenMode};
use crate::error::Result;
use std::path::Path;

/// New, empty in-memory archive
pub fn create_archive_in_memory() -> ArchiveHandle {
    ArchiveHandle::in_memory()
}

/// Open an archive file in the given mode
pub fn create_archive_from_path<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<ArchiveHandle> {
    ArchiveHandle::open(path, mode)
}

/// Open an archive from bytes
pub fn create_archive_from_buffer(bytes: &[u8]) -> Result<ArchiveHandle> {
    ArchiveHandle::from_buffer(bytes)
}

/// Pack the contents of `source_dir` into a new archive and return its bytes
pub fn create_archive_to_buffer<P: AsRef<Path>>(source_dir: P) -> Result<Vec<u8>> {
    let mut zip = ArchiveHandle::in_memory();
    zip.add_directory(source_dir, "")?;
    zip.finalize_to_buffer()
}

/// Pack the contents of `source_dir` into `out_path`, replacing any existing file
pub fn create_archive<P: AsRef<Path>, Q: AsRef<Path>>(source_dir: P, out_path: Q) -> Result<()> {
    let mut zip = ArchiveHandle::open(out_path, OpenMode::Truncate)?;
    zip.add_directory(source_dir, "")?;
    zip.finalize()
}

/// Extract the archive file at `archive_path` below `dest_path`
pub fn unpack_archive<P: AsRef<Path>, Q: AsRef<Path>>(archive_path: P, dest_path: Q) -> Result<()> {
    let mut zip = ArchiveHandle::open(archive_path, OpenMode::Read)?;
    zip.unpack_to(dest_path)
}

/// Extract an in-memory archive below `dest_path`
pub fn unpack_buffer<Q: AsRef<Path>>(bytes: &[u8], dest_path: Q) -> Result<()> {
    let mut zip = ArchiveHandle::from_buffer(bytes)?;
    zip.unpack_to(dest_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_buffer_roundtrip() -> Result<()> {
        let source = tempdir()?;
        fs::create_dir_all(source.path().join("nested"))?;
        fs::write(source.path().join("top.txt"), b"top")?;
        fs::write(source.path().join("nested").join("inner.txt"), b"inner")?;

        let bytes = create_archive_to_buffer(source.path())?;

        let dest = tempdir()?;
        unpack_buffer(&bytes, dest.path())?;

        assert_eq!(fs::read(dest.path().join("top.txt"))?, b"top");
        assert_eq!(fs::read(dest.path().join("nested").join("inner.txt"))?, b"inner");
        Ok(())
    }
}
