use crate::archive::format::{ArchiveOptions, Compression, Entry, EntryKind, OpenMode, SymlinkPolicy};
use crate::archive::session::{Backing, Session};
use crate::archive::{unpack, walk};
use crate::error::{ArchiveError, ErrorCode, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Owned handle over one ZIP archive session
///
/// A handle is move-only: exactly one owner can finalize or discard the
/// session. Dropping a handle that was neither finalized nor discarded
/// discards it.
pub struct ArchiveHandle {
    backing: Backing,
    mode: OpenMode,
    options: ArchiveOptions,
    session: Option<Session>,
}

impl ArchiveHandle {
    /// Start a new, empty in-memory archive
    pub fn in_memory() -> Self {
        debug!("created in-memory archive");
        Self {
            backing: Backing::Memory(Arc::from(Vec::new())),
            mode: OpenMode::Truncate,
            options: ArchiveOptions::default(),
            session: Some(Session::empty()),
        }
    }

    /// Open an archive held in memory
    ///
    /// The bytes are copied; finalizing after adding entries produces a new
    /// buffer, available through [`ArchiveHandle::finalize_to_buffer`].
    pub fn from_buffer(bytes: &[u8]) -> Result<Self> {
        let bytes: Arc<[u8]> = Arc::from(bytes);
        let session = Session::open_buffer(bytes.clone())?;
        debug!(
            bytes = bytes.len(),
            entries = session.entry_count(),
            "opened in-memory archive"
        );

        Ok(Self {
            backing: Backing::Memory(bytes),
            mode: OpenMode::Create,
            options: ArchiveOptions::default(),
            session: Some(session),
        })
    }

    /// Open or create an archive file
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let session = Session::open_file(path, mode)?;
        debug!(
            path = %path.display(),
            ?mode,
            entries = session.entry_count(),
            "opened archive"
        );

        Ok(Self {
            backing: Backing::File(path.to_path_buf()),
            mode,
            options: ArchiveOptions::default(),
            session: Some(session),
        })
    }

    /// Replace all options
    pub fn with_options(mut self, options: ArchiveOptions) -> Self {
        self.options = options;
        self
    }

    /// Compression for entries added from now on
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.options.compression = compression;
        self
    }

    /// How `add_directory` treats symbolic links
    pub fn with_symlink_policy(mut self, policy: SymlinkPolicy) -> Self {
        self.options.symlinks = policy;
        self
    }

    /// Visit directory children in file-name order
    pub fn with_sorted_traversal(mut self, sorted: bool) -> Self {
        self.options.sorted = sorted;
        self
    }

    /// Options applied to entries added through this handle
    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// Mode the archive was opened with
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Whether the session is still live (not finalized or discarded)
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Path of the backing file, `None` for in-memory archives
    pub fn path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::File(path) => Some(path.as_path()),
            Backing::Memory(_) => None,
        }
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(ArchiveError::Closed)
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(ArchiveError::Closed)
    }

    /// Register a directory entry; the stored name ends with `/`
    ///
    /// Parent directories are not created.
    pub fn create_directory(&mut self, path: &str) -> Result<()> {
        self.session_mut()?.add_directory_entry(path)
    }

    /// Add the file at `source_path` under `archive_path`
    ///
    /// The file must be readable now; its bytes are streamed in at finalize.
    pub fn add_file<P: AsRef<Path>>(&mut self, source_path: P, archive_path: &str) -> Result<()> {
        self.session_mut()?
            .add_file_entry(archive_path, source_path.as_ref())
    }

    /// Recursively add the directory tree at `source_path` under `archive_path`
    ///
    /// An empty `archive_path` places the tree's contents at the archive root.
    /// On failure, entries staged before the error stay staged.
    pub fn add_directory<P: AsRef<Path>>(&mut self, source_path: P, archive_path: &str) -> Result<()> {
        self.session()?;
        walk::add_tree(self, source_path.as_ref(), archive_path)
    }

    /// Write all pending entries to the backing store and close the session
    ///
    /// The session is closed even if writing fails. Calling this again is a no-op.
    pub fn finalize(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => session.finalize(&mut self.backing, &self.options),
            None => Ok(()),
        }
    }

    /// Finalize, then return the complete archive bytes
    pub fn finalize_to_buffer(&mut self) -> Result<Vec<u8>> {
        self.finalize()?;
        match &self.backing {
            Backing::Memory(bytes) => Ok(bytes.to_vec()),
            Backing::File(path) => Ok(fs::read(path)?),
        }
    }

    /// Close the session without writing anything. Idempotent.
    pub fn discard(&mut self) {
        if self.session.take().is_some() {
            debug!("discarded archive session");
        }
    }

    /// All entries of the live session, in session order
    pub fn get_entries(&self) -> Result<Vec<Entry>> {
        Ok(self.session()?.entries())
    }

    /// Full decompressed contents of `entry`; directories yield no bytes
    ///
    /// Entries from a finalized or discarded session are stale and fail with
    /// [`ArchiveError::EntryRead`].
    pub fn get_file_contents(&mut self, entry: &Entry) -> Result<Vec<u8>> {
        match self.session.as_mut() {
            Some(session) => session.read_entry(entry.index),
            None => Err(ArchiveError::EntryRead {
                index: entry.index,
                code: ErrorCode::Invalid,
                message: "session closed".to_string(),
            }),
        }
    }

    /// Extract every entry below `destination`, creating it if needed
    pub fn unpack_to<P: AsRef<Path>>(&mut self, destination: P) -> Result<()> {
        let destination = destination.as_ref();
        let entries = self.get_entries()?;

        // Resolve every target first so a hostile name aborts before anything is written
        let targets = entries
            .iter()
            .map(|entry| unpack::entry_destination(destination, entry))
            .collect::<Result<Vec<_>>>()?;

        fs::create_dir_all(destination)?;
        debug!(
            destination = %destination.display(),
            entries = entries.len(),
            "unpacking archive"
        );

        for (entry, target) in entries.iter().zip(&targets) {
            match entry.kind {
                EntryKind::Directory => fs::create_dir_all(target)?,
                EntryKind::File => {
                    let contents = self.get_file_contents(entry)?;
                    unpack::write_file(target, &contents)?;
                }
            }
            trace!(entry = %entry.path, "extracted");
        }

        Ok(())
    }
}

impl Drop for ArchiveHandle {
    fn drop(&mut self) {
        self.discard();
    }
}
