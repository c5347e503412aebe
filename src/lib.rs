//! ziptree: directory-tree packing and unpacking over ZIP archives
//!
//! ZIP parsing, compression and checksums come from the `zip` crate. This
//! library adds:
//! - An owned, move-only [`ArchiveHandle`] over one archive session, backed by
//!   a file or an in-memory buffer
//! - Recursive packing of a directory tree and extraction back to disk
//! - Typed errors carrying a numeric engine [`ErrorCode`]
//!
//! # Example
//!
//! ```no_run
//! use ziptree::{ArchiveHandle, OpenMode};
//!
//! // Build an archive in memory
//! let mut zip = ArchiveHandle::in_memory();
//! zip.create_directory("docs")?;
//! zip.add_directory("path/to/tree", "")?;
//! let bytes = zip.finalize_to_buffer()?;
//!
//! // Reopen it and list the entries
//! let reopened = ArchiveHandle::from_buffer(&bytes)?;
//! for entry in reopened.get_entries()? {
//!     println!("{:?} {}", entry.kind, entry.path);
//! }
//!
//! // Or work with files directly
//! ziptree::create_archive("path/to/tree", "tree.zip")?;
//! let mut zip = ArchiveHandle::open("tree.zip", OpenMode::Read)?;
//! zip.unpack_to("unpacked")?;
//! # Ok::<(), ziptree::ArchiveError>(())
//! ```

// Core modules
pub mod archive;
pub mod error;
pub mod ops;

// Re-export commonly used types
pub use archive::{
    ArchiveHandle, ArchiveOptions, Compression, Entry, EntryKind, OpenMode, SymlinkPolicy,
    PATH_SEPARATOR,
};
pub use error::{ArchiveError, ErrorCode, Result};
pub use ops::{
    create_archive, create_archive_from_buffer, create_archive_from_path, create_archive_in_memory,
    create_archive_to_buffer, unpack_archive, unpack_buffer,
};
