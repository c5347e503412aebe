mod format;
mod handle;
mod session;
mod unpack;
mod walk;

pub use format::{
    ArchiveOptions, Compression, Entry, EntryKind, OpenMode, SymlinkPolicy, PATH_SEPARATOR,
};
pub use handle::ArchiveHandle;
