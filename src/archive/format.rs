use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Separator used for entry names inside an archive
pub const PATH_SEPARATOR: char = '/';

/// Extensions of formats that are already compressed and gain nothing from deflate
const PRECOMPRESSED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "mp3", "mp4", "ogg", "zip", "gz", "bz2", "xz", "zst",
    "7z", "rar",
];

/// Normalize path to forward slashes (cross-platform compatibility)
pub(crate) fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// How an archive is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Archive must exist; mutations are rejected
    #[default]
    Read,
    /// Open an existing archive or start a new one if the path is absent
    Create,
    /// Start a new archive, replacing any existing file at finalize
    Truncate,
    /// Start a new archive; fails if the path already exists
    Exclusive,
}

impl OpenMode {
    /// Whether entries may be added in this mode
    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Read)
    }
}

/// Compression applied to entries added in this session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    Stored,
    Deflated,
    /// Store already-compressed formats, deflate everything else
    #[default]
    Auto,
}

impl Compression {
    /// Resolve to the engine's method for an entry name
    pub(crate) fn method_for(self, name: &str) -> zip::CompressionMethod {
        match self {
            Self::Stored => zip::CompressionMethod::Stored,
            Self::Deflated => zip::CompressionMethod::Deflated,
            Self::Auto => {
                let file_name = name.rsplit(PATH_SEPARATOR).next().unwrap_or(name);
                let extension = match file_name.rsplit_once('.') {
                    Some((_, ext)) => ext.to_lowercase(),
                    None => String::new(),
                };

                if PRECOMPRESSED_EXTENSIONS.contains(&extension.as_str()) {
                    zip::CompressionMethod::Stored
                } else {
                    zip::CompressionMethod::Deflated
                }
            }
        }
    }
}

/// What `add_directory` does when it meets a symbolic link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymlinkPolicy {
    /// Leave the link out of the archive
    #[default]
    Skip,
    /// Archive whatever the link points to
    Follow,
    /// Abort the walk with an entry source error
    Error,
}

/// Options controlling how a handle writes entries and walks directories
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveOptions {
    pub compression: Compression,
    pub compression_level: Option<i64>,
    pub symlinks: SymlinkPolicy,
    /// Visit directory children in file-name order instead of listing order
    pub sorted: bool,
}

impl ArchiveOptions {
    /// Parse options from TOML
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Serialize options to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Engine options for an entry with the given archive name and size
    pub(crate) fn file_options(&self, name: &str, size: u64) -> zip::write::SimpleFileOptions {
        let method = self.compression.method_for(name);
        let level = match method {
            zip::CompressionMethod::Stored => None,
            _ => self.compression_level,
        };

        zip::write::SimpleFileOptions::default()
            .compression_method(method)
            .compression_level(level)
            .large_file(size >= u64::from(u32::MAX))
    }
}

/// Kind of an archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    File,
}

/// Read-only view of one entry in an open session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    /// Slash separated path relative to the archive root
    pub path: String,
    /// Position in the session that produced this entry
    pub index: usize,
}

impl Entry {
    pub(crate) fn new(path: String, index: usize) -> Self {
        let kind = if path.ends_with(PATH_SEPARATOR) {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Self { kind, path, index }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_follows_trailing_separator() {
        assert_eq!(Entry::new("stuff/".into(), 0).kind, EntryKind::Directory);
        assert_eq!(Entry::new("stuff".into(), 0).kind, EntryKind::File);
        assert_eq!(Entry::new("a/b.txt".into(), 3).kind, EntryKind::File);
    }

    #[test]
    fn test_auto_compression() {
        let auto = Compression::Auto;
        assert_eq!(auto.method_for("photo.JPG"), zip::CompressionMethod::Stored);
        assert_eq!(auto.method_for("a/b/c.tar.gz"), zip::CompressionMethod::Stored);
        assert_eq!(auto.method_for("notes.txt"), zip::CompressionMethod::Deflated);
        assert_eq!(auto.method_for("Makefile"), zip::CompressionMethod::Deflated);
        assert_eq!(auto.method_for("dir.zip/readme"), zip::CompressionMethod::Deflated);
    }

    #[test]
    fn test_fixed_compression() {
        assert_eq!(
            Compression::Stored.method_for("notes.txt"),
            zip::CompressionMethod::Stored
        );
        assert_eq!(
            Compression::Deflated.method_for("photo.png"),
            zip::CompressionMethod::Deflated
        );
    }

    #[test]
    fn test_options_toml_roundtrip() -> Result<()> {
        let options = ArchiveOptions {
            compression: Compression::Deflated,
            compression_level: Some(9),
            symlinks: SymlinkPolicy::Follow,
            sorted: true,
        };

        let text = options.to_toml_string()?;
        assert!(text.contains("compression = \"deflated\""));
        assert_eq!(ArchiveOptions::from_toml_str(&text)?, options);
        Ok(())
    }

    #[test]
    fn test_options_toml_defaults() -> Result<()> {
        let options = ArchiveOptions::from_toml_str("sorted = true\n")?;
        assert!(options.sorted);
        assert_eq!(options.compression, Compression::Auto);
        assert_eq!(options.symlinks, SymlinkPolicy::Skip);
        Ok(())
    }

    #[test]
    fn test_options_toml_rejects_unknown_policy() {
        let result = ArchiveOptions::from_toml_str("symlinks = \"maybe\"\n");
        assert!(matches!(result, Err(crate::error::ArchiveError::Config(_))));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a\\b\\c.txt"), "a/b/c.txt");
        assert_eq!(normalize_path("a/b"), "a/b");
    }
}
