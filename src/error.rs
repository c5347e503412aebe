use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use zip::result::ZipError;

/// Result type for ziptree operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Numeric archive engine error codes
///
/// The numbering follows the classic zip engine codes so that a code logged by
/// one tool means the same thing in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Read = 5,
    Write = 6,
    Crc = 7,
    NoSuchFile = 9,
    Exists = 10,
    Open = 11,
    Temp = 12,
    CompressionUnsupported = 16,
    Invalid = 18,
    NotZip = 19,
    Inconsistent = 21,
    ReadOnly = 25,
    Encrypted = 27,
}

impl ErrorCode {
    /// Raw numeric value of the code
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Short human readable description
    pub fn description(self) -> &'static str {
        match self {
            Self::Read => "read error",
            Self::Write => "write error",
            Self::Crc => "CRC error",
            Self::NoSuchFile => "no such file",
            Self::Exists => "file already exists",
            Self::Open => "can't open file",
            Self::Temp => "failure to create temporary file",
            Self::CompressionUnsupported => "compression method not supported",
            Self::Invalid => "invalid argument",
            Self::NotZip => "not a zip archive",
            Self::Inconsistent => "zip archive inconsistent",
            Self::ReadOnly => "read-only archive",
            Self::Encrypted => "encryption method not supported",
        }
    }

    /// Classify an I/O failure, using `fallback` for kinds without a dedicated code
    pub fn from_io(err: &io::Error, fallback: ErrorCode) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NoSuchFile,
            io::ErrorKind::AlreadyExists => Self::Exists,
            io::ErrorKind::InvalidInput => Self::Invalid,
            io::ErrorKind::UnexpectedEof => Self::Inconsistent,
            io::ErrorKind::InvalidData if err.to_string().contains("checksum") => Self::Crc,
            _ => fallback,
        }
    }

    /// Classify an engine failure
    pub fn from_zip(err: &ZipError, fallback: ErrorCode) -> Self {
        match err {
            ZipError::Io(io_err) => Self::from_io(io_err, fallback),
            ZipError::InvalidArchive(_) => Self::NotZip,
            ZipError::UnsupportedArchive(msg) if *msg == ZipError::PASSWORD_REQUIRED => {
                Self::Encrypted
            }
            ZipError::UnsupportedArchive(_) => Self::CompressionUnsupported,
            ZipError::FileNotFound => Self::Invalid,
            #[allow(unreachable_patterns)]
            _ => fallback,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error {} ({})", self.as_i32(), self.description())
    }
}

/// Unified error type for all archive operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to open archive: {message}: {code}")]
    Open { code: ErrorCode, message: String },

    #[error("Failed to open entry source {}: {code}", path.display())]
    EntrySource {
        path: PathBuf,
        code: ErrorCode,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read entry {index}: {message}: {code}")]
    EntryRead {
        index: usize,
        code: ErrorCode,
        message: String,
    },

    #[error("Failed to write archive: {message}: {code}")]
    Write { code: ErrorCode, message: String },

    #[error("Failed to add entry '{name}': {code}")]
    EntryAdd { name: String, code: ErrorCode },

    #[error("Archive session is closed")]
    Closed,

    #[error("Entry path escapes the destination directory: {0}")]
    UnsafePath(String),

    #[error("Invalid archive options: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ArchiveError {
    /// Engine error code carried by this error, if any
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Open { code, .. }
            | Self::EntrySource { code, .. }
            | Self::EntryRead { code, .. }
            | Self::Write { code, .. }
            | Self::EntryAdd { code, .. } => Some(*code),
            Self::Io(err) => Some(ErrorCode::from_io(err, ErrorCode::Write)),
            Self::Closed | Self::UnsafePath(_) | Self::Config(_) => None,
        }
    }

    pub(crate) fn open(err: &ZipError, message: impl Into<String>) -> Self {
        Self::Open {
            code: ErrorCode::from_zip(err, ErrorCode::Open),
            message: message.into(),
        }
    }

    pub(crate) fn open_io(err: &io::Error, message: impl Into<String>) -> Self {
        Self::Open {
            code: ErrorCode::from_io(err, ErrorCode::Open),
            message: message.into(),
        }
    }

    pub(crate) fn write(err: &ZipError, message: impl Into<String>) -> Self {
        Self::Write {
            code: ErrorCode::from_zip(err, ErrorCode::Write),
            message: message.into(),
        }
    }

    pub(crate) fn write_io(err: &io::Error, message: impl Into<String>) -> Self {
        Self::Write {
            code: ErrorCode::from_io(err, ErrorCode::Write),
            message: message.into(),
        }
    }

    pub(crate) fn entry_source(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::EntrySource {
            path: path.into(),
            code: ErrorCode::from_io(&source, ErrorCode::Open),
            source,
        }
    }
}

impl From<toml::de::Error> for ArchiveError {
    fn from(err: toml::de::Error) -> Self {
        ArchiveError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ArchiveError {
    fn from(err: toml::ser::Error) -> Self {
        ArchiveError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_keep_engine_numbering() {
        assert_eq!(ErrorCode::NoSuchFile.as_i32(), 9);
        assert_eq!(ErrorCode::Exists.as_i32(), 10);
        assert_eq!(ErrorCode::NotZip.as_i32(), 19);
        assert_eq!(ErrorCode::ReadOnly.as_i32(), 25);
    }

    #[test]
    fn test_io_classification() {
        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(
            ErrorCode::from_io(&missing, ErrorCode::Open),
            ErrorCode::NoSuchFile
        );

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(ErrorCode::from_io(&denied, ErrorCode::Write), ErrorCode::Write);
    }

    #[test]
    fn test_checksum_failure_is_crc() {
        let bad_crc = io::Error::new(io::ErrorKind::InvalidData, "Invalid checksum");
        assert_eq!(ErrorCode::from_io(&bad_crc, ErrorCode::Read), ErrorCode::Crc);

        let corrupt = io::Error::new(io::ErrorKind::InvalidData, "corrupt deflate stream");
        assert_eq!(ErrorCode::from_io(&corrupt, ErrorCode::Read), ErrorCode::Read);
    }

    #[test]
    fn test_zip_classification() {
        let err = ZipError::FileNotFound;
        assert_eq!(ErrorCode::from_zip(&err, ErrorCode::Read), ErrorCode::Invalid);

        let err = ZipError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(
            ErrorCode::from_zip(&err, ErrorCode::Read),
            ErrorCode::NoSuchFile
        );
    }

    #[test]
    fn test_open_error_message_keeps_code() {
        let err = ArchiveError::Open {
            code: ErrorCode::NoSuchFile,
            message: "Failed to open ZIP file".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("error 9"));
        assert!(msg.contains("Failed to open ZIP file"));
        assert_eq!(err.code(), Some(ErrorCode::NoSuchFile));
    }

    #[test]
    fn test_closed_has_no_code() {
        assert_eq!(ArchiveError::Closed.code(), None);
    }
}
