use crate::archive::format::{normalize_path, ArchiveOptions, Entry, OpenMode, PATH_SEPARATOR};
use crate::error::{ArchiveError, ErrorCode, Result};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, trace};
use zip::{ZipArchive, ZipWriter};

/// Upper bound on the read buffer reserved from an entry's declared size
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Where a finalized archive lives
#[derive(Debug)]
pub(crate) enum Backing {
    Memory(Arc<[u8]>),
    File(PathBuf),
}

/// Byte source the engine reads an existing archive from
enum SourceReader {
    File(BufReader<File>),
    Memory(Cursor<Arc<[u8]>>),
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::File(reader) => reader.read(buf),
            Self::Memory(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for SourceReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::File(reader) => reader.seek(pos),
            Self::Memory(cursor) => cursor.seek(pos),
        }
    }
}

enum StagedKind {
    Directory,
    File { source: PathBuf, size: u64 },
}

/// Entry added during this session and written at finalize
struct StagedEntry {
    name: String,
    kind: StagedKind,
}

/// One live archive session: the archive as opened plus staged additions
pub(crate) struct Session {
    existing: Option<ZipArchive<SourceReader>>,
    staged: Vec<StagedEntry>,
    names: HashSet<String>,
    writable: bool,
    /// Backing store already holds exactly the opened archive
    committed: bool,
}

impl Session {
    /// Fresh session with no entries; finalize always writes it out
    pub(crate) fn empty() -> Self {
        Self {
            existing: None,
            staged: Vec::new(),
            names: HashSet::new(),
            writable: true,
            committed: false,
        }
    }

    pub(crate) fn open_buffer(bytes: Arc<[u8]>) -> Result<Self> {
        let archive = ZipArchive::new(SourceReader::Memory(Cursor::new(bytes)))
            .map_err(|e| ArchiveError::open(&e, "Failed to load in-memory ZIP file"))?;
        Ok(Self::from_archive(archive, true))
    }

    pub(crate) fn open_file(path: &Path, mode: OpenMode) -> Result<Self> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => Some(metadata),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(ArchiveError::open_io(&e, "Failed to open ZIP file")),
        };

        match (mode, metadata) {
            (OpenMode::Read, None) => Err(ArchiveError::Open {
                code: ErrorCode::NoSuchFile,
                message: format!("Failed to open ZIP file {}", path.display()),
            }),
            (OpenMode::Exclusive, Some(_)) => Err(ArchiveError::Open {
                code: ErrorCode::Exists,
                message: format!("Failed to create ZIP file {}", path.display()),
            }),
            (OpenMode::Truncate | OpenMode::Exclusive, _) | (OpenMode::Create, None) => {
                Ok(Self::empty())
            }
            (OpenMode::Create, Some(metadata)) if metadata.len() == 0 => Ok(Self::empty()),
            (OpenMode::Read | OpenMode::Create, Some(_)) => {
                let file = File::open(path)
                    .map_err(|e| ArchiveError::open_io(&e, "Failed to open ZIP file"))?;
                let archive = ZipArchive::new(SourceReader::File(BufReader::new(file)))
                    .map_err(|e| ArchiveError::open(&e, "Failed to open ZIP file"))?;
                Ok(Self::from_archive(archive, mode.is_writable()))
            }
        }
    }

    fn from_archive(archive: ZipArchive<SourceReader>, writable: bool) -> Self {
        let names = archive.file_names().map(str::to_owned).collect();
        Self {
            existing: Some(archive),
            staged: Vec::new(),
            names,
            writable,
            committed: true,
        }
    }

    fn existing_len(&self) -> usize {
        self.existing.as_ref().map_or(0, |archive| archive.len())
    }

    pub(crate) fn entry_count(&self) -> usize {
        self.existing_len() + self.staged.len()
    }

    pub(crate) fn entry_name(&self, index: usize) -> Option<&str> {
        let existing_len = self.existing_len();
        if index < existing_len {
            self.existing.as_ref()?.name_for_index(index)
        } else {
            self.staged
                .get(index - existing_len)
                .map(|entry| entry.name.as_str())
        }
    }

    pub(crate) fn entries(&self) -> Vec<Entry> {
        (0..self.entry_count())
            .filter_map(|index| {
                self.entry_name(index)
                    .map(|name| Entry::new(name.to_owned(), index))
            })
            .collect()
    }

    fn ensure_writable(&self, name: &str) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(ArchiveError::EntryAdd {
                name: name.to_string(),
                code: ErrorCode::ReadOnly,
            })
        }
    }

    fn stage(&mut self, name: String, kind: StagedKind) -> Result<()> {
        if !self.names.insert(name.clone()) {
            return Err(ArchiveError::EntryAdd {
                name,
                code: ErrorCode::Exists,
            });
        }
        trace!(entry = %name, "staged entry");
        self.staged.push(StagedEntry { name, kind });
        Ok(())
    }

    pub(crate) fn add_directory_entry(&mut self, path: &str) -> Result<()> {
        self.ensure_writable(path)?;

        let normalized = normalize_path(path);
        let trimmed = normalized.trim_end_matches(PATH_SEPARATOR);
        if trimmed.is_empty() {
            return Err(ArchiveError::EntryAdd {
                name: path.to_string(),
                code: ErrorCode::Invalid,
            });
        }

        self.stage(format!("{}{}", trimmed, PATH_SEPARATOR), StagedKind::Directory)
    }

    pub(crate) fn add_file_entry(&mut self, archive_path: &str, source: &Path) -> Result<()> {
        self.ensure_writable(archive_path)?;

        let name = normalize_path(archive_path);
        if name.is_empty() || name.ends_with(PATH_SEPARATOR) {
            return Err(ArchiveError::EntryAdd {
                name,
                code: ErrorCode::Invalid,
            });
        }

        // The source is streamed at finalize; open it now so a bad path fails here
        let file = File::open(source).map_err(|e| ArchiveError::entry_source(source, e))?;
        let size = file
            .metadata()
            .map_err(|e| ArchiveError::entry_source(source, e))?
            .len();

        self.stage(
            name,
            StagedKind::File {
                source: source.to_path_buf(),
                size,
            },
        )
    }

    pub(crate) fn read_entry(&mut self, index: usize) -> Result<Vec<u8>> {
        let existing_len = self.existing_len();

        if index < existing_len {
            let archive = self.existing.as_mut().ok_or(ArchiveError::Closed)?;
            let mut file = archive.by_index(index).map_err(|e| ArchiveError::EntryRead {
                index,
                code: ErrorCode::from_zip(&e, ErrorCode::Read),
                message: e.to_string(),
            })?;

            // Declared sizes come from the archive itself and may be hostile
            let mut contents = Vec::with_capacity(file.size().min(MAX_PREALLOCATION) as usize);
            file.read_to_end(&mut contents)
                .map_err(|e| ArchiveError::EntryRead {
                    index,
                    code: ErrorCode::from_io(&e, ErrorCode::Read),
                    message: e.to_string(),
                })?;
            return Ok(contents);
        }

        let entry = self
            .staged
            .get(index - existing_len)
            .ok_or_else(|| ArchiveError::EntryRead {
                index,
                code: ErrorCode::Invalid,
                message: format!("index out of range for {} entries", self.entry_count()),
            })?;

        match &entry.kind {
            StagedKind::Directory => Ok(Vec::new()),
            StagedKind::File { source, .. } => {
                fs::read(source).map_err(|e| ArchiveError::EntryRead {
                    index,
                    code: ErrorCode::from_io(&e, ErrorCode::Read),
                    message: format!("{}: {}", source.display(), e),
                })
            }
        }
    }

    /// Write the session to its backing store, consuming it
    pub(crate) fn finalize(self, backing: &mut Backing, options: &ArchiveOptions) -> Result<()> {
        if self.committed && self.staged.is_empty() {
            debug!("archive unchanged, nothing to write");
            return Ok(());
        }

        match backing {
            Backing::Memory(buffer) => {
                let cursor = self.write_archive(Cursor::new(Vec::new()), options)?;
                *buffer = cursor.into_inner().into();
                debug!(bytes = buffer.len(), "finalized in-memory archive");
            }
            Backing::File(path) => {
                let dir = match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    _ => Path::new("."),
                };
                let mut temp = NamedTempFile::new_in(dir).map_err(|e| ArchiveError::Write {
                    code: ErrorCode::Temp,
                    message: format!("Failed to create temporary file in {}: {}", dir.display(), e),
                })?;

                let mut sink = self.write_archive(BufWriter::new(temp.as_file_mut()), options)?;
                sink.flush()
                    .map_err(|e| ArchiveError::write_io(&e, "Failed to flush archive"))?;
                drop(sink);

                temp.persist(path.as_path()).map_err(|e| {
                    ArchiveError::write_io(&e.error, format!("Failed to replace {}", path.display()))
                })?;
                debug!(path = %path.display(), "finalized archive file");
            }
        }

        Ok(())
    }

    fn write_archive<W: Write + Seek>(self, sink: W, options: &ArchiveOptions) -> Result<W> {
        let mut writer = ZipWriter::new(sink);

        if let Some(mut archive) = self.existing {
            for index in 0..archive.len() {
                let file = archive
                    .by_index_raw(index)
                    .map_err(|e| ArchiveError::write(&e, "Failed to read existing entry"))?;
                writer
                    .raw_copy_file(file)
                    .map_err(|e| ArchiveError::write(&e, "Failed to copy existing entry"))?;
            }
        }

        for entry in self.staged {
            match entry.kind {
                StagedKind::Directory => {
                    writer
                        .add_directory(entry.name.as_str(), options.file_options(&entry.name, 0))
                        .map_err(|e| {
                            ArchiveError::write(&e, format!("Failed to add directory {}", entry.name))
                        })?;
                }
                StagedKind::File { source, size } => {
                    let mut input =
                        File::open(&source).map_err(|e| ArchiveError::entry_source(&source, e))?;
                    writer
                        .start_file(entry.name.as_str(), options.file_options(&entry.name, size))
                        .map_err(|e| {
                            ArchiveError::write(&e, format!("Failed to add file {}", entry.name))
                        })?;
                    io::copy(&mut input, &mut writer).map_err(|e| {
                        ArchiveError::write_io(&e, format!("Failed to compress {}", entry.name))
                    })?;
                }
            }
        }

        writer
            .finish()
            .map_err(|e| ArchiveError::write(&e, "Failed to write central directory"))
    }
}
