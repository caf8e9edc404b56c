//! Building archives.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::cipher;
use crate::compression;
use crate::error::{PakError, PakResult};
use crate::format::{CURRENT_VERSION, ENTRY_SIZE, EntryRecord, HEADER_SIZE_V2, PakFlags, PakHeader};

enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Empty,
}

struct PendingFile {
    name: String,
    source: FileSource,
}

/// Summary of a written archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    /// Number of entries written.
    pub files: usize,
    /// Sum of uncompressed sizes.
    pub total_size: u64,
    /// Sum of stored sizes.
    pub stored_size: u64,
}

/// Accumulates files and writes them as a version 2 archive.
///
/// # Example
///
/// ```no_run
/// use quarry_pak::PakWriter;
///
/// let mut writer = PakWriter::new();
/// writer.add_bytes("a.txt", b"hello".to_vec());
/// writer.encrypt("k1", true);
/// writer.write("data.pak").unwrap();
/// ```
pub struct PakWriter {
    files: Vec<PendingFile>,
    flags: PakFlags,
    key: String,
    compress: bool,
    full_path: bool,
    custom_data: Vec<u8>,
}

impl Default for PakWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PakWriter {
    /// Create a writer that compresses payloads and does not encrypt.
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            flags: PakFlags::empty(),
            key: String::new(),
            compress: true,
            full_path: false,
            custom_data: Vec::new(),
        }
    }

    /// Name files added with [`add_file`](Self::add_file) by their full path
    /// instead of their file name.
    pub fn with_full_path(mut self, full_path: bool) -> Self {
        self.full_path = full_path;
        self
    }

    /// Add a file from disk. Its contents are read when the archive is written.
    pub fn add_file(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let name = if self.full_path {
            path.to_string_lossy().replace('\\', "/")
        } else {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        self.add_file_as(path, name);
    }

    /// Add a file from disk under an explicit entry name.
    pub fn add_file_as(&mut self, path: impl AsRef<Path>, name: impl Into<String>) {
        self.files.push(PendingFile {
            name: name.into(),
            source: FileSource::Path(path.as_ref().to_path_buf()),
        });
    }

    /// Add in-memory contents.
    pub fn add_bytes(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.push(PendingFile {
            name: name.into(),
            source: FileSource::Bytes(bytes),
        });
    }

    /// Add a zero-length entry.
    pub fn add_empty(&mut self, name: impl Into<String>) {
        self.files.push(PendingFile {
            name: name.into(),
            source: FileSource::Empty,
        });
    }

    /// Enable or disable payload compression (enabled by default).
    pub fn set_compress(&mut self, compress: bool) {
        self.compress = compress;
    }

    /// Encrypt the entry table, and the payloads too when `full` is set.
    pub fn encrypt(&mut self, key: impl Into<String>, full: bool) {
        self.key = key.into();
        self.flags = if full {
            PakFlags::ENCRYPTED | PakFlags::FULL_ENCRYPTED
        } else {
            PakFlags::ENCRYPTED
        };
    }

    /// Set the consumer-defined data written after the header.
    pub fn set_custom_data(&mut self, data: Vec<u8>) {
        self.custom_data = data;
    }

    /// Number of files queued.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no files are queued.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write the archive to `path`.
    ///
    /// Payloads are streamed after a reserved entry table region, which is
    /// filled in (and encrypted, if requested) once all offsets are known.
    pub fn write(&self, path: impl AsRef<Path>) -> PakResult<WriteStats> {
        let path = path.as_ref();
        if self.flags.contains(PakFlags::ENCRYPTED) && self.key.is_empty() {
            return Err(PakError::MissingKey);
        }
        for file in &self.files {
            if file.name.is_empty() || file.name.contains('\0') {
                return Err(PakError::InvalidName {
                    name: file.name.clone(),
                });
            }
        }

        // layout
        let entries_offset = HEADER_SIZE_V2 + self.custom_data.len();
        let records_len = self.files.len() * ENTRY_SIZE;
        let mut name_offsets = Vec::with_capacity(self.files.len());
        let mut table_size = records_len;
        for file in &self.files {
            name_offsets.push(to_u32(table_size)?);
            table_size += file.name.len() + 1;
        }
        let data_offset = entries_offset + table_size;

        let header = PakHeader {
            version: CURRENT_VERSION,
            flags: self.flags,
            file_count: to_u32(self.files.len())?,
            table_size: to_u32(table_size)?,
            custom_data_size: to_u32(self.custom_data.len())?,
        };

        let out = File::create(path).map_err(PakError::io(path))?;
        let mut out = BufWriter::new(out);
        out.write_all(&header.to_bytes()).map_err(PakError::io(path))?;
        out.write_all(&self.custom_data).map_err(PakError::io(path))?;
        out.write_all(&vec![0u8; table_size]).map_err(PakError::io(path))?;

        // data
        let mut stats = WriteStats {
            files: self.files.len(),
            total_size: 0,
            stored_size: 0,
        };
        let mut records = Vec::with_capacity(self.files.len());
        let mut offset = data_offset;
        for (file, name_offset) in self.files.iter().zip(name_offsets) {
            let bytes = match &file.source {
                FileSource::Path(source) => std::fs::read(source).map_err(PakError::io(source))?,
                FileSource::Bytes(bytes) => bytes.clone(),
                FileSource::Empty => Vec::new(),
            };
            let size = bytes.len();

            let mut stored = if self.compress {
                compression::try_compress(&bytes).unwrap_or(bytes)
            } else {
                bytes
            };
            if self.flags.contains(PakFlags::FULL_ENCRYPTED) {
                cipher::crypt(&mut stored, self.key.as_bytes());
            }
            out.write_all(&stored).map_err(PakError::io(path))?;

            records.push(EntryRecord {
                name_offset,
                size: to_u32(size)?,
                stored_size: to_u32(stored.len())?,
                data_offset: to_u32(offset)?,
            });
            offset += stored.len();
            stats.total_size += size as u64;
            stats.stored_size += stored.len() as u64;
        }
        to_u32(offset)?;

        // entry table
        let mut table = Vec::with_capacity(table_size);
        for record in &records {
            record.encode_into(&mut table);
        }
        for file in &self.files {
            table.extend_from_slice(file.name.as_bytes());
            table.push(0);
        }
        debug_assert_eq!(table.len(), table_size);
        if self.flags.contains(PakFlags::ENCRYPTED) {
            cipher::crypt(&mut table, self.key.as_bytes());
        }

        out.seek(SeekFrom::Start(entries_offset as u64))
            .map_err(PakError::io(path))?;
        out.write_all(&table).map_err(PakError::io(path))?;
        out.flush().map_err(PakError::io(path))?;

        tracing::debug!(
            "Wrote pak '{}' ({} files, {} -> {} bytes)",
            path.display(),
            stats.files,
            stats.total_size,
            stats.stored_size
        );
        Ok(stats)
    }
}

fn to_u32(value: usize) -> PakResult<u32> {
    u32::try_from(value).map_err(|_| PakError::TooLarge)
}
