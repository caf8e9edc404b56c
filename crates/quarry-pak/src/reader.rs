//! Opening archives and reading entries.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use quarry_core::profiling::profile_function;

use crate::cipher;
use crate::compression;
use crate::error::{PakError, PakResult};
use crate::format::{ENTRY_SIZE, EntryRecord, PakFlags, PakHeader, read_exact, resolve_name};

/// One file stored in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PakEntry {
    /// Entry name as stored in the names block.
    pub name: String,
    /// Uncompressed size.
    pub size: u32,
    /// Size of the bytes on disk.
    pub stored_size: u32,
    /// Absolute offset of the payload.
    pub data_offset: u32,
}

impl PakEntry {
    /// Whether the payload is stored compressed.
    pub fn is_compressed(&self) -> bool {
        self.stored_size != self.size
    }
}

/// An opened archive.
///
/// The entry table is parsed and validated eagerly; payloads are read on demand.
#[derive(Debug)]
pub struct Pak {
    path: PathBuf,
    file: File,
    file_size: u64,
    version: u8,
    flags: PakFlags,
    key: Option<Vec<u8>>,
    custom_data: Vec<u8>,
    entries: Vec<PakEntry>,
}

impl Pak {
    /// Open an archive, decrypting its entry table with `key` when required.
    ///
    /// Every entry is checked against the archive size before this returns, so
    /// a successfully opened archive never points outside its file.
    pub fn open(path: impl AsRef<Path>, key: Option<&str>) -> PakResult<Self> {
        profile_function!();
        let path = path.as_ref();
        Self::open_inner(path, key).map_err(|e| e.with_path(path))
    }

    fn open_inner(path: &Path, key: Option<&str>) -> PakResult<Self> {
        let file = File::open(path).map_err(PakError::io(path))?;
        let file_size = file.metadata().map_err(PakError::io(path))?.len();
        let mut reader = BufReader::new(file);

        let header = PakHeader::read(&mut reader)?;
        let key = key.filter(|k| !k.is_empty()).map(|k| k.as_bytes().to_vec());
        if header.flags.contains(PakFlags::ENCRYPTED) && key.is_none() {
            return Err(PakError::MissingKey);
        }

        let prefix = header.encoded_len() as u64 + header.custom_data_size as u64;
        if prefix > file_size {
            return Err(PakError::Truncated { what: "custom data" });
        }
        let mut custom_data = vec![0u8; header.custom_data_size as usize];
        read_exact(&mut reader, &mut custom_data, "custom data")?;

        let count = header.file_count as usize;
        let records_len = count
            .checked_mul(ENTRY_SIZE)
            .ok_or(PakError::Truncated { what: "files table" })?;
        let table_size = header.table_size as usize;
        if table_size < records_len || prefix + table_size as u64 > file_size {
            return Err(PakError::Truncated { what: "files table" });
        }
        let mut table = vec![0u8; table_size];
        read_exact(&mut reader, &mut table, "files table")?;
        if header.flags.contains(PakFlags::ENCRYPTED)
            && let Some(key) = &key
        {
            cipher::crypt(&mut table, key);
        }

        let mut remaining = file_size as i64 - prefix as i64 - table_size as i64;
        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let record = EntryRecord::decode(&table, index);
            let name = resolve_name(&table, records_len, record.name_offset, index)?;

            remaining -= record.stored_size as i64;
            if remaining < 0 {
                return Err(PakError::BrokenEntry {
                    index,
                    reason: format!("broken file size {}", record.stored_size),
                });
            }
            if record.data_offset as u64 + record.stored_size as u64 > file_size {
                return Err(PakError::BrokenEntry {
                    index,
                    reason: format!(
                        "invalid offset {} (pak size {})",
                        record.data_offset, file_size
                    ),
                });
            }
            if record.stored_size == 0 && record.size != 0 {
                return Err(PakError::BrokenEntry {
                    index,
                    reason: "empty payload for non-empty file".to_string(),
                });
            }

            entries.push(PakEntry {
                name,
                size: record.size,
                stored_size: record.stored_size,
                data_offset: record.data_offset,
            });
        }

        tracing::info!(
            "Opened pak '{}' (version {}, {} files, flags {:?})",
            path.display(),
            header.version,
            entries.len(),
            header.flags
        );
        if header.flags.contains(PakFlags::ENCRYPTED) {
            tracing::warn!(
                "Pak '{}' is encrypted; a wrong key is only detected when entries fail to decode",
                path.display()
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: reader.into_inner(),
            file_size,
            version: header.version,
            flags: header.flags,
            key,
            custom_data,
            entries,
        })
    }

    /// Read, decrypt and decompress the payload of entry `index`.
    pub fn read_entry(&mut self, index: usize) -> PakResult<Vec<u8>> {
        profile_function!();
        let entry = self.entries.get(index).ok_or(PakError::EntryOutOfRange {
            index,
            count: self.entries.len(),
        })?;
        if entry.stored_size == 0 {
            return Ok(Vec::new());
        }

        let mut stored = vec![0u8; entry.stored_size as usize];
        self.file
            .seek(SeekFrom::Start(entry.data_offset as u64))
            .map_err(PakError::io(&self.path))?;
        self.file
            .read_exact(&mut stored)
            .map_err(PakError::io(&self.path))?;

        if self.flags.contains(PakFlags::FULL_ENCRYPTED)
            && let Some(key) = &self.key
        {
            cipher::crypt(&mut stored, key);
        }

        if entry.is_compressed() {
            compression::decompress(&stored, entry.size as usize)
                .map_err(|message| PakError::Decompress { index, message })
        } else {
            Ok(stored)
        }
    }

    /// Find an entry index by name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Get an entry by index.
    pub fn entry(&self, index: usize) -> Option<&PakEntry> {
        self.entries.get(index)
    }

    /// All entries in table order.
    pub fn entries(&self) -> &[PakEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path the archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total archive size in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Format version (1 or 2).
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Header flags.
    pub fn flags(&self) -> PakFlags {
        self.flags
    }

    /// Whether the entry table is encrypted.
    pub fn is_table_encrypted(&self) -> bool {
        self.flags.contains(PakFlags::ENCRYPTED)
    }

    /// Whether payloads are encrypted.
    pub fn is_content_encrypted(&self) -> bool {
        self.flags.contains(PakFlags::FULL_ENCRYPTED)
    }

    /// Consumer-defined data stored after a version 2 header.
    pub fn custom_data(&self) -> &[u8] {
        &self.custom_data
    }
}
