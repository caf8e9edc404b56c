//! On-disk layout of PAK archives.
//!
//! ```text
//! Header (little-endian):
//!   sign[3]          'P','A','K'
//!   version   u8     1 or 2
//!   flags     u32    bit0 Encrypted, bit1 FullEncrypted
//!   fileCount u32
//!   tableSize u32    bytes spanned by entries + names
//!   customSz  u32    version 2 only
//! [customSz bytes]   version 2 only
//! Entry table region (tableSize bytes, encrypted as one block when Encrypted):
//!   fileCount x { nameOffset u32, size u32, storedSize u32, dataOffset u32 }
//!   fileCount x NUL-terminated names
//! Payloads at absolute dataOffset, storedSize bytes each.
//! ```
//!
//! `nameOffset` is relative to the start of the entry table region, not the file.

use std::io::Read;

use bitflags::bitflags;

use crate::error::{PakError, PakResult};

/// Archive signature.
pub const SIGNATURE: [u8; 3] = *b"PAK";

/// Version written by [`PakWriter`](crate::PakWriter).
pub const CURRENT_VERSION: u8 = 2;

/// Header length of version 1 archives.
pub const HEADER_SIZE_V1: usize = 16;

/// Header length of version 2 archives (adds the custom data size).
pub const HEADER_SIZE_V2: usize = 20;

/// Size of one entry record in the entry table.
pub const ENTRY_SIZE: usize = 16;

bitflags! {
    /// Header flag bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PakFlags: u32 {
        /// The entry table region is encrypted.
        const ENCRYPTED = 0x01;
        /// Payloads are encrypted too. Only valid together with `ENCRYPTED`.
        const FULL_ENCRYPTED = 0x02;
    }
}

impl PakFlags {
    /// Check the invariant that content encryption implies table encryption.
    pub fn validate(self) -> PakResult<Self> {
        if self.contains(PakFlags::FULL_ENCRYPTED) && !self.contains(PakFlags::ENCRYPTED) {
            return Err(PakError::InvalidFlags(self.bits()));
        }
        Ok(self)
    }
}

/// Decoded archive header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PakHeader {
    pub version: u8,
    pub flags: PakFlags,
    pub file_count: u32,
    pub table_size: u32,
    pub custom_data_size: u32,
}

impl PakHeader {
    /// Byte length of this header on disk.
    pub fn encoded_len(&self) -> usize {
        if self.version >= 2 {
            HEADER_SIZE_V2
        } else {
            HEADER_SIZE_V1
        }
    }

    /// Read and validate a header.
    pub fn read(reader: &mut impl Read) -> PakResult<Self> {
        let mut buf = [0u8; HEADER_SIZE_V1];
        read_exact(reader, &mut buf, "header")?;

        let sign = [buf[0], buf[1], buf[2]];
        if sign != SIGNATURE {
            return Err(PakError::InvalidSignature(sign));
        }
        let version = buf[3];
        if version != 1 && version != 2 {
            return Err(PakError::UnsupportedVersion(version));
        }

        let flags = PakFlags::from_bits_retain(le_u32(&buf, 4)).validate()?;
        let file_count = le_u32(&buf, 8);
        let table_size = le_u32(&buf, 12);

        let custom_data_size = if version == 2 {
            let mut extra = [0u8; 4];
            read_exact(reader, &mut extra, "header")?;
            u32::from_le_bytes(extra)
        } else {
            0
        };

        Ok(Self {
            version,
            flags,
            file_count,
            table_size,
            custom_data_size,
        })
    }

    /// Encode as a version 2 header.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE_V2] {
        let mut buf = [0u8; HEADER_SIZE_V2];
        buf[..3].copy_from_slice(&SIGNATURE);
        buf[3] = CURRENT_VERSION;
        buf[4..8].copy_from_slice(&self.flags.bits().to_le_bytes());
        buf[8..12].copy_from_slice(&self.file_count.to_le_bytes());
        buf[12..16].copy_from_slice(&self.table_size.to_le_bytes());
        buf[16..20].copy_from_slice(&self.custom_data_size.to_le_bytes());
        buf
    }
}

/// One fixed-size record of the entry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryRecord {
    pub name_offset: u32,
    pub size: u32,
    pub stored_size: u32,
    pub data_offset: u32,
}

impl EntryRecord {
    /// Decode the record at `index` from a decrypted table region.
    pub fn decode(table: &[u8], index: usize) -> Self {
        let at = index * ENTRY_SIZE;
        Self {
            name_offset: le_u32(table, at),
            size: le_u32(table, at + 4),
            stored_size: le_u32(table, at + 8),
            data_offset: le_u32(table, at + 12),
        }
    }

    /// Append the encoded record.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.name_offset.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
        out.extend_from_slice(&self.stored_size.to_le_bytes());
        out.extend_from_slice(&self.data_offset.to_le_bytes());
    }
}

/// Resolve the NUL-terminated name at `name_offset` inside the table region.
///
/// The name must start after the fixed-size records and terminate inside the region.
pub fn resolve_name(table: &[u8], records_len: usize, name_offset: u32, index: usize) -> PakResult<String> {
    let start = name_offset as usize;
    if start < records_len || start >= table.len() {
        return Err(PakError::BrokenEntry {
            index,
            reason: format!("name offset {} outside of names block", name_offset),
        });
    }
    let Some(len) = table[start..].iter().position(|&b| b == 0) else {
        return Err(PakError::BrokenEntry {
            index,
            reason: "unterminated name".to_string(),
        });
    };
    String::from_utf8(table[start..start + len].to_vec()).map_err(|_| PakError::BrokenEntry {
        index,
        reason: "name is not valid UTF-8".to_string(),
    })
}

fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

pub(crate) fn read_exact(reader: &mut impl Read, buf: &mut [u8], what: &'static str) -> PakResult<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            PakError::Truncated { what }
        } else {
            PakError::Io {
                path: Default::default(),
                source: e,
            }
        }
    })
}
