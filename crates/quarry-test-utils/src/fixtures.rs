//! Minimal file contents recognised by the mock devices.

/// A PNG signature followed by an `IHDR` chunk header with the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
    out.extend_from_slice(&13u32.to_be_bytes());
    out.extend_from_slice(b"IHDR");
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&[8, 6, 0, 0, 0]);
    out
}

/// A DDS magic with a zeroed header.
pub fn dds() -> Vec<u8> {
    let mut out = b"DDS ".to_vec();
    out.resize(128, 0);
    out
}

/// A RIFF/WAVE header with no samples.
pub fn wav() -> Vec<u8> {
    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&4u32.to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out
}

/// An Ogg page capture pattern.
pub fn ogg() -> Vec<u8> {
    let mut out = b"OggS".to_vec();
    out.resize(27, 0);
    out
}

/// A TrueType offset table.
pub fn ttf() -> Vec<u8> {
    let mut out = vec![0x00, 0x01, 0x00, 0x00];
    out.resize(12, 0);
    out
}
