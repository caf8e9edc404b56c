//! Payload compression.
//!
//! LZ4 block format without a size prefix; the uncompressed size lives in the
//! entry record. A payload counts as compressed iff its stored size differs from
//! its recorded size.

/// Compress `data`, returning `None` unless the result is strictly smaller.
pub fn try_compress(data: &[u8]) -> Option<Vec<u8>> {
    if data.is_empty() {
        return None;
    }
    let compressed = lz4_flex::block::compress(data);
    (compressed.len() < data.len()).then_some(compressed)
}

/// Inflate a payload to exactly `size` bytes.
pub fn decompress(data: &[u8], size: usize) -> Result<Vec<u8>, String> {
    let out = lz4_flex::block::decompress(data, size).map_err(|e| e.to_string())?;
    if out.len() != size {
        return Err(format!("expected {} bytes, got {}", size, out.len()));
    }
    Ok(out)
}
