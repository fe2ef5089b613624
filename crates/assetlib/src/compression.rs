//! Whole-buffer payload compression.
//!
//! LZ4 here is the raw block format (no frame, no size prefix): the uncompressed
//! length always comes from the asset metadata.

use std::fmt;

use crate::{AssetError, AssetResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMode {
    #[default]
    None,
    Lz4,
}

impl CompressionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionMode::None => "None",
            CompressionMode::Lz4 => "LZ4",
        }
    }

    /// Strict lookup by metadata name. Metadata readers map `None` from this to
    /// [`CompressionMode::None`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "None" => Some(CompressionMode::None),
            "LZ4" => Some(CompressionMode::Lz4),
            _ => None,
        }
    }
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bound on `compress(mode, src).len()` for any `src` of `uncompressed_len` bytes.
pub fn compress_bound(mode: CompressionMode, uncompressed_len: usize) -> usize {
    match mode {
        CompressionMode::None => uncompressed_len,
        CompressionMode::Lz4 => lz4_flex::block::get_maximum_output_size(uncompressed_len),
    }
}

pub fn compress(mode: CompressionMode, src: &[u8]) -> Vec<u8> {
    match mode {
        CompressionMode::None => src.to_vec(),
        CompressionMode::Lz4 => lz4_flex::block::compress(src),
    }
}

/// Largest output `src_len` compressed bytes can decode to. An LZ4 block expands at most
/// 255x (one length byte per 255 output bytes).
pub fn max_decompressed_len(mode: CompressionMode, src_len: usize) -> usize {
    match mode {
        CompressionMode::None => src_len,
        CompressionMode::Lz4 => src_len.saturating_add(1).saturating_mul(255),
    }
}

/// Fails when `src_len` compressed bytes cannot possibly produce `expected_len` bytes.
/// Run before allocating anything sized from metadata.
pub fn check_decompressed_len(
    mode: CompressionMode,
    src_len: usize,
    expected_len: u64,
) -> AssetResult<()> {
    let max = max_decompressed_len(mode, src_len) as u64;
    if expected_len > max {
        return Err(AssetError::InvalidBufferSize(format!(
            "{expected_len} bytes declared, {src_len} bytes of {mode} payload decode to at most {max}"
        )));
    }
    Ok(())
}

/// Decompresses `src` into a fresh buffer of exactly `expected_len` bytes.
///
/// Fails on corrupt input, on output that would overflow `expected_len`, and on output
/// that comes up short. Nothing partially decoded is ever returned.
pub fn decompress(mode: CompressionMode, src: &[u8], expected_len: usize) -> AssetResult<Vec<u8>> {
    match mode {
        CompressionMode::None => {
            if src.len() != expected_len {
                return Err(AssetError::SizeMismatch {
                    what: "uncompressed payload",
                    expected: expected_len as u64,
                    actual: src.len() as u64,
                });
            }
            Ok(src.to_vec())
        }
        CompressionMode::Lz4 => {
            check_decompressed_len(mode, src.len(), expected_len as u64)?;
            let mut out = vec![0u8; expected_len];
            let written = lz4_flex::block::decompress_into(src, &mut out)?;
            if written != expected_len {
                return Err(AssetError::SizeMismatch {
                    what: "decompressed payload",
                    expected: expected_len as u64,
                    actual: written as u64,
                });
            }
            Ok(out)
        }
    }
}
