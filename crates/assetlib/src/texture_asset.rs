//! `TEXI` assets: a single 2D RGBA8 image.

use std::fmt;

use crate::{
    AssetError, AssetFile, AssetResult, CompressionMode,
    compression::{check_decompressed_len, compress, decompress},
    metadata::{self, TextureMetadata},
};

pub const TEXTURE_KIND: [u8; 4] = *b"TEXI";
pub const TEXTURE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFormat {
    #[default]
    Unknown,
    /// Interleaved R, G, B, A, 8 bits each.
    Rgba8,
}

impl TextureFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            TextureFormat::Unknown => "Unknown",
            TextureFormat::Rgba8 => "RGBA8",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "RGBA8" => TextureFormat::Rgba8,
            _ => TextureFormat::Unknown,
        }
    }

    pub fn bytes_per_pixel(self) -> Option<u64> {
        match self {
            TextureFormat::Unknown => None,
            TextureFormat::Rgba8 => Some(4),
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextureInfo {
    /// Uncompressed byte length of the pixel buffer.
    pub texture_size: u64,
    pub texture_format: TextureFormat,
    /// Read side only: packers choose their own compression.
    pub compression_mode: CompressionMode,
    /// `[width, height, reserved]`. The third slot is not stored.
    pub pixel_size: [u32; 3],
    pub original_file: String,
}

impl TextureInfo {
    /// A size that overflows `u64` saturates and is then refused by [`Self::check_layout`].
    pub fn rgba8(width: u32, height: u32, original_file: impl Into<String>) -> Self {
        Self {
            texture_size: (u64::from(width) * u64::from(height)).saturating_mul(4),
            texture_format: TextureFormat::Rgba8,
            compression_mode: CompressionMode::Lz4,
            pixel_size: [width, height, 0],
            original_file: original_file.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixel_size[0]
    }

    pub fn height(&self) -> u32 {
        self.pixel_size[1]
    }

    /// `texture_size` must equal `width * height * bytes_per_pixel` for a known format.
    pub fn check_layout(&self) -> AssetResult<()> {
        let bpp = self
            .texture_format
            .bytes_per_pixel()
            .ok_or(AssetError::UnknownTextureFormat)?;
        let expected = u64::from(self.width())
            .checked_mul(u64::from(self.height()))
            .and_then(|pixels| pixels.checked_mul(bpp))
            .ok_or_else(|| {
                AssetError::InvalidBufferSize(format!(
                    "{}x{} {} overflows a 64-bit byte count",
                    self.width(),
                    self.height(),
                    self.texture_format
                ))
            })?;
        if expected != self.texture_size {
            return Err(AssetError::InvalidBufferSize(format!(
                "{}x{} {} needs {expected} bytes, metadata declares {}",
                self.width(),
                self.height(),
                self.texture_format,
                self.texture_size
            )));
        }
        Ok(())
    }

    fn texture_len(&self) -> AssetResult<usize> {
        usize::try_from(self.texture_size).map_err(|_| {
            AssetError::InvalidBufferSize(format!(
                "{} bytes does not fit in memory",
                self.texture_size
            ))
        })
    }
}

/// Packs RGBA8 pixels with LZ4.
pub fn pack_texture(info: &TextureInfo, pixels: &[u8]) -> AssetResult<AssetFile> {
    pack_texture_with_compression(info, CompressionMode::Lz4, pixels)
}

pub fn pack_texture_with_compression(
    info: &TextureInfo,
    compression: CompressionMode,
    pixels: &[u8],
) -> AssetResult<AssetFile> {
    info.check_layout()?;
    if pixels.len() as u64 != info.texture_size {
        return Err(AssetError::SizeMismatch {
            what: "pixel buffer",
            expected: info.texture_size,
            actual: pixels.len() as u64,
        });
    }

    let meta = TextureMetadata {
        format: info.texture_format.as_str().to_string(),
        width: info.width(),
        height: info.height(),
        buffer_size: info.texture_size,
        original_file: info.original_file.clone(),
        compression: compression.as_str().to_string(),
    };

    Ok(AssetFile::new(
        TEXTURE_KIND,
        TEXTURE_VERSION,
        metadata::to_json(&meta)?,
        compress(compression, pixels),
    ))
}

pub fn read_texture_info(file: &AssetFile) -> AssetResult<TextureInfo> {
    if file.kind != TEXTURE_KIND {
        return Err(AssetError::WrongKind {
            expected: TEXTURE_KIND,
            found: file.kind,
        });
    }
    if file.version > TEXTURE_VERSION {
        return Err(AssetError::UnsupportedVersion {
            kind: "texture",
            version: file.version,
            supported: TEXTURE_VERSION,
        });
    }

    let meta: TextureMetadata = metadata::from_json(&file.metadata)?;
    Ok(TextureInfo {
        texture_size: meta.buffer_size,
        texture_format: TextureFormat::from_name(&meta.format),
        compression_mode: CompressionMode::from_name(&meta.compression)
            .unwrap_or(CompressionMode::None),
        pixel_size: [meta.width, meta.height, 0],
        original_file: meta.original_file,
    })
}

/// Decodes the payload into `pixel_out`, which must be exactly `info.texture_size` bytes.
/// On failure `pixel_out` is left untouched.
pub fn unpack_texture(info: &TextureInfo, source: &[u8], pixel_out: &mut [u8]) -> AssetResult<()> {
    if pixel_out.len() as u64 != info.texture_size {
        return Err(AssetError::SizeMismatch {
            what: "pixel output buffer",
            expected: info.texture_size,
            actual: pixel_out.len() as u64,
        });
    }

    let pixels = decompress(info.compression_mode, source, pixel_out.len())?;
    pixel_out.copy_from_slice(&pixels);
    Ok(())
}

/// [`unpack_texture`] into a fresh buffer.
pub fn unpack_texture_pixels(info: &TextureInfo, source: &[u8]) -> AssetResult<Vec<u8>> {
    check_decompressed_len(info.compression_mode, source.len(), info.texture_size)?;
    decompress(info.compression_mode, source, info.texture_len()?)
}
