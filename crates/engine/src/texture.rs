use std::path::Path;

use anyhow::{Context, Result, bail};
use assetlib::{AssetFile, TextureFormat, TextureInfo, texture_asset};

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture2D {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Texture2D {
    /// Decodes raw image bytes (any format supported by the `image` crate) to RGBA8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self {
            width,
            height,
            pixels: img.into_raw(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let bytes = std::fs::read(path).map_err(image::ImageError::IoError)?;
        Self::from_bytes(&bytes)
    }

    /// Decodes a baked `TEXI` asset.
    pub fn from_asset(file: &AssetFile) -> Result<Self> {
        let info =
            texture_asset::read_texture_info(file).context("failed to read texture metadata")?;
        if info.texture_format != TextureFormat::Rgba8 {
            bail!(
                "texture baked from {:?} has unsupported format {}",
                info.original_file,
                info.texture_format
            );
        }
        info.check_layout()?;

        let pixels = texture_asset::unpack_texture_pixels(&info, &file.payload)
            .with_context(|| format!("failed to unpack texture {:?}", info.original_file))?;
        Ok(Self {
            width: info.width(),
            height: info.height(),
            pixels,
        })
    }

    pub fn from_asset_bytes(bytes: &[u8]) -> Result<Self> {
        let file = AssetFile::from_bytes(bytes).context("not a valid asset container")?;
        Self::from_asset(&file)
    }

    pub fn load_from_asset(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = AssetFile::load(path)?;
        Self::from_asset(&file).with_context(|| format!("failed to load texture {:?}", path))
    }

    /// Describes this image for [`texture_asset::pack_texture`].
    pub fn to_texture_info(&self, original_file: impl Into<String>) -> TextureInfo {
        TextureInfo::rgba8(self.width, self.height, original_file)
    }
}
