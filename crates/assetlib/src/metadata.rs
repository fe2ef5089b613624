//! JSON documents stored in the metadata section of an [`AssetFile`](crate::AssetFile).
//!
//! Enumerations travel as their string names so that an older reader facing a newer
//! writer sees an unknown name (and maps it to `Unknown`) instead of a parse failure.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::AssetResult;

/// Metadata of a `MESH` asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshMetadata {
    pub vertex_format: String,
    pub vertex_buffer_size: u64,
    pub index_buffer_size: u64,
    pub index_size: u8,
    pub original_file: String,
    /// `[origin.x, origin.y, origin.z, radius, extents.x, extents.y, extents.z]`
    pub bounds: [f32; 7],
    pub compression: String,
}

/// Metadata of a `TEXI` asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureMetadata {
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub buffer_size: u64,
    pub original_file: String,
    pub compression: String,
}

pub fn to_json<T: Serialize>(metadata: &T) -> AssetResult<String> {
    Ok(serde_json::to_string(metadata)?)
}

pub fn from_json<T: DeserializeOwned>(json: &str) -> AssetResult<T> {
    Ok(serde_json::from_str(json)?)
}
