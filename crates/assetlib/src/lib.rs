//! Versioned binary asset containers and the mesh / texture codecs built on them.
//!
//! An asset is an [`AssetFile`]: a 4-byte kind, a version, a JSON metadata document and
//! a compressed payload. [`mesh_asset`] and [`texture_asset`] know how to fill and read
//! those for their own kind; the container itself stays payload-agnostic.
//!
//! Nothing here logs or keeps state between calls. The only I/O is
//! [`AssetFile::save`] / [`AssetFile::load`].

pub mod asset_file;
pub mod compression;
pub mod error;
pub mod mesh_asset;
pub mod metadata;
pub mod texture_asset;

pub use asset_file::*;
pub use compression::CompressionMode;
pub use error::*;
pub use mesh_asset::{
    DecodedVertices, MeshBounds, MeshInfo, PackedVertex, VertexFormat, VertexP32N8C8V16,
    VertexPncvF32,
};
pub use texture_asset::{TextureFormat, TextureInfo};
