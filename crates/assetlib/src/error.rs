use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while reading, writing, packing or unpacking an asset.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure on a reader or writer that has no path attached.
    #[error("i/o error while streaming asset: {0}")]
    Stream(#[from] std::io::Error),

    /// The container ended before one of its declared sections was complete.
    #[error("truncated asset: {section} declares {expected} bytes, only {available} available")]
    Truncated {
        section: &'static str,
        expected: u64,
        available: u64,
    },

    #[error("asset metadata is not valid utf-8")]
    InvalidMetadataEncoding(#[from] std::string::FromUtf8Error),

    #[error("failed to parse asset metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("malformed asset metadata: {0}")]
    MalformedMetadata(String),

    #[error("wrong asset kind: expected {expected:?}, found {found:?}")]
    WrongKind { expected: [u8; 4], found: [u8; 4] },

    #[error("unsupported {kind} asset version {version} (newest supported is {supported})")]
    UnsupportedVersion {
        kind: &'static str,
        version: u32,
        supported: u32,
    },

    #[error("payload decompression failed: {0}")]
    Decompression(#[from] lz4_flex::block::DecompressError),

    #[error("size mismatch in {what}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: u64,
        actual: u64,
    },

    /// Bounds computed from NaN or infinite positions cannot be stored in metadata.
    #[error("mesh bounds are not finite: {0:?}")]
    NonFiniteBounds([f32; 7]),

    #[error("unknown vertex format, refusing to reinterpret vertex bytes")]
    UnknownVertexFormat,

    #[error("unknown texture format, refusing to reinterpret pixel bytes")]
    UnknownTextureFormat,

    /// A caller-provided buffer (or a metadata-declared size) violates the layout contract.
    #[error("invalid buffer size: {0}")]
    InvalidBufferSize(String),
}

pub type AssetResult<T> = Result<T, AssetError>;
