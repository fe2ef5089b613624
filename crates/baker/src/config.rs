use anyhow::{Result, anyhow};
use assetlib::{CompressionMode, VertexFormat};

pub const VERTEX_FORMAT_VAR: &str = "BAKER_VERTEX_FORMAT";
pub const COMPRESSION_VAR: &str = "BAKER_COMPRESSION";

/// How every asset of a run is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BakeConfig {
    pub vertex_format: VertexFormat,
    pub compression: CompressionMode,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            vertex_format: VertexFormat::PncvF32,
            compression: CompressionMode::Lz4,
        }
    }
}

impl BakeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `BAKER_*` variables.
    /// Unrecognised values are errors, not fallbacks.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(name) = lookup(VERTEX_FORMAT_VAR) {
            config.vertex_format = match VertexFormat::from_name(name.trim()) {
                VertexFormat::Unknown => {
                    return Err(anyhow!(
                        "{VERTEX_FORMAT_VAR}={name:?} is not a vertex format (PNCV_F32, P32N8C8V16)"
                    ));
                }
                format => format,
            };
        }

        if let Some(name) = lookup(COMPRESSION_VAR) {
            config.compression = CompressionMode::from_name(name.trim()).ok_or_else(|| {
                anyhow!("{COMPRESSION_VAR}={name:?} is not a compression mode (LZ4, None)")
            })?;
        }

        Ok(config)
    }
}
