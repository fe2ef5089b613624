use std::{ffi::OsStr, path::Path, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use assetlib::AssetFile;

use crate::{Mesh, Texture2D, Vfs};

/// AssetLoader : transforme les bytes lus via le VFS en resources concrètes.
/// Les assets bakés (`.mesh`, `.tx`) passent par les codecs d'assetlib; les sources
/// (`.obj`, images) sont décodées directement.
#[derive(Clone)]
pub struct AssetLoader {
    vfs: Arc<Vfs>,
}

impl AssetLoader {
    pub fn new(vfs: Arc<Vfs>) -> Self {
        AssetLoader { vfs }
    }

    /// Charge les bytes d'un path via le VFS.
    pub fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.vfs.read_bytes(path)
    }

    pub fn load_asset_file(&self, path: &str) -> Result<AssetFile> {
        let bytes = self.load_bytes(path)?;
        AssetFile::from_bytes(&bytes).with_context(|| format!("invalid asset container {}", path))
    }

    pub fn load_mesh(&self, path: &str) -> Result<Mesh> {
        let bytes = self
            .load_bytes(path)
            .with_context(|| format!("failed to load mesh bytes for path {}", path))?;
        let mesh = match extension(path) {
            Some("mesh") => Mesh::from_asset_bytes(&bytes),
            Some("obj") => Mesh::from_obj_bytes(&bytes),
            other => bail!("unsupported mesh extension {:?} for {}", other, path),
        }
        .with_context(|| format!("failed to decode mesh {}", path))?;

        log::debug!(
            "loaded mesh {path}: {} vertices, {} triangles",
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// `.tx` est lu comme asset baké, tout le reste comme une image source.
    pub fn load_texture(&self, path: &str) -> Result<Texture2D> {
        let bytes = self
            .load_bytes(path)
            .with_context(|| format!("failed to load texture bytes for path {}", path))?;
        let texture = match extension(path) {
            Some("tx") => Texture2D::from_asset_bytes(&bytes)
                .with_context(|| format!("failed to decode texture asset {}", path))?,
            _ => Texture2D::from_bytes(&bytes)
                .map_err(|e| anyhow!(format!("failed to decode image {:?}: {}", path, e)))?,
        };

        log::debug!("loaded texture {path}: {}x{}", texture.width, texture.height);
        Ok(texture)
    }

    /// Ecrit des bytes via le VFS (dans le dernier mount writable qui matche).
    pub fn write_bytes(&self, path: &str, data: &[u8]) -> Result<()> {
        self.vfs.write_bytes(path, data)
    }

    pub fn write_asset_file(&self, path: &str, file: &AssetFile) -> Result<()> {
        self.write_bytes(path, &file.to_bytes()?)
    }
}

fn extension(path: &str) -> Option<&str> {
    Path::new(path).extension().and_then(OsStr::to_str)
}
