use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;

use crate::{AssetLoader, Mesh, Texture2D, Vfs};

/// Engine: point d'entrée runtime, VFS partagé plus l'AssetLoader qui lit dedans.
pub struct Engine {
    pub vfs: Arc<Vfs>,
    pub loader: AssetLoader,
}

impl Default for Engine {
    fn default() -> Self {
        let vfs = Arc::new(Vfs::new());
        let loader = AssetLoader::new(vfs.clone());
        Engine { vfs, loader }
    }
}

impl Engine {
    pub const ASSETS_DIR: &str = "assets";

    /// Monte `assets/` (relatif au dossier courant) en écriture sur le préfixe `assets`.
    pub fn init(&mut self) {
        log::info!("Starting engine...");

        self.vfs.mount_os(
            Self::ASSETS_DIR,
            PathBuf::from(Self::ASSETS_DIR),
            "Assets",
            true,
        );

        log::info!("Engine initialization complete.");
    }

    /// Mount an OS directory for the given prefix. `writable` controls whether writes go here.
    pub fn mount_os(
        &self,
        prefix: impl AsRef<Path>,
        root: impl Into<PathBuf>,
        name: impl Into<String>,
        writable: bool,
    ) {
        self.vfs.mount_os(prefix, root, name, writable);
    }

    pub fn unmount(&self, prefix: impl AsRef<Path>) {
        self.vfs.unmount(prefix);
    }

    pub fn load_mesh(&self, path: &str) -> Result<Mesh> {
        self.loader.load_mesh(path)
    }

    pub fn load_texture(&self, path: &str) -> Result<Texture2D> {
        self.loader.load_texture(path)
    }
}
