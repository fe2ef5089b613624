//! Système de fichiers virtuel : plusieurs sources montées sur des préfixes.
//!
//! Le dernier mount ajouté a la priorité la plus haute. Les chemins VFS sont de la
//! forme `"prefix/relatif/au/mount"`; un préfixe vide matche tout.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard},
};

use anyhow::{Context, Result, anyhow};

/// Source de fichiers montable. Les chemins reçus sont relatifs au mount.
pub trait FileSystem: Send + Sync + 'static {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    /// Crée les dossiers parents si nécessaire.
    fn write_bytes(&self, path: &Path, data: &[u8]) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Nom (pour debug).
    fn name(&self) -> &str;
}

/// Dossier du système d'exploitation.
pub struct Ofs {
    root: PathBuf,
    name: String,
}

impl Ofs {
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Ofs {
            root: root.into(),
            name: name.into(),
        }
    }

    fn resolve_path(&self, rel: &Path) -> PathBuf {
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.root.join(rel)
        }
    }
}

impl FileSystem for Ofs {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let abs = self.resolve_path(path);
        std::fs::read(&abs).with_context(|| format!("Ofs({}) failed to read {:?}", self.name, abs))
    }

    fn write_bytes(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs = self.resolve_path(path);
        if let Some(parent) = abs.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!(
                    "Ofs({}) failed to create parent directories for {:?}",
                    self.name, abs
                )
            })?;
        }
        std::fs::write(&abs, data)
            .with_context(|| format!("Ofs({}) failed to write {:?}", self.name, abs))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve_path(path).exists()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fichiers gardés en mémoire (tests, assets générés à la volée).
pub struct MemoryFs {
    name: String,
    files: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryFs {
    pub fn new(name: impl Into<String>) -> Self {
        MemoryFs {
            name: name.into(),
            files: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_file(self, path: impl Into<PathBuf>, data: Vec<u8>) -> Self {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), data);
        self
    }
}

impl FileSystem for MemoryFs {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("MemoryFs({}) has no file {:?}", self.name, path))
    }

    fn write_bytes(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

struct Mount {
    /// Exemple : "assets", "engine", "" (catch-all)
    prefix: PathBuf,
    fs: Arc<dyn FileSystem>,
    writable: bool,
}

impl Mount {
    fn matches(&self, path: &Path) -> bool {
        self.prefix.as_os_str().is_empty() || path.starts_with(&self.prefix)
    }

    fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.prefix)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[derive(Clone, Default)]
pub struct Vfs {
    mounts: Arc<RwLock<Vec<Mount>>>,
}

impl Vfs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monte `fs` sur `prefix`. Seuls les mounts `writable` reçoivent les écritures.
    pub fn mount(&self, prefix: impl AsRef<Path>, fs: Arc<dyn FileSystem>, writable: bool) {
        log::debug!(
            "vfs: mounting {:?} on {:?} (writable: {writable})",
            fs.name(),
            prefix.as_ref()
        );
        self.mounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Mount {
                prefix: prefix.as_ref().to_path_buf(),
                fs,
                writable,
            });
    }

    pub fn mount_os(
        &self,
        prefix: impl AsRef<Path>,
        root: impl Into<PathBuf>,
        name: impl Into<String>,
        writable: bool,
    ) {
        self.mount(prefix, Arc::new(Ofs::new(root, name)), writable);
    }

    /// Supprime tous les mounts de ce préfixe exact.
    pub fn unmount(&self, prefix: impl AsRef<Path>) {
        self.mounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|m| m.prefix != prefix.as_ref());
    }

    fn mounts(&self) -> RwLockReadGuard<'_, Vec<Mount>> {
        self.mounts.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Premier mount (par priorité) qui matche `path`, avec le chemin relatif à lui passer.
    fn resolve(&self, path: &Path, need_writable: bool) -> Option<(Arc<dyn FileSystem>, PathBuf)> {
        self.mounts()
            .iter()
            .rev()
            .find(|m| m.matches(path) && (m.writable || !need_writable))
            .map(|m| (m.fs.clone(), m.relative_path(path)))
    }

    pub fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let (fs, rel) = self
            .resolve(Path::new(path), false)
            .ok_or_else(|| anyhow!("no mount found for path {:?}", path))?;
        fs.read_bytes(&rel)
            .with_context(|| format!("failed to read bytes from vfs path {:?}", path))
    }

    pub fn write_bytes(&self, path: &str, data: &[u8]) -> Result<()> {
        let (fs, rel) = self
            .resolve(Path::new(path), true)
            .ok_or_else(|| anyhow!("no writable mount found for path {:?}", path))?;
        fs.write_bytes(&rel, data)
            .with_context(|| format!("failed to write bytes to vfs path {:?}", path))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.resolve(Path::new(path), false)
            .is_some_and(|(fs, rel)| fs.exists(&rel))
    }

    /// (prefix, nom, writable), de la priorité la plus basse à la plus haute.
    pub fn debug_list_mounts(&self) -> Vec<(PathBuf, String, bool)> {
        self.mounts()
            .iter()
            .map(|m| (m.prefix.clone(), m.fs.name().to_string(), m.writable))
            .collect()
    }
}
