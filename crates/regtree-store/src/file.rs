use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::config::FileStoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::ByteStore;

/// Filesystem-backed [`ByteStore`].
///
/// Resource names are paths relative to [`FileStoreConfig::root`]; absolute
/// names are used as given.
#[derive(Clone, Debug, Default)]
pub struct FileByteStore {
    config: FileStoreConfig,
}

impl FileByteStore {
    /// Create a store from a configuration.
    pub fn new(config: FileStoreConfig) -> Self {
        Self { config }
    }

    /// Create a store rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::new(FileStoreConfig::with_root(root))
    }

    /// The active configuration.
    pub fn config(&self) -> &FileStoreConfig {
        &self.config
    }

    /// Resolve a resource name to a filesystem path.
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.config.root.join(name)
    }
}

impl ByteStore for FileByteStore {
    fn read_all(&self, name: &str) -> StoreResult<Vec<u8>> {
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        let path = self.resolve(name);
        let bytes = fs::read(&path).map_err(|e| StoreError::from_io(name, e))?;
        debug!(path = %path.display(), len = bytes.len(), "read resource");
        Ok(bytes)
    }

    fn write_all(&self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        let path = self.resolve(name);
        if self.config.create_dirs {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| StoreError::from_io(name, e))?;
            }
        }
        fs::write(&path, bytes).map_err(|e| StoreError::from_io(name, e))?;
        debug!(path = %path.display(), len = bytes.len(), "wrote resource");
        Ok(())
    }

    fn exists(&self, name: &str) -> StoreResult<bool> {
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        Ok(self.resolve(name).is_file())
    }
}
