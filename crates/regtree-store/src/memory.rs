use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::ByteStore;

/// In-memory, HashMap-based byte store.
///
/// Intended for tests and embedding. Resources are held behind a `RwLock`
/// and cloned on read/write. A store can be switched to read-only to
/// exercise write-failure paths.
pub struct InMemoryByteStore {
    resources: RwLock<HashMap<String, Vec<u8>>>,
    read_only: AtomicBool,
}

impl InMemoryByteStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            resources: RwLock::new(HashMap::new()),
            read_only: AtomicBool::new(false),
        }
    }

    /// Insert a resource directly, bypassing the read-only flag.
    pub fn insert(&self, name: impl Into<String>, bytes: Vec<u8>) {
        self.resources
            .write()
            .expect("lock poisoned")
            .insert(name.into(), bytes);
    }

    /// Copy of a resource's bytes, if present.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.resources.read().expect("lock poisoned").get(name).cloned()
    }

    /// Remove a resource. Returns `true` if it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.resources
            .write()
            .expect("lock poisoned")
            .remove(name)
            .is_some()
    }

    /// Number of resources currently stored.
    pub fn len(&self) -> usize {
        self.resources.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.resources.read().expect("lock poisoned").is_empty()
    }

    /// Make subsequent writes fail with [`StoreError::PermissionDenied`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

impl Default for InMemoryByteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStore for InMemoryByteStore {
    fn read_all(&self, name: &str) -> StoreResult<Vec<u8>> {
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        self.get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn write_all(&self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied(name.to_string()));
        }
        self.insert(name, bytes.to_vec());
        Ok(())
    }

    fn exists(&self, name: &str) -> StoreResult<bool> {
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        Ok(self
            .resources
            .read()
            .expect("lock poisoned")
            .contains_key(name))
    }
}

impl std::fmt::Debug for InMemoryByteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryByteStore")
            .field("resource_count", &self.len())
            .field("read_only", &self.read_only.load(Ordering::SeqCst))
            .finish()
    }
}
