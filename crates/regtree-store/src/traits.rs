use crate::error::StoreResult;

/// A named-resource byte source and sink.
///
/// All implementations must satisfy these invariants:
/// - `read_all` returns every byte of the resource, or an error.
/// - `write_all` replaces the whole resource with `bytes`, or fails.
/// - An empty name is rejected with [`StoreError::EmptyName`].
/// - Missing resources are reported as [`StoreError::NotFound`] and access
///   refusals as [`StoreError::PermissionDenied`].
///
/// [`StoreError::EmptyName`]: crate::StoreError::EmptyName
/// [`StoreError::NotFound`]: crate::StoreError::NotFound
/// [`StoreError::PermissionDenied`]: crate::StoreError::PermissionDenied
pub trait ByteStore: Send + Sync {
    /// Read all bytes of the named resource.
    fn read_all(&self, name: &str) -> StoreResult<Vec<u8>>;

    /// Write all bytes to the named resource, replacing any prior content.
    fn write_all(&self, name: &str, bytes: &[u8]) -> StoreResult<()>;

    /// Check whether the named resource exists.
    ///
    /// Default implementation attempts a full read. Backends may override
    /// with a cheaper check.
    fn exists(&self, name: &str) -> StoreResult<bool> {
        match self.read_all(name) {
            Ok(_) => Ok(true),
            Err(crate::StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
