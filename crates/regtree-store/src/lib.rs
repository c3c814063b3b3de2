//! Whole-buffer byte sources and sinks for regtree.
//!
//! A registry never streams: it reads every byte of a named resource into
//! memory, and writes every byte back in one call. This crate provides that
//! narrow contract and its backends.
//!
//! # Storage Backends
//!
//! All backends implement the [`ByteStore`] trait:
//!
//! - [`FileByteStore`] -- files under a configured root directory
//! - [`InMemoryByteStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Reads and writes are whole-resource; there are no partial writes.
//! 2. Failures are distinguished: not-found, permission, and other I/O.
//! 3. Failures are returned to the caller, never retried.

pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use config::FileStoreConfig;
pub use error::{StoreError, StoreResult};
pub use file::FileByteStore;
pub use memory::InMemoryByteStore;
pub use traits::ByteStore;
