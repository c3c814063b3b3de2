//! Hierarchical, versioned binary registry.
//!
//! A registry is a tree of named keys. Each key holds typed entries and
//! nested subkeys. Same-named sibling keys are legal and are told apart by
//! an instance number, their rank among siblings of that name. Instances
//! are recomputed on every add, remove and rename, and are never stored.
//!
//! # Architecture
//!
//! - **Registry**: owns the key arena and the file framing (magic + version)
//! - **KeyRef / KeyMut**: borrowed views used for all tree reads and writes
//! - **Entry**: named leaf holding one [`Value`](regtree_types::Value)
//! - **codec**: depth-first encode/decode of the entity stream
//! - **KeySnapshot / FlatEntry**: owned, serde-serializable tree copies
//!
//! Lookups return [`RegistryResult`]; a rejected operation also emits a
//! `tracing` warning naming the key and the offending argument.

mod arena;
mod codec;
pub mod entry;
pub mod error;
pub mod key;
pub mod registry;
pub mod snapshot;

pub use arena::{KeyId, MAX_DEPTH};
pub use entry::{decode_value, encode_value, Entry, EntryMut};
pub use error::{ParseError, ParseResult, RegistryError, RegistryResult};
pub use key::{KeyMut, KeyRef};
pub use registry::{LoadOptions, Registry};
pub use snapshot::{parse_path, FlatEntry, KeySnapshot, PathSegment};
