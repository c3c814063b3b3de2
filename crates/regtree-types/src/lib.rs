//! Foundation types for regtree.
//!
//! This crate defines the closed set of primitive values a registry entry can
//! hold, the one-byte tags that identify them on the wire, and the constants
//! that frame the binary format. Every other regtree crate depends on
//! `regtree-types`.
//!
//! # Key Types
//!
//! - [`ValueType`] -- One-byte type tag for an entry's value
//! - [`Value`] -- Tagged union over the eight primitive types
//! - [`Primitive`] -- Rust types that map onto a [`Value`] variant
//! - [`format`] -- Header magics, format version, and reserved names

pub mod error;
pub mod format;
pub mod value;

pub use error::TypeError;
pub use format::{
    is_reserved, validate_name, ENTRY_HEADER, FORMAT_VERSION, KEY_HEADER, NULL_NAME,
    REGISTRY_HEADER, ROOT_NAME,
};
pub use value::{Primitive, Value, ValueType};
