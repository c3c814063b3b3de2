//! Binary format constants and name rules.
//!
//! Every multi-byte value in a registry file is big-endian. A file starts
//! with [`REGISTRY_HEADER`] and [`FORMAT_VERSION`], followed by the entity
//! stream. Each entity begins with [`ENTRY_HEADER`] or [`KEY_HEADER`].

use crate::error::TypeError;

/// Magic that prefixes every serialized entry.
pub const ENTRY_HEADER: u32 = 0x9E70_8199;

/// Magic that prefixes every serialized subkey.
pub const KEY_HEADER: u32 = 0x9E70_819E;

/// Magic at the start of a registry file.
pub const REGISTRY_HEADER: u32 = 0x9E70_819F;

/// The only format version this crate reads or writes (1.0).
pub const FORMAT_VERSION: u16 = 0x0100;

/// Name carried by the tree root. Never written to the serialized form.
pub const ROOT_NAME: &str = "root";

/// Name reserved for "nothing found"; no live key or entry may carry it.
pub const NULL_NAME: &str = "null";

/// Returns `true` if `name` is reserved and cannot name a key or entry.
pub fn is_reserved(name: &str) -> bool {
    name == ROOT_NAME || name == NULL_NAME
}

/// Validate a key or entry name, returning `Ok(())` if it may be used.
///
/// # Examples
///
/// ```
/// use regtree_types::validate_name;
///
/// assert!(validate_name("graphics").is_ok());
/// assert!(validate_name("").is_err());
/// assert!(validate_name("root").is_err());
/// assert!(validate_name("null").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), TypeError> {
    if name.is_empty() {
        return Err(TypeError::EmptyName);
    }
    if is_reserved(name) {
        return Err(TypeError::ReservedName(name.to_string()));
    }
    Ok(())
}
