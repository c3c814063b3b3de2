use regtree_buffer::BufferError;
use regtree_store::StoreError;
use regtree_types::ValueType;
use thiserror::Error;

/// Errors raised while decoding a registry stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid registry header: expected {expected:#010x}, got {actual:#010x}")]
    InvalidMagic { expected: u32, actual: u32 },

    #[error("unsupported format version: expected {expected:#06x}, got {actual:#06x}")]
    VersionMismatch { expected: u16, actual: u16 },

    #[error("invalid entity header {header:#010x} at offset {offset}")]
    InvalidEntityHeader { header: u32, offset: usize },

    #[error("entity at offset {offset} has an empty name")]
    EmptyName { offset: usize },

    #[error("entity name is reserved: {0:?}")]
    ReservedName(String),

    #[error("entry {name:?} has unrecognized type tag {tag}")]
    UnknownTag { name: String, tag: u8 },

    #[error("entry {name:?} already exists as {existing}, stream holds {found}")]
    EntryConflict {
        name: String,
        existing: ValueType,
        found: ValueType,
    },

    #[error("keys nested deeper than {0} levels")]
    TooDeep(usize),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Errors from registry tree operations and file I/O.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No resource name was given for a load or save.
    #[error("no file name specified")]
    NoName,

    /// The byte source could not be read.
    #[error("failed to load {name:?}: {source}")]
    FileLoad { name: String, source: StoreError },

    /// The byte sink could not be written.
    #[error("failed to save {name:?}: {source}")]
    FileSave { name: String, source: StoreError },

    /// The stream was malformed or carried another format version.
    #[error("failed to parse registry data: {0}")]
    FileParse(#[from] ParseError),

    /// The tree could not be encoded.
    #[error("failed to encode registry: {0}")]
    Encode(#[from] BufferError),

    /// A key or entry name was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A key or entry name was `root` or `null`.
    #[error("name is reserved: {0:?}")]
    NameReserved(String),

    /// No entry of that name exists in the key.
    #[error("entry {entry:?} not found in key {key:?}")]
    EntryNotFound { key: String, entry: String },

    /// No subkey with that name and instance exists.
    #[error("subkey {name:?} ({instance}) not found in key {parent:?}")]
    KeyNotFound {
        parent: String,
        name: String,
        instance: u32,
    },

    /// A positional lookup went past the end of the list.
    #[error("index {index} out of range for {len} items in key {key:?}")]
    IndexOutOfRange { key: String, index: usize, len: usize },

    /// The entry holds a different type than the one requested.
    #[error("entry {entry:?} holds {actual}, not {expected}")]
    TypeMismatch {
        entry: String,
        expected: ValueType,
        actual: ValueType,
    },

    /// A rename target already names an entry in the key.
    #[error("entry {entry:?} already exists in key {key:?}")]
    EntryExists { key: String, entry: String },

    /// The root key keeps its name.
    #[error("the root key cannot be renamed")]
    RootRename,

    /// A new subkey would be nested deeper than the limit.
    #[error("keys cannot be nested deeper than {0} levels")]
    TooDeep(usize),

    /// The key behind a [`KeyId`](crate::KeyId) has been removed.
    #[error("key handle no longer refers to a live key")]
    StaleKey,

    /// A key path could not be parsed.
    #[error("invalid key path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_errors_name_the_limit() {
        assert_eq!(
            RegistryError::TooDeep(512).to_string(),
            "keys cannot be nested deeper than 512 levels"
        );
        let err = RegistryError::FileParse(ParseError::TooDeep(512));
        assert!(err.to_string().contains("512"));
    }
}
