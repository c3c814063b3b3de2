use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("unrecognized type tag: {0}")]
    UnknownTag(u8),

    #[error("name must not be empty")]
    EmptyName,

    #[error("name is reserved: {0:?}")]
    ReservedName(String),
}
