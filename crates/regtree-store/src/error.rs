/// Errors from byte store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No resource name was given.
    #[error("no resource name specified")]
    EmptyName,

    /// The named resource does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The backend refused access to the named resource.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Any other I/O failure from the underlying backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store configuration could not be parsed.
    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Classify an I/O error raised while accessing `name`.
    pub fn from_io(name: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(name.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(name.to_string()),
            _ => Self::Io(err),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
