use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer underrun: needed {needed} bytes, {remaining} remaining")]
    Underrun { needed: usize, remaining: usize },

    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("string of {0} bytes does not fit a 32-bit length prefix")]
    StringTooLong(usize),

    #[error("count {0} does not fit a 32-bit field")]
    CountOverflow(usize),
}

pub type BufferResult<T> = Result<T, BufferError>;
