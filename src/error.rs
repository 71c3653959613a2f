//! Error types for pool operations

use thiserror::Error;

/// Pool operation result type
pub type Result<T> = std::result::Result<T, PoolError>;

/// Coarse classification of a [`PoolError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No fitting free block, or no live allocation at the given offset
    NotFound,
    /// Operation issued against a pool that is not active
    InvalidState,
    /// Request that can never succeed (zero size, zero capacity)
    InvalidArgument,
    /// Configuration could not be loaded or failed validation
    Config,
}

/// Pool operation errors
#[derive(Error, Debug)]
pub enum PoolError {
    /// No free block is large enough for the request
    #[error("Out of space: no free block can hold {requested} bytes")]
    NoFit { requested: u64 },

    /// Free was given an offset that is not a live allocation
    #[error("No allocation starts at offset {0}")]
    UnknownOffset(u64),

    /// Pool has not been initialized yet
    #[error("Pool is not initialized")]
    NotInitialized,

    /// Init called while a pool is already active
    #[error("Pool is already initialized; clean it up first")]
    AlreadyInitialized,

    /// Pool was cleaned up
    #[error("Pool has been cleaned up")]
    Destroyed,

    #[error("Allocation size must be greater than zero")]
    ZeroSize,

    #[error("Pool capacity must be greater than zero")]
    ZeroCapacity,

    /// Configuration could not be parsed or validated
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PoolError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PoolError::NoFit { .. } | PoolError::UnknownOffset(_) => ErrorKind::NotFound,
            PoolError::NotInitialized | PoolError::AlreadyInitialized | PoolError::Destroyed => {
                ErrorKind::InvalidState
            }
            PoolError::ZeroSize | PoolError::ZeroCapacity => ErrorKind::InvalidArgument,
            PoolError::Config(_) | PoolError::Io(_) => ErrorKind::Config,
        }
    }

    /// True for the recoverable "nothing there" outcomes
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<toml::de::Error> for PoolError {
    fn from(err: toml::de::Error) -> Self {
        PoolError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for PoolError {
    fn from(err: validator::ValidationErrors) -> Self {
        PoolError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(PoolError::NoFit { requested: 8 }.kind(), ErrorKind::NotFound);
        assert_eq!(PoolError::UnknownOffset(999).kind(), ErrorKind::NotFound);
        assert_eq!(PoolError::NotInitialized.kind(), ErrorKind::InvalidState);
        assert_eq!(PoolError::AlreadyInitialized.kind(), ErrorKind::InvalidState);
        assert_eq!(PoolError::Destroyed.kind(), ErrorKind::InvalidState);
        assert_eq!(PoolError::ZeroSize.kind(), ErrorKind::InvalidArgument);
        assert_eq!(PoolError::Config("x".into()).kind(), ErrorKind::Config);
    }

    #[test]
    fn test_error_messages() {
        let err = PoolError::NoFit { requested: 60 };
        assert_eq!(err.to_string(), "Out of space: no free block can hold 60 bytes");
        assert!(err.is_not_found());

        let err = PoolError::UnknownOffset(999);
        assert!(err.to_string().contains("999"));
    }
}
