//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Status codes returned across the C ABI (see [`crate::ffi`]).
pub mod status {
    pub const OK: i32 = 0;
    pub const NOT_BOUND: i32 = 1;
    pub const EMISSION_FAILED: i32 = 2;
    pub const INVALID_ARGUMENT: i32 = 3;
    pub const INTERNAL: i32 = 4;
}

/// Main error enum for the relay.
#[derive(Error, Debug)]
pub enum Error {
    /// The relay has no live host context (never bound, or torn down).
    #[error("context unavailable: {0}")]
    ContextUnavailable(String),

    /// The host channel rejected the event or could not accept it.
    #[error("emission failed: {0}")]
    Emission(String),

    /// Lookup of a module or context failed.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input at an API boundary.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal errors.
    #[error("internal error: {0}")]
    Internal(String),

    /// Timeout waiting for host shutdown.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Convert to a C ABI status code.
    pub fn status_code(&self) -> i32 {
        match self {
            Error::ContextUnavailable(_) | Error::NotFound(_) => status::NOT_BOUND,
            Error::Emission(_) => status::EMISSION_FAILED,
            Error::Validation(_) => status::INVALID_ARGUMENT,
            Error::Internal(_) | Error::Timeout(_) | Error::Serialization(_) => status::INTERNAL,
        }
    }
}

// Convenience constructors
impl Error {
    pub fn context_unavailable(msg: impl Into<String>) -> Self {
        Self::ContextUnavailable(msg.into())
    }

    pub fn emission(msg: impl Into<String>) -> Self {
        Self::Emission(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }
}
