//! IrisFarm error types.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FarmError>;

/// Everything that can go wrong while farming.
#[derive(Debug, Error)]
pub enum FarmError {
    /// Configuration is missing or malformed.
    #[error("config error: {0}")]
    Config(String),

    /// The messaging platform rejected or dropped a request.
    #[error("transport error: {0}")]
    Transport(String),

    /// Flood control — the platform told us how long to wait.
    #[error("rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    /// The target chat cannot be resolved or reached.
    #[error("chat access error: {0}")]
    ChatAccess(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
