//! Error types for the balance checker
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in the balance checker
#[derive(Debug, Error)]
pub enum BalanceError {
    /// No record exists for the username
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Record exists but could not be parsed
    #[error("Corrupt record for {user}: {reason}")]
    CorruptRecord { user: String, reason: String },

    /// Attempt to create a record that is already on disk
    #[error("Account already exists: {0}")]
    AccountExists(String),

    /// Username cannot be used as a storage key
    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    /// Amount text is not a decimal number
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// Caller lacks the role or balance for the operation
    #[error("Action not allowed: {0}")]
    NotAllowed(String),

    /// Response fragment did not split into tag and payload
    #[error("Malformed response fragment: {0:?}")]
    MalformedResponse(String),

    /// Response fragment carried a tag outside the vocabulary
    #[error("Unknown response tag: {0:?}")]
    UnknownTag(String),

    /// Line framing failure on the wire
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for balance checker operations
pub type Result<T> = std::result::Result<T, BalanceError>;
