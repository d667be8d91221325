//! Error types for the session layer.

use livehall_protocol::UserId;

/// Errors that can occur while resolving or managing user identities.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The token does not belong to any user.
    /// The transport layer answers this with 401.
    #[error("invalid session token")]
    InvalidToken,

    /// No user exists with the given id.
    #[error("user {0} not found")]
    UnknownUser(UserId),

    /// The backing store failed (connection lost, query rejected, ...).
    #[error("identity storage failure: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}
