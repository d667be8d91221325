//! Error types for the room layer.

use std::error::Error;

use livehall_protocol::{RoomId, UserId};
use livehall_session::SessionError;

/// Failures raised by a [`RoomStore`](crate::RoomStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend itself failed (connection lost, query error, ...).
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn Error + Send + Sync>),

    /// A row the operation expected to exist was not there.
    #[error("missing row: {0}")]
    MissingRow(String),

    /// A write would violate a uniqueness constraint.
    #[error("conflicting row: {0}")]
    Conflict(String),

    /// A persisted value could not be decoded.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Errors that can occur during room operations.
///
/// Admission outcomes of a join (full, disbanded, ...) are not errors;
/// they are reported as a [`JoinRoomResult`](livehall_protocol::JoinRoomResult).
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The user is not a member of this room.
    #[error("user {0} not in room {1}")]
    NotMember(UserId, RoomId),

    /// Resolving a member's identity failed.
    #[error(transparent)]
    Identity(#[from] SessionError),

    /// The room store failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}
