//! Unified error type for LiveHall, and its HTTP rendering.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use livehall_room::RoomError;
use livehall_session::SessionError;
use serde::Serialize;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LiveHallError {
    /// The request carried no usable bearer token.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Token resolution or user registration failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Binding or serving the listener failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

fn session_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::InvalidToken => StatusCode::UNAUTHORIZED,
        SessionError::UnknownUser(_) => StatusCode::NOT_FOUND,
        SessionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl LiveHallError {
    /// The HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            LiveHallError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            LiveHallError::Session(err) => session_status(err),
            LiveHallError::Room(RoomError::NotFound(_) | RoomError::NotMember(..)) => {
                StatusCode::NOT_FOUND
            }
            LiveHallError::Room(RoomError::Identity(err)) => session_status(err),
            LiveHallError::Room(RoomError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            LiveHallError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LiveHallError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Backend details stay in the log.
        let message = if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
            self.to_string()
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use livehall_protocol::{RoomId, UserId};
    use livehall_room::StoreError;

    use super::*;

    #[test]
    fn test_from_room_error() {
        let err: LiveHallError = RoomError::NotFound(RoomId(1)).into();
        assert!(matches!(err, LiveHallError::Room(_)));
        assert_eq!(err.to_string(), "room R-1 not found");
    }

    #[test]
    fn test_from_session_error() {
        let err: LiveHallError = SessionError::InvalidToken.into();
        assert!(matches!(err, LiveHallError::Session(_)));
    }

    #[test]
    fn test_status_maps_auth_failures_to_401() {
        assert_eq!(
            LiveHallError::Unauthorized("missing bearer token").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            LiveHallError::from(SessionError::InvalidToken).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_status_maps_missing_room_and_membership_to_404() {
        assert_eq!(
            LiveHallError::from(RoomError::NotFound(RoomId(3))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LiveHallError::from(RoomError::NotMember(UserId(1), RoomId(3))).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_status_maps_storage_to_500() {
        let err = LiveHallError::from(RoomError::Storage(StoreError::Corrupt("status 9".into())));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = LiveHallError::from(SessionError::Storage("db down".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_into_response_hides_storage_details() {
        let err = LiveHallError::from(RoomError::Storage(StoreError::Corrupt("secret".into())));

        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(body, r#"{"message":"internal server error"}"#);
    }
}
