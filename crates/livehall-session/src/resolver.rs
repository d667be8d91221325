//! The identity hook the rest of LiveHall consumes.
//!
//! Account storage is not the room layer's business. Rooms only ever see a
//! [`UserId`]; turning the bearer token a client presents into that id (and
//! back into a display name for the lobby) goes through the
//! [`IdentityResolver`] trait, so the backend can be swapped:
//! - [`MemoryUserDirectory`](crate::MemoryUserDirectory) for tests and
//!   single-process deployments
//! - `PgUserDirectory` (feature `postgres`) for a shared database
//! - a mock in tests of higher layers

use std::future::Future;

use livehall_protocol::{UserId, UserIdentity};

use crate::SessionError;

/// Maps opaque session tokens to stable user identities.
///
/// # Trait bounds
///
/// - `Send + Sync` → one resolver is shared by every request task.
/// - `'static` → it lives as long as the server.
///
/// The returned futures are `Send` so callers can hold them across
/// `.await` points inside Tokio tasks.
///
/// # Example
///
/// ```rust
/// use livehall_session::{IdentityResolver, SessionError};
/// use livehall_protocol::{UserId, UserIdentity};
///
/// /// Treats the token as the numeric user id. Development only.
/// struct NumericTokens;
///
/// impl IdentityResolver for NumericTokens {
///     async fn resolve(&self, token: &str) -> Result<UserIdentity, SessionError> {
///         let id: u64 = token.parse().map_err(|_| SessionError::InvalidToken)?;
///         self.lookup(UserId(id)).await
///     }
///
///     async fn lookup(&self, user_id: UserId) -> Result<UserIdentity, SessionError> {
///         Ok(UserIdentity { id: user_id, name: format!("user-{}", user_id.0), leader_card_id: 0 })
///     }
///
///     async fn create(&self, _name: &str, _leader_card_id: i64) -> Result<String, SessionError> {
///         Ok("1".into())
///     }
///
///     async fn update(&self, _token: &str, _name: &str, _leader_card_id: i64) -> Result<(), SessionError> {
///         Ok(())
///     }
/// }
/// ```
pub trait IdentityResolver: Send + Sync + 'static {
    /// Returns the user that owns `token`.
    ///
    /// # Errors
    /// [`SessionError::InvalidToken`] if no user holds this token.
    fn resolve(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<UserIdentity, SessionError>> + Send;

    /// Returns the user with the given id.
    ///
    /// Used by the lobby to show names and leader cards of room members.
    ///
    /// # Errors
    /// [`SessionError::UnknownUser`] if the id is not registered.
    fn lookup(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<UserIdentity, SessionError>> + Send;

    /// Registers a new user and returns their freshly generated token.
    fn create(
        &self,
        name: &str,
        leader_card_id: i64,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;

    /// Changes the display attributes of the user owning `token`.
    ///
    /// # Errors
    /// [`SessionError::InvalidToken`] if no user holds this token.
    fn update(
        &self,
        token: &str,
        name: &str,
        leader_card_id: i64,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;
}
