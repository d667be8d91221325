//! Bearer-token authentication.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use livehall_protocol::UserIdentity;
use livehall_room::RoomStore;
use livehall_session::IdentityResolver;

use crate::LiveHallError;
use crate::server::AppState;

/// The caller of an authenticated endpoint.
///
/// Extracting this resolves the `Authorization: Bearer <token>` header
/// through the server's [`IdentityResolver`]. A missing header, a scheme
/// other than `Bearer`, or an unknown token rejects the request with 401.
pub(crate) struct AuthenticatedUser {
    pub(crate) identity: UserIdentity,
    pub(crate) token: String,
}

/// Returns the token of a `Bearer` authorization header, if any.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_ascii_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") || parts.next().is_some() {
        return None;
    }
    Some(token)
}

impl<S, I> FromRequestParts<Arc<AppState<S, I>>> for AuthenticatedUser
where
    S: RoomStore,
    I: IdentityResolver,
{
    type Rejection = LiveHallError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S, I>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or(LiveHallError::Unauthorized("missing bearer token"))?
            .to_string();

        let identity = state.rooms.identities().resolve(&token).await?;
        Ok(Self { identity, token })
    }
}
