//! In-memory user directory: the default [`IdentityResolver`].
//!
//! Keeps every registered user and an index from session token to user id.
//! Both maps live behind one `tokio::sync::RwLock`, so lookups (the hot path:
//! every authenticated request resolves its token) run concurrently while
//! registrations and updates take the write side briefly.

use std::collections::HashMap;

use livehall_protocol::{UserId, UserIdentity};
use tokio::sync::RwLock;

use crate::token::{generate_token, TokenSource};
use crate::{IdentityResolver, SessionError};

/// A user together with the secret token that authenticates them.
struct UserRecord {
    identity: UserIdentity,
    token: String,
}

/// Directory state guarded by the lock.
///
/// `users` and `tokens` are kept in sync: every record's token has exactly
/// one entry in `tokens` pointing back at it.
struct Directory {
    users: HashMap<UserId, UserRecord>,
    tokens: HashMap<String, UserId>,
    next_id: u64,
    token_source: TokenSource,
}

impl Directory {
    /// Draws tokens until one is not already in use.
    fn unique_token(&mut self) -> String {
        loop {
            let candidate = (self.token_source)();
            if !self.tokens.contains_key(&candidate) {
                return candidate;
            }
            tracing::warn!("session token collision, regenerating");
        }
    }
}

/// Stores users in process memory.
///
/// Nothing survives a restart. Use `PgUserDirectory` when accounts must
/// persist or be shared between server instances.
pub struct MemoryUserDirectory {
    inner: RwLock<Directory>,
}

impl MemoryUserDirectory {
    /// Creates an empty directory using random 128-bit tokens.
    pub fn new() -> Self {
        Self::with_token_source(Box::new(generate_token))
    }

    /// Creates an empty directory that draws tokens from `source`.
    ///
    /// Mainly for tests that need to force token collisions.
    pub fn with_token_source(source: TokenSource) -> Self {
        Self {
            inner: RwLock::new(Directory {
                users: HashMap::new(),
                tokens: HashMap::new(),
                next_id: 1,
                token_source: source,
            }),
        }
    }

    /// Returns the number of registered users.
    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    /// Returns `true` if nobody has registered yet.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.users.is_empty()
    }
}

impl Default for MemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver for MemoryUserDirectory {
    async fn resolve(&self, token: &str) -> Result<UserIdentity, SessionError> {
        let dir = self.inner.read().await;
        dir.tokens
            .get(token)
            .and_then(|id| dir.users.get(id))
            .map(|record| record.identity.clone())
            .ok_or(SessionError::InvalidToken)
    }

    async fn lookup(&self, user_id: UserId) -> Result<UserIdentity, SessionError> {
        self.inner
            .read()
            .await
            .users
            .get(&user_id)
            .map(|record| record.identity.clone())
            .ok_or(SessionError::UnknownUser(user_id))
    }

    async fn create(&self, name: &str, leader_card_id: i64) -> Result<String, SessionError> {
        let mut dir = self.inner.write().await;

        let token = dir.unique_token();
        let id = UserId(dir.next_id);
        dir.next_id += 1;

        dir.tokens.insert(token.clone(), id);
        dir.users.insert(
            id,
            UserRecord {
                identity: UserIdentity {
                    id,
                    name: name.to_string(),
                    leader_card_id,
                },
                token: token.clone(),
            },
        );

        tracing::info!(user_id = %id, "user created");
        Ok(token)
    }

    async fn update(
        &self,
        token: &str,
        name: &str,
        leader_card_id: i64,
    ) -> Result<(), SessionError> {
        let mut dir = self.inner.write().await;
        let id = *dir.tokens.get(token).ok_or(SessionError::InvalidToken)?;
        let record = dir.users.get_mut(&id).ok_or(SessionError::InvalidToken)?;
        debug_assert_eq!(record.token, token);

        record.identity.name = name.to_string();
        record.identity.leader_card_id = leader_card_id;

        tracing::info!(user_id = %id, "user updated");
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================
