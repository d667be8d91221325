//! PostgreSQL-backed [`IdentityResolver`].
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS users (
//!     id             BIGSERIAL PRIMARY KEY,
//!     name           TEXT   NOT NULL,
//!     token          TEXT   NOT NULL UNIQUE,
//!     leader_card_id BIGINT NOT NULL
//! );
//! ```
//!
//! The `UNIQUE` constraint on `token` is what detects collisions: an insert
//! that violates it is retried with a fresh token.

use livehall_protocol::{UserId, UserIdentity};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::token::generate_token;
use crate::{IdentityResolver, SessionError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             BIGSERIAL PRIMARY KEY,
    name           TEXT   NOT NULL,
    token          TEXT   NOT NULL UNIQUE,
    leader_card_id BIGINT NOT NULL
)
"#;

fn storage(err: sqlx::Error) -> SessionError {
    SessionError::Storage(Box::new(err))
}

fn identity_from_row(row: &PgRow) -> Result<UserIdentity, SessionError> {
    let id: i64 = row.try_get("id").map_err(storage)?;
    Ok(UserIdentity {
        id: UserId(id as u64),
        name: row.try_get("name").map_err(storage)?,
        leader_card_id: row.try_get("leader_card_id").map_err(storage)?,
    })
}

/// User directory stored in the `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Wraps an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `users` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), SessionError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    /// Returns the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl IdentityResolver for PgUserDirectory {
    async fn resolve(&self, token: &str) -> Result<UserIdentity, SessionError> {
        let row = sqlx::query("SELECT id, name, leader_card_id FROM users WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .ok_or(SessionError::InvalidToken)?;
        identity_from_row(&row)
    }

    async fn lookup(&self, user_id: UserId) -> Result<UserIdentity, SessionError> {
        let row = sqlx::query("SELECT id, name, leader_card_id FROM users WHERE id = $1")
            .bind(user_id.0 as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .ok_or(SessionError::UnknownUser(user_id))?;
        identity_from_row(&row)
    }

    async fn create(&self, name: &str, leader_card_id: i64) -> Result<String, SessionError> {
        loop {
            let token = generate_token();
            let inserted = sqlx::query(
                "INSERT INTO users (name, token, leader_card_id) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(name)
            .bind(&token)
            .bind(leader_card_id)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok(row) => {
                    let id: i64 = row.try_get("id").map_err(storage)?;
                    tracing::info!(user_id = %UserId(id as u64), "user created");
                    return Ok(token);
                }
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    tracing::warn!("session token collision, regenerating");
                }
                Err(e) => return Err(storage(e)),
            }
        }
    }

    async fn update(
        &self,
        token: &str,
        name: &str,
        leader_card_id: i64,
    ) -> Result<(), SessionError> {
        let result =
            sqlx::query("UPDATE users SET name = $1, leader_card_id = $2 WHERE token = $3")
                .bind(name)
                .bind(leader_card_id)
                .bind(token)
                .execute(&self.pool)
                .await
                .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(SessionError::InvalidToken);
        }
        Ok(())
    }
}
