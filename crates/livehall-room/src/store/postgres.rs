//! PostgreSQL-backed [`RoomStore`].
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS room (
//!     room_id           BIGSERIAL PRIMARY KEY,
//!     live_id           BIGINT   NOT NULL,
//!     host_id           BIGINT   NOT NULL,
//!     status            SMALLINT NOT NULL,
//!     joined_user_count BIGINT   NOT NULL,
//!     max_user_count    BIGINT   NOT NULL,
//!     CHECK (joined_user_count BETWEEN 0 AND max_user_count)
//! );
//!
//! CREATE TABLE IF NOT EXISTS room_member (
//!     room_id    BIGINT   NOT NULL REFERENCES room (room_id) ON DELETE CASCADE,
//!     user_id    BIGINT   NOT NULL,
//!     difficulty SMALLINT NOT NULL,
//!     score      BIGINT,
//!     perfect    BIGINT,
//!     great      BIGINT,
//!     good       BIGINT,
//!     bad        BIGINT,
//!     miss       BIGINT,
//!     PRIMARY KEY (room_id, user_id),
//!     CHECK (num_nulls(score, perfect, great, good, bad, miss) IN (0, 6))
//! );
//! ```
//!
//! Counts are `u32` in memory and `BIGINT` here, so every value round-trips;
//! a negative or oversized count read back is reported as corrupt.
//!
//! `lock_room` is `SELECT ... FOR UPDATE`, so the per-room serialization is
//! enforced by the database and holds across server instances.

use livehall_protocol::{JudgeCounts, LiveDifficulty, LiveId, RoomId, UserId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::{MemberRow, NewRoom, PlayResult, RoomRow, RoomStore, RoomTransaction};
use crate::{RoomStatus, StoreError};

const SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS room (
    room_id           BIGSERIAL PRIMARY KEY,
    live_id           BIGINT   NOT NULL,
    host_id           BIGINT   NOT NULL,
    status            SMALLINT NOT NULL,
    joined_user_count BIGINT   NOT NULL,
    max_user_count    BIGINT   NOT NULL,
    CHECK (joined_user_count BETWEEN 0 AND max_user_count)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS room_member (
    room_id    BIGINT   NOT NULL REFERENCES room (room_id) ON DELETE CASCADE,
    user_id    BIGINT   NOT NULL,
    difficulty SMALLINT NOT NULL,
    score      BIGINT,
    perfect    BIGINT,
    great      BIGINT,
    good       BIGINT,
    bad        BIGINT,
    miss       BIGINT,
    PRIMARY KEY (room_id, user_id),
    CHECK (num_nulls(score, perfect, great, good, bad, miss) IN (0, 6))
)"#,
    "CREATE INDEX IF NOT EXISTS room_status_live_idx ON room (status, live_id)",
];

const ROOM_COLUMNS: &str = "room_id, live_id, host_id, status, joined_user_count, max_user_count";
const MEMBER_COLUMNS: &str =
    "room_id, user_id, difficulty, score, perfect, great, good, bad, miss";

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(Box::new(err))
}

const JUDGE_COLUMNS: [&str; JudgeCounts::BUCKETS] = ["perfect", "great", "good", "bad", "miss"];

fn count_from_column(column: &str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} {value}")))
}

fn judge_to_columns(judge: JudgeCounts) -> [i64; JudgeCounts::BUCKETS] {
    judge.to_array().map(i64::from)
}

fn judge_from_columns(values: [i64; JudgeCounts::BUCKETS]) -> Result<JudgeCounts, StoreError> {
    let mut judge = [0u32; JudgeCounts::BUCKETS];
    for ((slot, value), column) in judge.iter_mut().zip(values).zip(JUDGE_COLUMNS) {
        *slot = count_from_column(column, value)?;
    }
    Ok(JudgeCounts::from(judge))
}

fn room_from_row(row: &PgRow) -> Result<RoomRow, StoreError> {
    let room_id: i64 = row.try_get("room_id").map_err(backend)?;
    let live_id: i64 = row.try_get("live_id").map_err(backend)?;
    let host_id: i64 = row.try_get("host_id").map_err(backend)?;
    let status: i16 = row.try_get("status").map_err(backend)?;
    let joined: i64 = row.try_get("joined_user_count").map_err(backend)?;
    let max: i64 = row.try_get("max_user_count").map_err(backend)?;

    Ok(RoomRow {
        room_id: RoomId(room_id as u64),
        live_id: LiveId(live_id as u64),
        host_id: UserId(host_id as u64),
        status: RoomStatus::from_code(status)
            .ok_or_else(|| StoreError::Corrupt(format!("room status code {status}")))?,
        joined_user_count: count_from_column("joined_user_count", joined)?,
        max_user_count: count_from_column("max_user_count", max)?,
    })
}

fn member_from_row(row: &PgRow) -> Result<MemberRow, StoreError> {
    let room_id: i64 = row.try_get("room_id").map_err(backend)?;
    let user_id: i64 = row.try_get("user_id").map_err(backend)?;
    let difficulty: i16 = row.try_get("difficulty").map_err(backend)?;
    let score: Option<i64> = row.try_get("score").map_err(backend)?;

    let difficulty = u8::try_from(difficulty)
        .ok()
        .and_then(|code| LiveDifficulty::try_from(code).ok())
        .ok_or_else(|| StoreError::Corrupt(format!("difficulty code {difficulty}")))?;

    let result = match score {
        None => None,
        Some(score) => {
            let mut values = [0i64; JudgeCounts::BUCKETS];
            for (value, column) in values.iter_mut().zip(JUDGE_COLUMNS) {
                *value = row.try_get(column).map_err(backend)?;
            }
            Some(PlayResult {
                score,
                judge: judge_from_columns(values)?,
            })
        }
    };

    Ok(MemberRow {
        room_id: RoomId(room_id as u64),
        user_id: UserId(user_id as u64),
        difficulty,
        result,
    })
}

/// Room store backed by the `room` and `room_member` tables.
#[derive(Clone)]
pub struct PgRoomStore {
    pool: PgPool,
}

impl PgRoomStore {
    /// Wraps an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the room tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(backend)?;
        }
        Ok(())
    }

    /// Returns the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl RoomStore for PgRoomStore {
    type Transaction = PgRoomTransaction;

    async fn begin(&self) -> Result<PgRoomTransaction, StoreError> {
        let tx = self.pool.begin().await.map_err(backend)?;
        Ok(PgRoomTransaction { tx })
    }

    async fn open_rooms(&self, live_id: LiveId) -> Result<Vec<RoomRow>, StoreError> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM room \
             WHERE status = $1 AND joined_user_count < max_user_count \
             AND ($2::BIGINT = 0 OR live_id = $2) \
             ORDER BY room_id"
        );
        let rows = sqlx::query(&sql)
            .bind(RoomStatus::Waiting.code())
            .bind(live_id.0 as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(room_from_row).collect()
    }

    async fn room(&self, room_id: RoomId) -> Result<Option<RoomRow>, StoreError> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM room WHERE room_id = $1");
        let row = sqlx::query(&sql)
            .bind(room_id.0 as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(room_from_row).transpose()
    }

    async fn members(&self, room_id: RoomId) -> Result<Vec<MemberRow>, StoreError> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM room_member WHERE room_id = $1 ORDER BY user_id");
        let rows = sqlx::query(&sql)
            .bind(room_id.0 as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(member_from_row).collect()
    }
}

/// A database transaction. Dropping it without commit rolls back.
pub struct PgRoomTransaction {
    tx: Transaction<'static, Postgres>,
}

impl RoomTransaction for PgRoomTransaction {
    async fn lock_room(&mut self, room_id: RoomId) -> Result<Option<RoomRow>, StoreError> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM room WHERE room_id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(room_id.0 as i64)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(backend)?;
        row.as_ref().map(room_from_row).transpose()
    }

    async fn insert_room(&mut self, room: NewRoom) -> Result<RoomRow, StoreError> {
        let sql = format!(
            "INSERT INTO room (live_id, host_id, status, joined_user_count, max_user_count) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ROOM_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(room.live_id.0 as i64)
            .bind(room.host_id.0 as i64)
            .bind(room.status.code())
            .bind(i64::from(room.joined_user_count))
            .bind(i64::from(room.max_user_count))
            .fetch_one(&mut *self.tx)
            .await
            .map_err(backend)?;
        room_from_row(&row)
    }

    async fn update_room(&mut self, room: &RoomRow) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE room SET status = $2, joined_user_count = $3 WHERE room_id = $1")
                .bind(room.room_id.0 as i64)
                .bind(room.status.code())
                .bind(i64::from(room.joined_user_count))
                .execute(&mut *self.tx)
                .await
                .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow(format!("room {}", room.room_id)));
        }
        Ok(())
    }

    async fn delete_room(&mut self, room_id: RoomId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM room WHERE room_id = $1")
            .bind(room_id.0 as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn member(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<Option<MemberRow>, StoreError> {
        let sql =
            format!("SELECT {MEMBER_COLUMNS} FROM room_member WHERE room_id = $1 AND user_id = $2");
        let row = sqlx::query(&sql)
            .bind(room_id.0 as i64)
            .bind(user_id.0 as i64)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(backend)?;
        row.as_ref().map(member_from_row).transpose()
    }

    async fn insert_member(&mut self, member: MemberRow) -> Result<(), StoreError> {
        let inserted =
            sqlx::query("INSERT INTO room_member (room_id, user_id, difficulty) VALUES ($1, $2, $3)")
                .bind(member.room_id.0 as i64)
                .bind(member.user_id.0 as i64)
                .bind(i16::from(u8::from(member.difficulty)))
                .execute(&mut *self.tx)
                .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                StoreError::Conflict(format!("user {} already in room {}", member.user_id, member.room_id)),
            ),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(StoreError::MissingRow(format!("room {}", member.room_id)))
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn update_member(&mut self, member: &MemberRow) -> Result<(), StoreError> {
        let judge = member.result.map(|r| judge_to_columns(r.judge));
        let count = |i: usize| judge.map(|j| j[i]);

        let result = sqlx::query(
            "UPDATE room_member SET difficulty = $3, score = $4, \
             perfect = $5, great = $6, good = $7, bad = $8, miss = $9 \
             WHERE room_id = $1 AND user_id = $2",
        )
        .bind(member.room_id.0 as i64)
        .bind(member.user_id.0 as i64)
        .bind(i16::from(u8::from(member.difficulty)))
        .bind(member.result.map(|r| r.score))
        .bind(count(0))
        .bind(count(1))
        .bind(count(2))
        .bind(count(3))
        .bind(count(4))
        .execute(&mut *self.tx)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow(format!(
                "member {} of room {}",
                member.user_id, member.room_id
            )));
        }
        Ok(())
    }

    async fn delete_member(&mut self, room_id: RoomId, user_id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM room_member WHERE room_id = $1 AND user_id = $2")
            .bind(room_id.0 as i64)
            .bind(user_id.0 as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(backend)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judge_columns_hold_full_u32_range() {
        let judge = JudgeCounts::from([u32::MAX, 1 << 31, 0, 7, 1]);

        let columns = judge_to_columns(judge);

        assert_eq!(columns, [4_294_967_295, 2_147_483_648, 0, 7, 1]);
        assert_eq!(judge_from_columns(columns).unwrap(), judge);
    }

    #[test]
    fn test_judge_from_columns_negative_is_corrupt() {
        let result = judge_from_columns([1, 2, -3, 4, 5]);

        assert!(matches!(result, Err(StoreError::Corrupt(msg)) if msg == "good -3"));
    }

    #[test]
    fn test_count_from_column_oversized_is_corrupt() {
        assert_eq!(count_from_column("joined_user_count", 4).unwrap(), 4);
        assert!(matches!(
            count_from_column("joined_user_count", i64::from(u32::MAX) + 1),
            Err(StoreError::Corrupt(_))
        ));
    }
}
