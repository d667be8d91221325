//! Transactional storage for rooms and their members.
//!
//! The room layer never mutates shared state directly. Every mutation runs
//! inside a [`RoomTransaction`] that first takes an exclusive lock on the
//! room row ([`RoomTransaction::lock_room`]), so the read-check-write
//! sequences of join, start, end and leave are serialized per room while
//! operations on different rooms proceed in parallel.
//!
//! Dropping a transaction without calling [`RoomTransaction::commit`]
//! discards its writes and releases its locks.

use std::future::Future;

use livehall_protocol::{JudgeCounts, LiveDifficulty, LiveId, RoomId, RoomInfo, UserId};

use crate::{RoomStatus, StoreError};

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::{MemoryRoomStore, MemoryTransaction};
#[cfg(feature = "postgres")]
pub use postgres::{PgRoomStore, PgRoomTransaction};

/// A persisted room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRow {
    pub room_id: RoomId,
    pub live_id: LiveId,
    pub host_id: UserId,
    pub status: RoomStatus,
    /// Always equals the number of member rows for this room.
    pub joined_user_count: u32,
    pub max_user_count: u32,
}

impl RoomRow {
    /// Returns `true` if no seat is left.
    pub fn is_full(&self) -> bool {
        self.joined_user_count >= self.max_user_count
    }

    /// Lobby view of this room.
    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            live_id: self.live_id,
            joined_user_count: self.joined_user_count,
            max_user_count: self.max_user_count,
        }
    }
}

/// A room about to be inserted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub live_id: LiveId,
    pub host_id: UserId,
    pub status: RoomStatus,
    pub joined_user_count: u32,
    pub max_user_count: u32,
}

/// A member's submitted play result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayResult {
    pub score: i64,
    pub judge: JudgeCounts,
}

/// One user's membership in one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub difficulty: LiveDifficulty,
    /// `None` until the member submits their result.
    pub result: Option<PlayResult>,
}

/// A storage backend for rooms.
///
/// Reads outside a transaction see committed state only and take no locks.
pub trait RoomStore: Send + Sync + 'static {
    type Transaction: RoomTransaction;

    /// Opens a new transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, StoreError>> + Send;

    /// Rooms that are `Waiting` and not full, ordered by id.
    ///
    /// [`LiveId::ANY`] matches every live.
    fn open_rooms(
        &self,
        live_id: LiveId,
    ) -> impl Future<Output = Result<Vec<RoomRow>, StoreError>> + Send;

    /// Reads one room.
    fn room(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Option<RoomRow>, StoreError>> + Send;

    /// Reads every member of a room, ordered by user id.
    fn members(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<MemberRow>, StoreError>> + Send;
}

/// A unit of work against a [`RoomStore`].
///
/// A transaction sees its own uncommitted writes. Room locks are held until
/// the transaction commits, rolls back or is dropped.
pub trait RoomTransaction: Send {
    /// Locks the room row for the rest of the transaction and reads it.
    ///
    /// Waits while another transaction holds the lock. Returns `None` if
    /// the room does not exist (or was deleted while waiting).
    fn lock_room(
        &mut self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Option<RoomRow>, StoreError>> + Send;

    /// Inserts a room and returns it with its assigned id.
    fn insert_room(
        &mut self,
        room: NewRoom,
    ) -> impl Future<Output = Result<RoomRow, StoreError>> + Send;

    /// Overwrites the mutable columns (status, joined count) of a room.
    fn update_room(
        &mut self,
        room: &RoomRow,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes a room together with all of its members.
    fn delete_room(&mut self, room_id: RoomId)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Reads one membership.
    fn member(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<MemberRow>, StoreError>> + Send;

    /// Inserts a membership.
    ///
    /// # Errors
    /// [`StoreError::Conflict`] if the user is already a member.
    fn insert_member(
        &mut self,
        member: MemberRow,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Overwrites a membership (difficulty and result).
    fn update_member(
        &mut self,
        member: &MemberRow,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes a membership. Returns `false` if there was none.
    fn delete_member(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Makes all writes visible and releases the locks.
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Discards all writes and releases the locks.
    fn rollback(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
