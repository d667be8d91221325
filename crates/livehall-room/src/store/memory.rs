//! In-process [`RoomStore`].
//!
//! Committed rows live in two ordered maps behind a `parking_lot::RwLock`
//! that is only ever held for the duration of a map operation, never across
//! an `.await`. Row locks are one `tokio::sync::Mutex` per room, kept in a
//! `DashMap` registry so transactions on different rooms never contend.
//!
//! A transaction buffers its writes in a private write set and applies them
//! to the committed maps in one step at commit, while still holding its
//! room locks. Readers outside a transaction therefore never observe a
//! half-applied operation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use livehall_protocol::{LiveId, RoomId, UserId};
use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{MemberRow, NewRoom, RoomRow, RoomStore, RoomTransaction};
use crate::{RoomStatus, StoreError};

type MemberKey = (RoomId, UserId);

#[derive(Default)]
struct Tables {
    rooms: BTreeMap<RoomId, RoomRow>,
    members: BTreeMap<MemberKey, MemberRow>,
}

impl Tables {
    fn members_of(&self, room_id: RoomId) -> impl Iterator<Item = &MemberRow> {
        self.members
            .range((room_id, UserId(0))..=(room_id, UserId(u64::MAX)))
            .map(|(_, row)| row)
    }
}

struct Shared {
    tables: RwLock<Tables>,
    locks: DashMap<RoomId, Arc<Mutex<()>>>,
    next_room_id: AtomicU64,
}

impl Shared {
    /// Drops the registry entry for `room_id` unless another transaction
    /// holds or waits on its mutex.
    fn forget_lock(&self, room_id: RoomId) {
        self.locks
            .remove_if(&room_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Stores rooms in process memory.
///
/// Cheap to clone; clones share the same tables.
#[derive(Clone)]
pub struct MemoryRoomStore {
    shared: Arc<Shared>,
}

impl MemoryRoomStore {
    /// Creates an empty store. Room ids start at 1.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: RwLock::new(Tables::default()),
                locks: DashMap::new(),
                next_room_id: AtomicU64::new(1),
            }),
        }
    }

    /// Number of committed rooms.
    pub fn room_count(&self) -> usize {
        self.shared.tables.read().rooms.len()
    }
}

impl Default for MemoryRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomStore for MemoryRoomStore {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        Ok(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            held: HashMap::new(),
            rooms: BTreeMap::new(),
            members: BTreeMap::new(),
            finished: false,
        })
    }

    async fn open_rooms(&self, live_id: LiveId) -> Result<Vec<RoomRow>, StoreError> {
        let tables = self.shared.tables.read();
        Ok(tables
            .rooms
            .values()
            .filter(|room| room.status == RoomStatus::Waiting && !room.is_full())
            .filter(|room| live_id.is_any() || room.live_id == live_id)
            .cloned()
            .collect())
    }

    async fn room(&self, room_id: RoomId) -> Result<Option<RoomRow>, StoreError> {
        Ok(self.shared.tables.read().rooms.get(&room_id).cloned())
    }

    async fn members(&self, room_id: RoomId) -> Result<Vec<MemberRow>, StoreError> {
        Ok(self
            .shared
            .tables
            .read()
            .members_of(room_id)
            .cloned()
            .collect())
    }
}

/// A transaction against a [`MemoryRoomStore`].
///
/// In the write sets, `Some(row)` is an insert or update and `None` a delete.
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    held: HashMap<RoomId, OwnedMutexGuard<()>>,
    rooms: BTreeMap<RoomId, Option<RoomRow>>,
    members: BTreeMap<MemberKey, Option<MemberRow>>,
    finished: bool,
}

impl MemoryTransaction {
    fn is_dirty(&self) -> bool {
        !self.rooms.is_empty() || !self.members.is_empty()
    }

    fn room_deleted(&self, room_id: RoomId) -> bool {
        matches!(self.rooms.get(&room_id), Some(None))
    }

    fn read_room(&self, room_id: RoomId) -> Option<RoomRow> {
        match self.rooms.get(&room_id) {
            Some(pending) => pending.clone(),
            None => self.shared.tables.read().rooms.get(&room_id).cloned(),
        }
    }

    fn read_member(&self, room_id: RoomId, user_id: UserId) -> Option<MemberRow> {
        if self.room_deleted(room_id) {
            return None;
        }
        match self.members.get(&(room_id, user_id)) {
            Some(pending) => pending.clone(),
            None => self
                .shared
                .tables
                .read()
                .members
                .get(&(room_id, user_id))
                .cloned(),
        }
    }
}

impl RoomTransaction for MemoryTransaction {
    async fn lock_room(&mut self, room_id: RoomId) -> Result<Option<RoomRow>, StoreError> {
        if self.held.contains_key(&room_id) {
            return Ok(self.read_room(room_id));
        }

        let lock = Arc::clone(&self.shared.locks.entry(room_id).or_default());
        let guard = lock.lock_owned().await;
        let Some(room) = self.read_room(room_id) else {
            // Nothing to protect; keep unknown ids out of the registry.
            drop(guard);
            self.shared.forget_lock(room_id);
            return Ok(None);
        };

        self.held.insert(room_id, guard);
        Ok(Some(room))
    }

    async fn insert_room(&mut self, room: NewRoom) -> Result<RoomRow, StoreError> {
        let room_id = RoomId(self.shared.next_room_id.fetch_add(1, Ordering::Relaxed));
        let row = RoomRow {
            room_id,
            live_id: room.live_id,
            host_id: room.host_id,
            status: room.status,
            joined_user_count: room.joined_user_count,
            max_user_count: room.max_user_count,
        };
        self.rooms.insert(room_id, Some(row.clone()));
        Ok(row)
    }

    async fn update_room(&mut self, room: &RoomRow) -> Result<(), StoreError> {
        if self.read_room(room.room_id).is_none() {
            return Err(StoreError::MissingRow(format!("room {}", room.room_id)));
        }
        self.rooms.insert(room.room_id, Some(room.clone()));
        Ok(())
    }

    async fn delete_room(&mut self, room_id: RoomId) -> Result<(), StoreError> {
        self.members.retain(|(rid, _), _| *rid != room_id);
        self.rooms.insert(room_id, None);
        Ok(())
    }

    async fn member(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<Option<MemberRow>, StoreError> {
        Ok(self.read_member(room_id, user_id))
    }

    async fn insert_member(&mut self, member: MemberRow) -> Result<(), StoreError> {
        if self.read_room(member.room_id).is_none() {
            return Err(StoreError::MissingRow(format!("room {}", member.room_id)));
        }
        if self.read_member(member.room_id, member.user_id).is_some() {
            return Err(StoreError::Conflict(format!(
                "user {} already in room {}",
                member.user_id, member.room_id
            )));
        }
        self.members
            .insert((member.room_id, member.user_id), Some(member));
        Ok(())
    }

    async fn update_member(&mut self, member: &MemberRow) -> Result<(), StoreError> {
        if self.read_member(member.room_id, member.user_id).is_none() {
            return Err(StoreError::MissingRow(format!(
                "member {} of room {}",
                member.user_id, member.room_id
            )));
        }
        self.members
            .insert((member.room_id, member.user_id), Some(member.clone()));
        Ok(())
    }

    async fn delete_member(&mut self, room_id: RoomId, user_id: UserId) -> Result<bool, StoreError> {
        if self.read_member(room_id, user_id).is_none() {
            return Ok(false);
        }
        self.members.insert((room_id, user_id), None);
        Ok(true)
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        let rooms = std::mem::take(&mut self.rooms);
        let members = std::mem::take(&mut self.members);
        let mut deleted = Vec::new();

        {
            let mut tables = self.shared.tables.write();
            for (key, pending) in members {
                match pending {
                    Some(row) => tables.members.insert(key, row),
                    None => tables.members.remove(&key),
                };
            }
            for (room_id, pending) in rooms {
                match pending {
                    Some(row) => {
                        tables.rooms.insert(room_id, row);
                    }
                    None => {
                        tables.rooms.remove(&room_id);
                        tables.members.retain(|(rid, _), _| *rid != room_id);
                        deleted.push(room_id);
                    }
                }
            }
        }

        let locks = self.held.len();
        self.held.clear();
        // Queued waiters keep the entry alive and prune it once they find the room gone.
        for room_id in deleted {
            self.shared.forget_lock(room_id);
        }

        self.finished = true;
        tracing::trace!(locks, "transaction committed");
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), StoreError> {
        self.rooms.clear();
        self.members.clear();
        self.finished = true;
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.finished && self.is_dirty() {
            tracing::debug!("transaction dropped without commit, writes discarded");
        }
    }
}
