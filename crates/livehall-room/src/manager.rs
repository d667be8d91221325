//! Room manager: the lifecycle operations of live rooms.

use std::sync::Arc;

use livehall_protocol::{
    JoinRoomResult, JudgeCounts, LiveDifficulty, LiveId, ResultUser, RoomId, RoomInfo, RoomUser,
    RoomWaitResponse, UserId, WaitRoomStatus,
};
use livehall_session::IdentityResolver;

use crate::store::{MemberRow, NewRoom, PlayResult, RoomRow, RoomStore, RoomTransaction};
use crate::{MAX_USER_COUNT, RoomError, RoomStatus};

/// Decides whether a room admits one more member.
///
/// Checked in order: a room with no members or a dissolved room reports
/// `Disbanded`; a full room or one whose live already started reports
/// `RoomFull`. Only a `Waiting` room with a free seat is admitted.
pub fn admission(room: &RoomRow) -> Result<(), JoinRoomResult> {
    if room.joined_user_count == 0 || room.status == RoomStatus::Dissolved {
        return Err(JoinRoomResult::Disbanded);
    }
    if room.is_full() || !room.status.is_joinable() {
        return Err(JoinRoomResult::RoomFull);
    }
    Ok(())
}

/// Creates rooms and moves users through them.
///
/// Every mutating operation runs in one store transaction that starts by
/// locking the room row, so concurrent requests against the same room are
/// applied one at a time and `joined_user_count` always equals the number
/// of member rows.
pub struct RoomManager<S: RoomStore, I: IdentityResolver> {
    store: S,
    identities: Arc<I>,
}

impl<S: RoomStore, I: IdentityResolver> RoomManager<S, I> {
    /// Creates a manager over `store`, resolving member names via `identities`.
    pub fn new(store: S, identities: Arc<I>) -> Self {
        Self { store, identities }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the identity resolver.
    pub fn identities(&self) -> &Arc<I> {
        &self.identities
    }

    /// Creates a room hosted by `host_id`, who becomes its first member.
    pub async fn create(
        &self,
        host_id: UserId,
        live_id: LiveId,
        difficulty: LiveDifficulty,
    ) -> Result<RoomId, RoomError> {
        let mut tx = self.store.begin().await?;
        let room = tx
            .insert_room(NewRoom {
                live_id,
                host_id,
                status: RoomStatus::Waiting,
                joined_user_count: 1,
                max_user_count: MAX_USER_COUNT,
            })
            .await?;
        tx.insert_member(MemberRow {
            room_id: room.room_id,
            user_id: host_id,
            difficulty,
            result: None,
        })
        .await?;
        tx.commit().await?;

        tracing::info!(room_id = %room.room_id, %live_id, host = %host_id, "room created");
        Ok(room.room_id)
    }

    /// Lists rooms that can still be joined.
    ///
    /// [`LiveId::ANY`] lists open rooms of every live.
    pub async fn list(&self, live_id: LiveId) -> Result<Vec<RoomInfo>, RoomError> {
        let rooms = self.store.open_rooms(live_id).await?;
        Ok(rooms.iter().map(RoomRow::info).collect())
    }

    /// Adds `user_id` to a room.
    ///
    /// Rejections are reported in the result, not as errors. A missing room
    /// or a user who is already a member yields `OtherError`.
    pub async fn join(
        &self,
        user_id: UserId,
        room_id: RoomId,
        difficulty: LiveDifficulty,
    ) -> Result<JoinRoomResult, RoomError> {
        let mut tx = self.store.begin().await?;

        let Some(mut room) = tx.lock_room(room_id).await? else {
            tracing::debug!(%room_id, user = %user_id, "join: room not found");
            return Ok(JoinRoomResult::OtherError);
        };

        if let Err(rejection) = admission(&room) {
            tracing::debug!(%room_id, user = %user_id, ?rejection, status = %room.status, "join rejected");
            return Ok(rejection);
        }

        if tx.member(room_id, user_id).await?.is_some() {
            tracing::debug!(%room_id, user = %user_id, "join: already a member");
            return Ok(JoinRoomResult::OtherError);
        }

        tx.insert_member(MemberRow {
            room_id,
            user_id,
            difficulty,
            result: None,
        })
        .await?;
        room.joined_user_count += 1;
        tx.update_room(&room).await?;
        tx.commit().await?;

        tracing::info!(%room_id, user = %user_id, joined = room.joined_user_count, "user joined room");
        Ok(JoinRoomResult::Ok)
    }

    /// Polls a room's status and member list as seen by `user_id`.
    ///
    /// A room that no longer exists reports `Dissolution` with no members.
    pub async fn wait(&self, user_id: UserId, room_id: RoomId) -> Result<RoomWaitResponse, RoomError> {
        let Some(room) = self.store.room(room_id).await? else {
            return Ok(RoomWaitResponse {
                status: WaitRoomStatus::Dissolution,
                room_user_list: Vec::new(),
            });
        };

        let members = self.store.members(room_id).await?;
        let mut room_user_list = Vec::with_capacity(members.len());
        for member in members {
            let identity = self.identities.lookup(member.user_id).await?;
            room_user_list.push(RoomUser {
                user_id: member.user_id,
                name: identity.name,
                leader_card_id: identity.leader_card_id,
                select_difficulty: member.difficulty,
                is_me: member.user_id == user_id,
                is_host: member.user_id == room.host_id,
            });
        }

        Ok(RoomWaitResponse {
            status: room.status.into(),
            room_user_list,
        })
    }

    /// Starts the live. Only the host can; anyone else is silently ignored.
    pub async fn start(&self, user_id: UserId, room_id: RoomId) -> Result<(), RoomError> {
        let mut tx = self.store.begin().await?;
        let mut room = tx
            .lock_room(room_id)
            .await?
            .ok_or(RoomError::NotFound(room_id))?;

        if room.host_id != user_id {
            tracing::debug!(%room_id, user = %user_id, "start ignored: not the host");
            return Ok(());
        }
        if !room.status.can_transition_to(RoomStatus::LiveStart) {
            tracing::debug!(%room_id, status = %room.status, "start ignored: room not waiting");
            return Ok(());
        }

        room.status = RoomStatus::LiveStart;
        tx.update_room(&room).await?;
        tx.commit().await?;

        tracing::info!(%room_id, "live started");
        Ok(())
    }

    /// Records the caller's play result. A later submission overwrites it.
    pub async fn end(
        &self,
        user_id: UserId,
        room_id: RoomId,
        score: i64,
        judge: JudgeCounts,
    ) -> Result<(), RoomError> {
        let mut tx = self.store.begin().await?;
        tx.lock_room(room_id)
            .await?
            .ok_or(RoomError::NotFound(room_id))?;

        let mut member = tx
            .member(room_id, user_id)
            .await?
            .ok_or(RoomError::NotMember(user_id, room_id))?;
        member.result = Some(PlayResult { score, judge });
        tx.update_member(&member).await?;
        tx.commit().await?;

        tracing::info!(%room_id, user = %user_id, score, "result submitted");
        Ok(())
    }

    /// Returns every member's result once all members have submitted.
    ///
    /// Until then, or for a room with no members, the list is empty.
    pub async fn result(&self, room_id: RoomId) -> Result<Vec<ResultUser>, RoomError> {
        let members = self.store.members(room_id).await?;

        let results: Option<Vec<ResultUser>> = members
            .iter()
            .map(|member| {
                member.result.map(|result| ResultUser {
                    user_id: member.user_id,
                    judge_count_list: result.judge,
                    score: result.score,
                })
            })
            .collect();

        Ok(results.unwrap_or_default())
    }

    /// Removes `user_id` from a room.
    ///
    /// When the host leaves, the room is dissolved. When the last member
    /// leaves, the room is deleted.
    pub async fn leave(&self, user_id: UserId, room_id: RoomId) -> Result<(), RoomError> {
        let mut tx = self.store.begin().await?;
        let mut room = tx
            .lock_room(room_id)
            .await?
            .ok_or(RoomError::NotFound(room_id))?;

        if !tx.delete_member(room_id, user_id).await? {
            return Err(RoomError::NotMember(user_id, room_id));
        }

        if room.joined_user_count <= 1 {
            tx.delete_room(room_id).await?;
            tx.commit().await?;
            tracing::info!(%room_id, user = %user_id, "last member left, room deleted");
            return Ok(());
        }

        room.joined_user_count -= 1;
        if room.host_id == user_id && room.status.can_transition_to(RoomStatus::Dissolved) {
            room.status = RoomStatus::Dissolved;
            tracing::info!(%room_id, host = %user_id, "host left, room dissolved");
        }
        tx.update_room(&room).await?;
        tx.commit().await?;

        tracing::info!(%room_id, user = %user_id, joined = room.joined_user_count, "user left room");
        Ok(())
    }
}
