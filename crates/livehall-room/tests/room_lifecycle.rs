//! Integration tests for the room lifecycle over the in-memory store.

use std::sync::Arc;

use futures_util::future::join_all;
use livehall_protocol::{
    JoinRoomResult, JudgeCounts, LiveDifficulty, LiveId, RoomId, UserId, WaitRoomStatus,
};
use livehall_room::{MAX_USER_COUNT, MemoryRoomStore, RoomError, RoomManager, RoomStatus, RoomStore};
use livehall_session::{IdentityResolver, MemoryUserDirectory};

type Manager = RoomManager<MemoryRoomStore, MemoryUserDirectory>;

// =========================================================================
// Helper
// =========================================================================

const LIVE: LiveId = LiveId(1001);

/// Registers `users` users (ids 1..=users) and returns a manager over them.
async fn setup(users: usize) -> Manager {
    let directory = Arc::new(MemoryUserDirectory::new());
    for i in 1..=users {
        directory.create(&format!("user{i}"), i as i64).await.unwrap();
    }
    RoomManager::new(MemoryRoomStore::new(), directory)
}

fn uid(id: u64) -> UserId {
    UserId(id)
}

async fn status_of(mgr: &Manager, room: RoomId) -> Option<RoomStatus> {
    mgr.store().room(room).await.unwrap().map(|r| r.status)
}

async fn member_ids(mgr: &Manager, room: RoomId) -> Vec<UserId> {
    mgr.store()
        .members(room)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.user_id)
        .collect()
}

// =========================================================================
// create / list
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_unique_ids_and_host_is_member() {
    let mgr = setup(2).await;

    let r1 = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    let r2 = mgr.create(uid(2), LIVE, LiveDifficulty::Hard).await.unwrap();

    assert_ne!(r1, r2);
    assert_eq!(member_ids(&mgr, r1).await, vec![uid(1)]);
    let room = mgr.store().room(r1).await.unwrap().unwrap();
    assert_eq!(room.joined_user_count, 1);
    assert_eq!(room.max_user_count, MAX_USER_COUNT);
    assert_eq!(room.status, RoomStatus::Waiting);
}

#[tokio::test]
async fn test_list_filters_by_live_and_any_matches_all() {
    let mgr = setup(2).await;
    let r1 = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    let r2 = mgr.create(uid(2), LiveId(2002), LiveDifficulty::Normal).await.unwrap();

    let for_live: Vec<_> = mgr.list(LIVE).await.unwrap().into_iter().map(|r| r.room_id).collect();
    let any: Vec<_> = mgr.list(LiveId::ANY).await.unwrap().into_iter().map(|r| r.room_id).collect();

    assert_eq!(for_live, vec![r1]);
    assert_eq!(any, vec![r1, r2]);
}

#[tokio::test]
async fn test_list_hides_started_and_full_rooms() {
    let mgr = setup(6).await;
    let started = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    mgr.start(uid(1), started).await.unwrap();

    let full = mgr.create(uid(2), LIVE, LiveDifficulty::Normal).await.unwrap();
    for u in 3..=5 {
        assert_eq!(
            mgr.join(uid(u), full, LiveDifficulty::Normal).await.unwrap(),
            JoinRoomResult::Ok
        );
    }

    assert!(mgr.list(LIVE).await.unwrap().is_empty());
}

// =========================================================================
// join
// =========================================================================

#[tokio::test]
async fn test_join_missing_room_is_other_error() {
    let mgr = setup(1).await;

    let result = mgr.join(uid(1), RoomId(999), LiveDifficulty::Normal).await.unwrap();

    assert_eq!(result, JoinRoomResult::OtherError);
}

#[tokio::test]
async fn test_join_twice_is_other_error_and_count_unchanged() {
    let mgr = setup(2).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();

    assert_eq!(mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap(), JoinRoomResult::Ok);
    assert_eq!(
        mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap(),
        JoinRoomResult::OtherError
    );

    let row = mgr.store().room(room).await.unwrap().unwrap();
    assert_eq!(row.joined_user_count, 2);
}

#[tokio::test]
async fn test_join_at_max_capacity_is_room_full() {
    let mgr = setup(5).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    for u in 2..=4 {
        mgr.join(uid(u), room, LiveDifficulty::Normal).await.unwrap();
    }

    let result = mgr.join(uid(5), room, LiveDifficulty::Normal).await.unwrap();

    assert_eq!(result, JoinRoomResult::RoomFull);
    assert_eq!(member_ids(&mgr, room).await.len(), 4);
}

#[tokio::test]
async fn test_join_after_live_start_is_room_full() {
    let mgr = setup(2).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    mgr.start(uid(1), room).await.unwrap();

    let result = mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap();

    assert_eq!(result, JoinRoomResult::RoomFull);
}

#[tokio::test]
async fn test_join_dissolved_room_is_disbanded() {
    let mgr = setup(3).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap();
    mgr.leave(uid(1), room).await.unwrap();

    let result = mgr.join(uid(3), room, LiveDifficulty::Normal).await.unwrap();

    assert_eq!(result, JoinRoomResult::Disbanded);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_never_overfill_room() {
    let mgr = Arc::new(setup(21).await);
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();

    let joins = (2..=21).map(|u| {
        let mgr = Arc::clone(&mgr);
        tokio::spawn(async move { mgr.join(uid(u), room, LiveDifficulty::Hard).await })
    });
    let results: Vec<JoinRoomResult> = join_all(joins)
        .await
        .into_iter()
        .map(|handle| handle.unwrap().unwrap())
        .collect();

    let admitted = results.iter().filter(|r| **r == JoinRoomResult::Ok).count();
    let rejected = results.iter().filter(|r| **r == JoinRoomResult::RoomFull).count();
    assert_eq!(admitted, 3);
    assert_eq!(rejected, 17);

    let row = mgr.store().room(room).await.unwrap().unwrap();
    assert_eq!(row.joined_user_count, MAX_USER_COUNT);
    assert_eq!(member_ids(&mgr, room).await.len(), MAX_USER_COUNT as usize);
}

// =========================================================================
// wait
// =========================================================================

#[tokio::test]
async fn test_wait_reports_members_with_me_and_host_flags() {
    let mgr = setup(2).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    mgr.join(uid(2), room, LiveDifficulty::Hard).await.unwrap();

    let view = mgr.wait(uid(2), room).await.unwrap();

    assert_eq!(view.status, WaitRoomStatus::Waiting);
    assert_eq!(view.room_user_list.len(), 2);
    let host = &view.room_user_list[0];
    assert_eq!(host.user_id, uid(1));
    assert_eq!(host.name, "user1");
    assert!(host.is_host && !host.is_me);
    let me = &view.room_user_list[1];
    assert_eq!(me.select_difficulty, LiveDifficulty::Hard);
    assert_eq!(me.leader_card_id, 2);
    assert!(me.is_me && !me.is_host);
}

#[tokio::test]
async fn test_wait_missing_room_reports_dissolution() {
    let mgr = setup(1).await;

    let view = mgr.wait(uid(1), RoomId(42)).await.unwrap();

    assert_eq!(view.status, WaitRoomStatus::Dissolution);
    assert!(view.room_user_list.is_empty());
}

// =========================================================================
// start
// =========================================================================

#[tokio::test]
async fn test_start_by_non_host_is_ignored() {
    let mgr = setup(2).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap();

    mgr.start(uid(2), room).await.unwrap();

    assert_eq!(status_of(&mgr, room).await, Some(RoomStatus::Waiting));
}

#[tokio::test]
async fn test_start_missing_room_is_not_found() {
    let mgr = setup(1).await;

    let result = mgr.start(uid(1), RoomId(7)).await;

    assert!(matches!(result, Err(RoomError::NotFound(RoomId(7)))));
}

#[tokio::test]
async fn test_start_dissolved_room_stays_dissolved() {
    let mgr = setup(2).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap();
    mgr.leave(uid(1), room).await.unwrap();

    // The former host is no longer a member but still recorded as host.
    mgr.start(uid(1), room).await.unwrap();

    assert_eq!(status_of(&mgr, room).await, Some(RoomStatus::Dissolved));
}

#[tokio::test]
async fn test_start_twice_by_host_is_noop() {
    let mgr = setup(2).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap();

    mgr.start(uid(1), room).await.unwrap();
    mgr.start(uid(1), room).await.unwrap();

    assert_eq!(status_of(&mgr, room).await, Some(RoomStatus::LiveStart));
    let row = mgr.store().room(room).await.unwrap().unwrap();
    assert_eq!(row.joined_user_count, 2);
    assert_eq!(mgr.wait(uid(2), room).await.unwrap().status, WaitRoomStatus::LiveStart);
}

// =========================================================================
// end / result
// =========================================================================

#[tokio::test]
async fn test_result_empty_until_every_member_submitted() {
    let mgr = setup(2).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap();
    mgr.start(uid(1), room).await.unwrap();

    mgr.end(uid(1), room, 9000, JudgeCounts::from([100, 10, 1, 0, 0]))
        .await
        .unwrap();
    assert!(mgr.result(room).await.unwrap().is_empty());

    mgr.end(uid(2), room, 7000, JudgeCounts::from([80, 20, 5, 2, 4]))
        .await
        .unwrap();
    let results = mgr.result(room).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].user_id, uid(1));
    assert_eq!(results[0].score, 9000);
    assert_eq!(results[1].judge_count_list.to_array(), [80, 20, 5, 2, 4]);
}

#[tokio::test]
async fn test_end_resubmission_overwrites_result() {
    let mgr = setup(1).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();

    mgr.end(uid(1), room, 1, JudgeCounts::default()).await.unwrap();
    mgr.end(uid(1), room, 2, JudgeCounts::default()).await.unwrap();

    let results = mgr.result(room).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].score, 2);
}

#[tokio::test]
async fn test_end_by_non_member_is_not_member() {
    let mgr = setup(2).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();

    let result = mgr.end(uid(2), room, 1, JudgeCounts::default()).await;

    assert!(matches!(result, Err(RoomError::NotMember(UserId(2), _))));
}

#[tokio::test]
async fn test_result_of_missing_room_is_empty() {
    let mgr = setup(0).await;

    assert!(mgr.result(RoomId(5)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_result_ignores_member_who_left_unfinished() {
    let mgr = setup(3).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap();
    mgr.join(uid(3), room, LiveDifficulty::Hard).await.unwrap();
    mgr.start(uid(1), room).await.unwrap();

    mgr.end(uid(1), room, 500, JudgeCounts::from([50, 0, 0, 0, 0]))
        .await
        .unwrap();
    mgr.end(uid(2), room, 400, JudgeCounts::from([40, 0, 0, 0, 0]))
        .await
        .unwrap();
    assert!(mgr.result(room).await.unwrap().is_empty(), "user3 has not submitted");

    mgr.leave(uid(3), room).await.unwrap();
    let results = mgr.result(room).await.unwrap();

    let ids: Vec<_> = results.iter().map(|r| r.user_id).collect();
    assert_eq!(ids, vec![uid(1), uid(2)]);
    assert_eq!(results[1].score, 400);
}

// =========================================================================
// leave
// =========================================================================

#[tokio::test]
async fn test_leave_by_member_decrements_count() {
    let mgr = setup(3).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap();
    mgr.join(uid(3), room, LiveDifficulty::Normal).await.unwrap();

    mgr.leave(uid(3), room).await.unwrap();

    let row = mgr.store().room(room).await.unwrap().unwrap();
    assert_eq!(row.joined_user_count, 2);
    assert_eq!(row.status, RoomStatus::Waiting);
    assert_eq!(member_ids(&mgr, room).await, vec![uid(1), uid(2)]);
}

#[tokio::test]
async fn test_leave_by_host_dissolves_room() {
    let mgr = setup(2).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap();

    mgr.leave(uid(1), room).await.unwrap();

    assert_eq!(status_of(&mgr, room).await, Some(RoomStatus::Dissolved));
    let view = mgr.wait(uid(2), room).await.unwrap();
    assert_eq!(view.status, WaitRoomStatus::Dissolution);
    assert_eq!(view.room_user_list.len(), 1);
}

#[tokio::test]
async fn test_last_member_leaving_deletes_room() {
    let mgr = setup(2).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();

    mgr.leave(uid(1), room).await.unwrap();

    assert_eq!(mgr.store().room(room).await.unwrap(), None);
    assert!(mgr.list(LiveId::ANY).await.unwrap().is_empty());
    assert_eq!(
        mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap(),
        JoinRoomResult::OtherError
    );
}

#[tokio::test]
async fn test_leave_by_non_member_changes_nothing() {
    let mgr = setup(3).await;
    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    mgr.join(uid(2), room, LiveDifficulty::Normal).await.unwrap();

    let result = mgr.leave(uid(3), room).await;

    assert!(matches!(result, Err(RoomError::NotMember(UserId(3), _))));
    let row = mgr.store().room(room).await.unwrap().unwrap();
    assert_eq!(row.joined_user_count, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_leaves_keep_count_consistent() {
    for _ in 0..25 {
        let mgr = Arc::new(setup(4).await);
        let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
        for u in 2..=4 {
            mgr.join(uid(u), room, LiveDifficulty::Normal).await.unwrap();
        }

        let leaves = (2..=4).map(|u| {
            let mgr = Arc::clone(&mgr);
            tokio::spawn(async move { mgr.leave(uid(u), room).await })
        });
        for outcome in join_all(leaves).await {
            outcome.unwrap().unwrap();
        }

        let row = mgr.store().room(room).await.unwrap().unwrap();
        assert_eq!(row.joined_user_count, 1);
        assert_eq!(row.status, RoomStatus::Waiting);
        assert_eq!(member_ids(&mgr, room).await, vec![uid(1)]);

        mgr.leave(uid(1), room).await.unwrap();
        assert_eq!(mgr.store().room(room).await.unwrap(), None);
        assert!(member_ids(&mgr, room).await.is_empty());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_leaves_by_everyone_delete_room_once() {
    for _ in 0..25 {
        let mgr = Arc::new(setup(4).await);
        let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
        for u in 2..=4 {
            mgr.join(uid(u), room, LiveDifficulty::Normal).await.unwrap();
        }

        let leaves = (1..=4).map(|u| {
            let mgr = Arc::clone(&mgr);
            tokio::spawn(async move { mgr.leave(uid(u), room).await })
        });
        for outcome in join_all(leaves).await {
            outcome.unwrap().unwrap();
        }

        assert_eq!(mgr.store().room(room).await.unwrap(), None);
        assert!(member_ids(&mgr, room).await.is_empty());
        assert_eq!(mgr.store().room_count(), 0);
    }
}

// =========================================================================
// Full scenario
// =========================================================================

#[tokio::test]
async fn test_full_session_from_create_to_result() {
    let mgr = setup(4).await;

    let room = mgr.create(uid(1), LIVE, LiveDifficulty::Normal).await.unwrap();
    for u in 2..=4 {
        assert_eq!(
            mgr.join(uid(u), room, LiveDifficulty::Normal).await.unwrap(),
            JoinRoomResult::Ok
        );
    }
    assert!(mgr.list(LIVE).await.unwrap().is_empty(), "full room is not listed");

    mgr.start(uid(1), room).await.unwrap();
    for u in 1..=4 {
        assert_eq!(mgr.wait(uid(u), room).await.unwrap().status, WaitRoomStatus::LiveStart);
    }

    for u in 1..=4 {
        assert!(mgr.result(room).await.unwrap().is_empty());
        mgr.end(uid(u), room, 1000 * u as i64, JudgeCounts::from([u as u32, 0, 0, 0, 0]))
            .await
            .unwrap();
    }
    let results = mgr.result(room).await.unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(results.iter().map(|r| r.score).sum::<i64>(), 10_000);

    for u in [2, 3, 4, 1] {
        mgr.leave(uid(u), room).await.unwrap();
    }
    assert_eq!(mgr.store().room(room).await.unwrap(), None);
}
