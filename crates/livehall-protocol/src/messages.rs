//! Request and response bodies, one pair per endpoint.
//!
//! Field names are part of the public API and must not be renamed.
//! Endpoints that answer with nothing use [`Empty`], which serializes
//! as `{}`.

use serde::{Deserialize, Serialize};

use crate::{
    JoinRoomResult, JudgeCounts, LiveDifficulty, LiveId, ResultUser, RoomId, RoomInfo, RoomUser,
    WaitRoomStatus,
};

/// An empty JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Empty {}

// -- Users --

/// Body of `/user/create` and `/user/update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreateRequest {
    pub user_name: String,
    pub leader_card_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreateResponse {
    pub user_token: String,
}

// -- Rooms --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub live_id: LiveId,
    pub select_difficulty: LiveDifficulty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListRequest {
    pub live_id: LiveId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListResponse {
    pub room_info_list: Vec<RoomInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomJoinRequest {
    pub room_id: RoomId,
    pub select_difficulty: LiveDifficulty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomJoinResponse {
    pub join_room_result: JoinRoomResult,
}

/// Body shared by `/room/wait`, `/room/start`, `/room/result` and
/// `/room/leave`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomIdRequest {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomWaitResponse {
    pub status: WaitRoomStatus,
    pub room_user_list: Vec<RoomUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEndRequest {
    pub room_id: RoomId,
    pub score: i64,
    pub judge_count_list: JudgeCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomResultResponse {
    pub result_user_list: Vec<ResultUser>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_serializes_as_object() {
        assert_eq!(serde_json::to_string(&Empty {}).unwrap(), "{}");
    }

    #[test]
    fn test_create_room_request_decodes_api_body() {
        let req: CreateRoomRequest =
            serde_json::from_str(r#"{"live_id": 10, "select_difficulty": 1}"#).unwrap();
        assert_eq!(req.live_id, LiveId(10));
        assert_eq!(req.select_difficulty, LiveDifficulty::Normal);
    }

    #[test]
    fn test_room_end_request_decodes_judge_list() {
        let req: RoomEndRequest = serde_json::from_str(
            r#"{"room_id": 4, "score": 1200, "judge_count_list": [50, 10, 2, 1, 0]}"#,
        )
        .unwrap();
        assert_eq!(req.room_id, RoomId(4));
        assert_eq!(req.judge_count_list.great, 10);
    }

    #[test]
    fn test_room_end_request_short_judge_list_fails() {
        let result: Result<RoomEndRequest, _> = serde_json::from_str(
            r#"{"room_id": 4, "score": 1200, "judge_count_list": [50, 10]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_room_join_request_unknown_difficulty_fails() {
        let result: Result<RoomJoinRequest, _> =
            serde_json::from_str(r#"{"room_id": 1, "select_difficulty": 9}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_room_wait_response_json_format() {
        let resp = RoomWaitResponse {
            status: WaitRoomStatus::LiveStart,
            room_user_list: vec![],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], 2);
        assert_eq!(json["room_user_list"], serde_json::json!([]));
    }
}
