//! Core protocol types for LiveHall's wire format.
//!
//! Every value that crosses the HTTP boundary, or is shared between the
//! identity layer and the room layer, is defined here. Enum codes and field
//! names follow the public live-room API, so existing clients keep working.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable identifier for a user account.
///
/// Newtype over `u64` so a `UserId` can never be passed where a `RoomId`
/// is expected. `#[serde(transparent)]` keeps it a plain number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// Identifier of a live room, generated by the room store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Identifier of a song ("live").
///
/// `LiveId(0)` is reserved as a wildcard when listing rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LiveId(pub u64);

impl LiveId {
    /// Matches rooms for every song in a room listing.
    pub const ANY: LiveId = LiveId(0);

    /// Returns `true` if this id is the listing wildcard.
    pub fn is_any(self) -> bool {
        self == Self::ANY
    }
}

impl fmt::Display for LiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Integer-coded enums
// ---------------------------------------------------------------------------

/// Difficulty a player picked for the song in a room.
///
/// `#[serde(into = "u8", try_from = "u8")]` routes serialization through
/// the integer code, so `Hard` travels as `2` and an unknown code such as
/// `7` is rejected with [`ProtocolError::UnknownCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum LiveDifficulty {
    Normal = 1,
    Hard = 2,
}

impl From<LiveDifficulty> for u8 {
    fn from(value: LiveDifficulty) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for LiveDifficulty {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Normal),
            2 => Ok(Self::Hard),
            _ => Err(ProtocolError::UnknownCode {
                kind: "LiveDifficulty",
                code,
            }),
        }
    }
}

/// Outcome of a join attempt.
///
/// These are expected, client-actionable answers, not faults: the room
/// layer returns them as values and only storage failures become errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum JoinRoomResult {
    /// The player is now a member of the room.
    Ok = 1,
    /// The room is at capacity or its live has already started.
    RoomFull = 2,
    /// The room was emptied or dissolved by its host.
    Disbanded = 3,
    /// Anything else (unknown room, duplicate membership).
    OtherError = 4,
}

impl From<JoinRoomResult> for u8 {
    fn from(value: JoinRoomResult) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for JoinRoomResult {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Ok),
            2 => Ok(Self::RoomFull),
            3 => Ok(Self::Disbanded),
            4 => Ok(Self::OtherError),
            _ => Err(ProtocolError::UnknownCode {
                kind: "JoinRoomResult",
                code,
            }),
        }
    }
}

/// Room status as reported to clients polling the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WaitRoomStatus {
    Waiting = 1,
    LiveStart = 2,
    Dissolution = 3,
}

impl From<WaitRoomStatus> for u8 {
    fn from(value: WaitRoomStatus) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for WaitRoomStatus {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Waiting),
            2 => Ok(Self::LiveStart),
            3 => Ok(Self::Dissolution),
            _ => Err(ProtocolError::UnknownCode {
                kind: "WaitRoomStatus",
                code,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// JudgeCounts: the 5-bucket hit histogram
// ---------------------------------------------------------------------------

/// Number of notes a player hit at each judgement grade.
///
/// On the wire this is `judge_count_list`: a 5-element array ordered
/// perfect, great, good, bad, miss. Any other length fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "Vec<u32>", try_from = "Vec<u32>")]
pub struct JudgeCounts {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub bad: u32,
    pub miss: u32,
}

impl JudgeCounts {
    /// Number of buckets in the histogram.
    pub const BUCKETS: usize = 5;

    /// Returns the buckets in wire order.
    pub fn to_array(self) -> [u32; Self::BUCKETS] {
        [self.perfect, self.great, self.good, self.bad, self.miss]
    }
}

impl From<[u32; JudgeCounts::BUCKETS]> for JudgeCounts {
    fn from([perfect, great, good, bad, miss]: [u32; JudgeCounts::BUCKETS]) -> Self {
        Self {
            perfect,
            great,
            good,
            bad,
            miss,
        }
    }
}

impl From<JudgeCounts> for Vec<u32> {
    fn from(value: JudgeCounts) -> Self {
        value.to_array().to_vec()
    }
}

impl TryFrom<Vec<u32>> for JudgeCounts {
    type Error = ProtocolError;

    fn try_from(list: Vec<u32>) -> Result<Self, Self::Error> {
        let buckets: [u32; Self::BUCKETS] = list.try_into().map_err(|list: Vec<u32>| {
            ProtocolError::InvalidMessage(format!(
                "judge_count_list must have {} entries, got {}",
                Self::BUCKETS,
                list.len()
            ))
        })?;
        Ok(buckets.into())
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A user as seen by everyone except the identity store: no token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub name: String,
    pub leader_card_id: i64,
}

/// A joinable room as shown in the room listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub live_id: LiveId,
    pub joined_user_count: u32,
    pub max_user_count: u32,
}

/// One member of a room, from the point of view of the user polling it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUser {
    pub user_id: UserId,
    pub name: String,
    pub leader_card_id: i64,
    pub select_difficulty: LiveDifficulty,
    /// `true` for the entry describing the requesting user.
    pub is_me: bool,
    /// `true` for the entry describing the room's host.
    pub is_host: bool,
}

/// A finished player's score line in the room result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultUser {
    pub user_id: UserId,
    pub judge_count_list: JudgeCounts,
    pub score: i64,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The public API fixes exact JSON shapes (integer enum codes, a plain
    //! list for the judge histogram). These tests pin those shapes down.

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_user_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&UserId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_id_display_prefixes() {
        assert_eq!(UserId(7).to_string(), "U-7");
        assert_eq!(RoomId(3).to_string(), "R-3");
        assert_eq!(LiveId(10).to_string(), "L-10");
    }

    #[test]
    fn test_live_id_zero_is_wildcard() {
        assert!(LiveId(0).is_any());
        assert!(LiveId::ANY.is_any());
        assert!(!LiveId(1).is_any());
    }

    // =====================================================================
    // Integer-coded enums
    // =====================================================================

    #[test]
    fn test_live_difficulty_serializes_as_code() {
        assert_eq!(serde_json::to_string(&LiveDifficulty::Normal).unwrap(), "1");
        assert_eq!(serde_json::to_string(&LiveDifficulty::Hard).unwrap(), "2");
    }

    #[test]
    fn test_live_difficulty_unknown_code_is_rejected() {
        let result: Result<LiveDifficulty, _> = serde_json::from_str("7");
        let err = result.unwrap_err();
        assert!(
            err.to_string().contains("unknown LiveDifficulty code: 7"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_try_from_unknown_code_names_enum_and_code() {
        assert_eq!(
            LiveDifficulty::try_from(0),
            Err(ProtocolError::UnknownCode { kind: "LiveDifficulty", code: 0 })
        );
        assert_eq!(
            JoinRoomResult::try_from(5),
            Err(ProtocolError::UnknownCode { kind: "JoinRoomResult", code: 5 })
        );
        assert_eq!(
            WaitRoomStatus::try_from(9),
            Err(ProtocolError::UnknownCode { kind: "WaitRoomStatus", code: 9 })
        );
    }

    #[test]
    fn test_join_room_result_codes_match_api() {
        let codes: Vec<u8> = [
            JoinRoomResult::Ok,
            JoinRoomResult::RoomFull,
            JoinRoomResult::Disbanded,
            JoinRoomResult::OtherError,
        ]
        .into_iter()
        .map(u8::from)
        .collect();
        assert_eq!(codes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_join_room_result_decodes_from_code() {
        let result: JoinRoomResult = serde_json::from_str("3").unwrap();
        assert_eq!(result, JoinRoomResult::Disbanded);
    }

    #[test]
    fn test_wait_room_status_codes_match_api() {
        assert_eq!(serde_json::to_string(&WaitRoomStatus::Waiting).unwrap(), "1");
        assert_eq!(serde_json::to_string(&WaitRoomStatus::LiveStart).unwrap(), "2");
        assert_eq!(serde_json::to_string(&WaitRoomStatus::Dissolution).unwrap(), "3");
        assert!(WaitRoomStatus::try_from(0).is_err());
    }

    // =====================================================================
    // JudgeCounts
    // =====================================================================

    #[test]
    fn test_judge_counts_serializes_as_ordered_list() {
        let judge = JudgeCounts {
            perfect: 100,
            great: 20,
            good: 3,
            bad: 2,
            miss: 1,
        };
        let json = serde_json::to_value(judge).unwrap();
        assert_eq!(json, serde_json::json!([100, 20, 3, 2, 1]));
    }

    #[test]
    fn test_judge_counts_wrong_length_is_rejected() {
        let result: Result<JudgeCounts, _> = serde_json::from_str("[1, 2, 3, 4]");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("must have 5 entries, got 4"));
    }

    #[test]
    fn test_judge_counts_from_array_keeps_bucket_order() {
        let judge = JudgeCounts::from([5, 4, 3, 2, 1]);
        assert_eq!(judge.perfect, 5);
        assert_eq!(judge.miss, 1);
        assert_eq!(judge.to_array(), [5, 4, 3, 2, 1]);
    }

    // =====================================================================
    // Views
    // =====================================================================

    #[test]
    fn test_room_user_json_format() {
        let user = RoomUser {
            user_id: UserId(2),
            name: "mika".into(),
            leader_card_id: 1001,
            select_difficulty: LiveDifficulty::Hard,
            is_me: true,
            is_host: false,
        };
        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["user_id"], 2);
        assert_eq!(json["select_difficulty"], 2);
        assert_eq!(json["is_me"], true);
        assert_eq!(json["is_host"], false);
    }

    #[test]
    fn test_result_user_json_format() {
        let result = ResultUser {
            user_id: UserId(1),
            judge_count_list: JudgeCounts::from([1, 2, 3, 4, 5]),
            score: 987_654,
        };
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["judge_count_list"], serde_json::json!([1, 2, 3, 4, 5]));
        assert_eq!(json["score"], 987_654);
    }
}
