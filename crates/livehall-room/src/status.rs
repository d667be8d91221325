//! Room status and capacity.

use std::fmt;

use livehall_protocol::WaitRoomStatus;

/// Maximum number of members a room admits, host included.
pub const MAX_USER_COUNT: u32 = 4;

/// The lifecycle state of a room.
///
/// ```text
/// Waiting ──start()──> LiveStart
///    │                     │
///    └──host leaves──> Dissolved <──host leaves──┘
/// ```
///
/// Transitions only move forward. A room that reached `LiveStart` never
/// goes back to `Waiting`, and `Dissolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomStatus {
    /// Gathering members; shown in the room list.
    Waiting,
    /// The host started the live.
    LiveStart,
    /// The host left. Remaining members can only leave.
    Dissolved,
}

impl RoomStatus {
    fn rank(self) -> u8 {
        match self {
            RoomStatus::Waiting => 0,
            RoomStatus::LiveStart => 1,
            RoomStatus::Dissolved => 2,
        }
    }

    /// Returns `true` if moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: RoomStatus) -> bool {
        next.rank() > self.rank()
    }

    /// Returns `true` if new members may still join.
    pub fn is_joinable(self) -> bool {
        matches!(self, RoomStatus::Waiting)
    }

    /// Numeric code used for persistence, matching [`WaitRoomStatus`].
    pub fn code(self) -> i16 {
        match self {
            RoomStatus::Waiting => 1,
            RoomStatus::LiveStart => 2,
            RoomStatus::Dissolved => 3,
        }
    }

    /// Parses a persisted status code.
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(RoomStatus::Waiting),
            2 => Some(RoomStatus::LiveStart),
            3 => Some(RoomStatus::Dissolved),
            _ => None,
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomStatus::Waiting => write!(f, "Waiting"),
            RoomStatus::LiveStart => write!(f, "LiveStart"),
            RoomStatus::Dissolved => write!(f, "Dissolved"),
        }
    }
}

impl From<RoomStatus> for WaitRoomStatus {
    fn from(status: RoomStatus) -> Self {
        match status {
            RoomStatus::Waiting => WaitRoomStatus::Waiting,
            RoomStatus::LiveStart => WaitRoomStatus::LiveStart,
            RoomStatus::Dissolved => WaitRoomStatus::Dissolution,
        }
    }
}
