//! Wire protocol for LiveHall.
//!
//! This crate defines the vocabulary that clients, the identity layer and
//! the room layer share:
//!
//! - **Types** ([`UserId`], [`RoomId`], [`LiveDifficulty`], [`JudgeCounts`], ...):
//!   ids, integer-coded enums and the views returned to clients.
//! - **Messages** ([`CreateRoomRequest`], [`RoomWaitResponse`], ...): one
//!   request/response body per endpoint.
//! - **Errors** ([`ProtocolError`]): values that parse as JSON but break
//!   a wire rule.
//!
//! # Architecture
//!
//! ```text
//! Transport (HTTP/JSON) → Protocol (typed bodies) → Room / Session layers
//! ```

mod error;
mod messages;
mod types;

pub use error::ProtocolError;
pub use messages::{
    CreateRoomRequest, CreateRoomResponse, Empty, RoomEndRequest, RoomIdRequest,
    RoomJoinRequest, RoomJoinResponse, RoomListRequest, RoomListResponse, RoomResultResponse,
    RoomWaitResponse, UserCreateRequest, UserCreateResponse,
};
pub use types::{
    JoinRoomResult, JudgeCounts, LiveDifficulty, LiveId, ResultUser, RoomId, RoomInfo, RoomUser,
    UserId, UserIdentity, WaitRoomStatus,
};
