//! Room lifecycle management for LiveHall.
//!
//! A room is created by its host, gathers up to [`MAX_USER_COUNT`] members
//! while `Waiting`, moves to `LiveStart` when the host starts the live, and
//! collects every member's play result. When the host leaves the room is
//! `Dissolved`; when the last member leaves it is deleted.
//!
//! # Key types
//!
//! - [`RoomManager`]: the lifecycle operations (create, list, join, wait,
//!   start, end, result, leave)
//! - [`RoomStore`] / [`RoomTransaction`]: transactional persistence with
//!   per-room row locks
//! - [`MemoryRoomStore`]: the in-process store
//! - [`RoomStatus`]: forward-only status machine
//!
//! # Feature Flags
//!
//! - `postgres`: `PgRoomStore`, backed by `sqlx`

mod error;
mod manager;
mod status;
mod store;

pub use error::{RoomError, StoreError};
pub use manager::{RoomManager, admission};
pub use status::{MAX_USER_COUNT, RoomStatus};
pub use store::{
    MemberRow, MemoryRoomStore, MemoryTransaction, NewRoom, PlayResult, RoomRow, RoomStore,
    RoomTransaction,
};
#[cfg(feature = "postgres")]
pub use store::{PgRoomStore, PgRoomTransaction};
