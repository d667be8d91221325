//! # LiveHall
//!
//! Lobby server for multiplayer rhythm-game lives.
//!
//! Players register once, then create or join rooms of up to four members
//! for a chosen live, poll the room until the host starts, submit their
//! play result and poll again for everyone's results. Every endpoint is
//! HTTP/JSON; authenticated endpoints take `Authorization: Bearer <token>`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use livehall::prelude::*;
//!
//! # async fn run() -> Result<(), LiveHallError> {
//! let config = ServerConfig::from_env();
//! let server = LiveHallServer::builder()
//!     .bind(&config.bind_addr)
//!     .build(MemoryRoomStore::new(), Arc::new(MemoryUserDirectory::new()))
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `postgres`: re-exports `PgRoomStore` and `PgUserDirectory`

mod auth;
mod config;
mod error;
mod handler;
mod server;

pub use config::{BIND_ENV, DATABASE_URL_ENV, DB_MAX_CONNECTIONS_ENV, ServerConfig};
pub use error::LiveHallError;
pub use server::{LiveHallServer, LiveHallServerBuilder};

/// Everything needed to assemble and run a server.
pub mod prelude {
    pub use crate::{LiveHallError, LiveHallServer, LiveHallServerBuilder, ServerConfig};
    pub use livehall_protocol::{
        JoinRoomResult, JudgeCounts, LiveDifficulty, LiveId, RoomId, UserId, WaitRoomStatus,
    };
    #[cfg(feature = "postgres")]
    pub use livehall_room::PgRoomStore;
    pub use livehall_room::{MemoryRoomStore, RoomManager, RoomStore};
    #[cfg(feature = "postgres")]
    pub use livehall_session::PgUserDirectory;
    pub use livehall_session::{IdentityResolver, MemoryUserDirectory};
}
