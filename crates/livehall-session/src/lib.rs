//! User identity for LiveHall.
//!
//! This crate is the Identity Resolver the room layer consumes:
//!
//! 1. **Registration**: creating a user hands back a secret session token
//! 2. **Resolution**: every authenticated request turns its token into a
//!    [`UserId`](livehall_protocol::UserId) via [`IdentityResolver::resolve`]
//! 3. **Lookup**: the lobby shows member names via [`IdentityResolver::lookup`]
//!
//! # How it fits in the stack
//!
//! ```text
//! Transport (above)  ← resolves the bearer token once per request
//!     ↕
//! Session Layer (this crate)  ← owns users and their tokens
//!     ↕
//! Protocol Layer (below)  ← provides UserId, UserIdentity
//! ```
//!
//! # Feature Flags
//!
//! - `postgres`: [`PgUserDirectory`], backed by `sqlx`

mod directory;
mod error;
#[cfg(feature = "postgres")]
mod postgres;
mod resolver;
mod token;

pub use directory::MemoryUserDirectory;
pub use error::SessionError;
#[cfg(feature = "postgres")]
pub use postgres::PgUserDirectory;
pub use resolver::IdentityResolver;
pub use token::{generate_token, TokenSource};
