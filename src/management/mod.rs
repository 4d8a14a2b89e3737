//! # Management Module
//!
//! Room state and everything that changes it. The HTTP layer only talks to
//! [`RoomManager`]; the other types are the pieces it is built from.
//!
//! ## Components
//!
//! - [`SessionRegistry`] - Concurrent map of host sessions plus a room code index
//! - [`UserSession`] - A host's room, Spotify token and pending login
//! - [`Room`] - Settings, current song and the vote-to-skip tally
//! - [`privilege`] - Host and guest permission checks
//! - [`TokenManager`] - Token refresh with one refresh in flight per session
//! - [`Playback`] - Spotify calls with a valid token and a single retry on 401
//! - [`RoomManager`] - The operations exposed to clients
//!
//! ## Locking
//!
//! A room is guarded by a synchronous lock that is only taken for short,
//! non-async sections. A token is guarded by an async lock that stays held
//! during a refresh so concurrent requests share it.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use spotiroom::{management::RoomManager, spotify::SpotifyWebApi};
//!
//! let api = Arc::new(SpotifyWebApi::new(&settings)?);
//! let manager = RoomManager::from_settings(api, &settings);
//! let room = manager.create_room("host-id", 2, false)?;
//! ```

mod auth;
mod manager;
mod playback;
pub mod privilege;
mod registry;
mod room;
mod session;

pub use auth::{
    TokenCell, TokenManager, TokenState, TokenStatus, is_expiring, merge_grant, token_from_grant,
};
pub use manager::{LoginStart, RoomManager, SkipOutcome};
pub use playback::Playback;
pub use registry::SessionRegistry;
pub use room::{Room, SkipDecision, Vote, VoteOutcome, VoteState};
pub use session::UserSession;
