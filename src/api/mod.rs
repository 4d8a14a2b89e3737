//! # API Module
//!
//! HTTP endpoints of the room server. Handlers are thin: they pull the caller's
//! identity and the request parameters out of the request, call one
//! [`RoomManager`](crate::management::RoomManager) operation and turn the result
//! into JSON.
//!
//! ## Endpoints
//!
//! ### Rooms
//!
//! - [`create_room`] - Open a room, or update the settings of the caller's room
//! - [`my_room`] - The room hosted by the caller
//! - [`get_room`] - A room by its code, as seen by the caller
//! - [`check_owner`] - Whether the caller hosts a room
//! - [`leave_room`] - Close a room (host only)
//!
//! ### Spotify
//!
//! - [`login`] / [`callback`] - OAuth 2.0 PKCE login of the room's host
//! - [`auth_status`] - State of the room's Spotify token
//! - [`current_song`] - The host's current track, with the vote tally
//! - [`skip_song`] - Vote to skip, or skip right away for the host
//! - [`toggle_playback`] / [`rollback`] - Playback control
//! - [`search`] / [`enqueue`] - Find tracks and add them to the host's queue
//! - [`devices`] / [`force_device`] - Devices of the caller's own account
//!
//! ### Monitoring
//!
//! - [`health`] - Status, version and number of open rooms
//!
//! ## Identity
//!
//! Every route runs behind [`identify`], which reads or issues the
//! `spotiroom_uid` cookie and stores the caller's [`UserId`] in the request
//! extensions. There are no accounts: whoever holds the cookie that created a
//! room is its host.
//!
//! ## Errors
//!
//! [`RoomError`](crate::errors::RoomError) implements `IntoResponse`; every
//! variant maps to a fixed status code and a `{"error": "..."}` body.

mod callback;
mod errors;
mod health;
mod identity;
mod player;
mod rooms;

pub use callback::callback;
pub use health::health;
pub use identity::{IDENTITY_COOKIE, UserId, identify, is_valid_identifier};
pub use player::{
    auth_status, current_song, devices, enqueue, force_device, login, rollback, search,
    skip_response, skip_song, toggle_playback,
};
pub use rooms::{check_owner, create_room, get_room, leave_room, my_room};
