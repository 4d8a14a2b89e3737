use thiserror::Error;

use crate::spotify::ApiError;

pub type RoomResult<T> = Result<T, RoomError>;

/// Everything a room operation can fail with.
///
/// An `AlreadyVoted` vote is not in here: it is a normal outcome of
/// vote-or-skip, see [`crate::management::SkipOutcome`].
#[derive(Debug, Error)]
pub enum RoomError {
    /// Unknown room code or no room for this user
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },
    /// The caller is a guest and the action needs the host, or the room settings forbid it
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Invalid room settings: {0}")]
    InvalidSettings(String),
    /// The room's host has not connected Spotify, or the connection became unusable
    #[error("Room is not authenticated with Spotify")]
    NotAuthenticated,
    #[error("Spotify token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("Spotify request failed: {0}")]
    UpstreamFailure(#[from] ApiError),
    /// OAuth callback without a matching login in progress
    #[error("Invalid login state: {0}")]
    InvalidLoginState(&'static str),
}

impl RoomError {
    pub fn room_not_found(code: &str) -> Self {
        Self::NotFound {
            resource: "room",
            identifier: code.to_string(),
        }
    }

    pub fn session_not_found(user: &str) -> Self {
        Self::NotFound {
            resource: "session",
            identifier: user.to_string(),
        }
    }
}
