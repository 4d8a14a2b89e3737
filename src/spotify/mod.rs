//! # Spotify Integration Module
//!
//! This module is the integration layer between the room server and the Spotify
//! Web API. Everything the rooms need from Spotify goes through the
//! [`PlaybackApi`] trait, which keeps the room logic testable without a network
//! and keeps the wire format of the Web API out of the rest of the crate.
//!
//! ## Architecture
//!
//! ```text
//! Room manager / playback façade
//!          ↓
//! PlaybackApi (trait)
//!     ├── Authentication (authorization code + PKCE, refresh grant)
//!     └── Player (playback state, controls, queue, search, devices)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Core Modules
//!
//! - [`auth`] - Authorization URL construction, code exchange and token refresh
//!   against the accounts service.
//! - [`player`] - The `/me/player` family of endpoints plus track search.
//!
//! ## Error Handling
//!
//! Every call returns [`ApiError`]. A `401` is reported as
//! [`ApiError::Unauthorized`] so the playback façade can refresh the token and
//! retry once; every other non-success status, timeout or decode failure is
//! surfaced as-is. This module never retries on its own.
//!
//! ## Timeouts
//!
//! The shared [`reqwest::Client`] is built with the configured request timeout,
//! so no call can hang a request handler indefinitely.

pub mod auth;
pub mod player;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;

use crate::{
    config::Settings,
    types::{Device, PlaybackSnapshot, TokenGrant, Track},
};

/// Maximum number of tracks returned by a search.
pub const SEARCH_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The access token was rejected (HTTP 401)
    #[error("Access token was rejected")]
    Unauthorized,
    #[error("Spotify responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            if status == StatusCode::UNAUTHORIZED {
                ApiError::Unauthorized
            } else {
                ApiError::Status {
                    status: status.as_u16(),
                    message: err.to_string(),
                }
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// The operations the rooms need from a music playback service.
///
/// Implemented by [`SpotifyWebApi`] for production and by in-memory fakes in
/// the tests.
#[async_trait]
pub trait PlaybackApi: Send + Sync {
    /// URL the host is sent to in order to grant access.
    fn authorize_url(&self, code_challenge: &str, state: &str) -> Result<String, ApiError>;

    async fn exchange_authorization_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenGrant, ApiError>;

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant, ApiError>;

    /// `None` when no device is currently playing anything.
    async fn current_playback(&self, access_token: &str)
    -> Result<Option<PlaybackSnapshot>, ApiError>;

    async fn pause(&self, access_token: &str) -> Result<(), ApiError>;

    async fn resume(&self, access_token: &str) -> Result<(), ApiError>;

    async fn skip_next(&self, access_token: &str) -> Result<(), ApiError>;

    async fn skip_previous(&self, access_token: &str) -> Result<(), ApiError>;

    /// At most [`SEARCH_LIMIT`] tracks.
    async fn search_tracks(&self, access_token: &str, query: &str)
    -> Result<Vec<Track>, ApiError>;

    async fn enqueue_track(&self, access_token: &str, track_uri: &str) -> Result<(), ApiError>;

    async fn list_devices(&self, access_token: &str) -> Result<Vec<Device>, ApiError>;

    async fn transfer_playback(&self, access_token: &str, device_id: &str)
    -> Result<(), ApiError>;
}

/// [`PlaybackApi`] backed by the real Spotify accounts service and Web API.
pub struct SpotifyWebApi {
    client: Client,
    settings: Settings,
}

impl SpotifyWebApi {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }
}

#[async_trait]
impl PlaybackApi for SpotifyWebApi {
    fn authorize_url(&self, code_challenge: &str, state: &str) -> Result<String, ApiError> {
        auth::authorize_url(&self.settings, code_challenge, state)
    }

    async fn exchange_authorization_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenGrant, ApiError> {
        auth::exchange_code_pkce(&self.client, &self.settings, code, code_verifier).await
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant, ApiError> {
        auth::refresh_token(&self.client, &self.settings, refresh_token).await
    }

    async fn current_playback(
        &self,
        access_token: &str,
    ) -> Result<Option<PlaybackSnapshot>, ApiError> {
        player::current_playback(&self.client, &self.settings.api_url, access_token).await
    }

    async fn pause(&self, access_token: &str) -> Result<(), ApiError> {
        player::pause(&self.client, &self.settings.api_url, access_token).await
    }

    async fn resume(&self, access_token: &str) -> Result<(), ApiError> {
        player::resume(&self.client, &self.settings.api_url, access_token).await
    }

    async fn skip_next(&self, access_token: &str) -> Result<(), ApiError> {
        player::skip_next(&self.client, &self.settings.api_url, access_token).await
    }

    async fn skip_previous(&self, access_token: &str) -> Result<(), ApiError> {
        player::skip_previous(&self.client, &self.settings.api_url, access_token).await
    }

    async fn search_tracks(
        &self,
        access_token: &str,
        query: &str,
    ) -> Result<Vec<Track>, ApiError> {
        player::search_tracks(&self.client, &self.settings.api_url, access_token, query).await
    }

    async fn enqueue_track(&self, access_token: &str, track_uri: &str) -> Result<(), ApiError> {
        player::enqueue_track(&self.client, &self.settings.api_url, access_token, track_uri).await
    }

    async fn list_devices(&self, access_token: &str) -> Result<Vec<Device>, ApiError> {
        player::list_devices(&self.client, &self.settings.api_url, access_token).await
    }

    async fn transfer_playback(
        &self,
        access_token: &str,
        device_id: &str,
    ) -> Result<(), ApiError> {
        player::transfer_playback(&self.client, &self.settings.api_url, access_token, device_id)
            .await
    }
}

/// Turns a non-success response into an [`ApiError`], keeping the body as message.
pub(crate) async fn check_response(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }

    let message = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}
