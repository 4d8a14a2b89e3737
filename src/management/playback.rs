use std::{future::Future, sync::Arc};

use crate::{
    errors::{RoomError, RoomResult},
    management::{TokenCell, TokenManager},
    spotify::{ApiError, PlaybackApi},
    types::{Device, PlaybackSnapshot, Track},
    warning,
};

/// Runs playback actions on behalf of a room's host.
///
/// Each action gets a valid access token first. If Spotify still answers 401,
/// the token is refreshed once and the action retried once; anything else is
/// returned as [`RoomError::UpstreamFailure`].
pub struct Playback {
    api: Arc<dyn PlaybackApi>,
    tokens: TokenManager,
}

impl Playback {
    pub fn new(api: Arc<dyn PlaybackApi>, tokens: TokenManager) -> Self {
        Self { api, tokens }
    }

    pub fn api(&self) -> &Arc<dyn PlaybackApi> {
        &self.api
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    async fn call<T, F, Fut>(&self, cell: &TokenCell, action: &'static str, op: F) -> RoomResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let access_token = self.tokens.ensure_valid(cell).await?;

        let err = match op(access_token.clone()).await {
            Ok(value) => return Ok(value),
            Err(ApiError::Unauthorized) => {
                let retried_token = self.tokens.refresh_rejected(cell, &access_token).await?;
                match op(retried_token).await {
                    Ok(value) => return Ok(value),
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };

        warning!("Spotify {} failed: {}", action, err);
        Err(RoomError::UpstreamFailure(err))
    }

    pub async fn current_playback(&self, cell: &TokenCell) -> RoomResult<Option<PlaybackSnapshot>> {
        let api = &self.api;
        self.call(cell, "current playback", |token| async move {
            api.current_playback(&token).await
        })
        .await
    }

    pub async fn pause(&self, cell: &TokenCell) -> RoomResult<()> {
        let api = &self.api;
        self.call(cell, "pause", |token| async move { api.pause(&token).await })
            .await
    }

    pub async fn resume(&self, cell: &TokenCell) -> RoomResult<()> {
        let api = &self.api;
        self.call(cell, "resume", |token| async move { api.resume(&token).await })
            .await
    }

    pub async fn skip_next(&self, cell: &TokenCell) -> RoomResult<()> {
        let api = &self.api;
        self.call(cell, "skip", |token| async move { api.skip_next(&token).await })
            .await
    }

    pub async fn skip_previous(&self, cell: &TokenCell) -> RoomResult<()> {
        let api = &self.api;
        self.call(cell, "rollback", |token| async move {
            api.skip_previous(&token).await
        })
        .await
    }

    pub async fn search_tracks(&self, cell: &TokenCell, query: &str) -> RoomResult<Vec<Track>> {
        let api = &self.api;
        self.call(cell, "search", |token| async move {
            api.search_tracks(&token, query).await
        })
        .await
    }

    pub async fn enqueue_track(&self, cell: &TokenCell, track_uri: &str) -> RoomResult<()> {
        let api = &self.api;
        self.call(cell, "enqueue", |token| async move {
            api.enqueue_track(&token, track_uri).await
        })
        .await
    }

    pub async fn list_devices(&self, cell: &TokenCell) -> RoomResult<Vec<Device>> {
        let api = &self.api;
        self.call(cell, "list devices", |token| async move {
            api.list_devices(&token).await
        })
        .await
    }

    pub async fn transfer_playback(&self, cell: &TokenCell, device_id: &str) -> RoomResult<()> {
        let api = &self.api;
        self.call(cell, "transfer playback", |token| async move {
            api.transfer_playback(&token, device_id).await
        })
        .await
    }
}
