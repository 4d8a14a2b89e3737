#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use spotiroom::{
    management::{RoomManager, SessionRegistry},
    spotify::{ApiError, PlaybackApi},
    types::{
        Album, AlbumArtist, Device, Image, PlaybackSnapshot, SpotifyToken, TokenGrant, Track,
    },
    utils,
};

pub const HOST: &str = "HostHostHostHostHost";
pub const GUEST_1: &str = "GuestOneGuestOne0001";
pub const GUEST_2: &str = "GuestTwoGuestTwo0002";
pub const GUEST_3: &str = "GuestTreGuestTre0003";

/// In-memory stand-in for Spotify that counts every call.
#[derive(Default)]
pub struct MockSpotify {
    pub exchange_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub player_calls: AtomicUsize,
    pub skip_calls: AtomicUsize,
    pub previous_calls: AtomicUsize,
    pub pause_calls: AtomicUsize,
    pub resume_calls: AtomicUsize,
    pub enqueue_calls: AtomicUsize,
    pub transfer_calls: AtomicUsize,
    /// Number of upcoming player calls answered with 401
    pub reject_tokens: AtomicUsize,
    pub fail_refresh: AtomicBool,
    pub fail_skip: AtomicBool,
    pub refresh_delay_ms: AtomicU64,
    pub playback: Mutex<Option<PlaybackSnapshot>>,
    pub seen_tokens: Mutex<Vec<String>>,
}

impl MockSpotify {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn player_call(&self, access_token: &str) -> Result<(), ApiError> {
        self.player_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens.lock().push(access_token.to_string());

        let rejected = self
            .reject_tokens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }
}

#[async_trait]
impl PlaybackApi for MockSpotify {
    fn authorize_url(&self, code_challenge: &str, state: &str) -> Result<String, ApiError> {
        Ok(format!(
            "https://accounts.example/authorize?code_challenge={code_challenge}&state={state}"
        ))
    }

    async fn exchange_authorization_code(
        &self,
        code: &str,
        _code_verifier: &str,
    ) -> Result<TokenGrant, ApiError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if code == "bad-code" {
            return Err(ApiError::Status {
                status: 400,
                message: "invalid_grant".to_string(),
            });
        }

        Ok(TokenGrant {
            access_token: "access-0".to_string(),
            refresh_token: Some("refresh-0".to_string()),
            scope: Some("user-modify-playback-state".to_string()),
            token_type: Some("Bearer".to_string()),
            expires_in: 3600,
        })
    }

    async fn refresh_access_token(&self, _refresh_token: &str) -> Result<TokenGrant, ApiError> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;

        let delay = self.refresh_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 400,
                message: "invalid_grant".to_string(),
            });
        }

        // Spotify usually leaves the refresh token out of the refresh response
        Ok(TokenGrant {
            access_token: format!("access-{n}"),
            refresh_token: None,
            scope: None,
            token_type: None,
            expires_in: 3600,
        })
    }

    async fn current_playback(
        &self,
        access_token: &str,
    ) -> Result<Option<PlaybackSnapshot>, ApiError> {
        self.player_call(access_token)?;
        Ok(self.playback.lock().clone())
    }

    async fn pause(&self, access_token: &str) -> Result<(), ApiError> {
        self.player_call(access_token)?;
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&self, access_token: &str) -> Result<(), ApiError> {
        self.player_call(access_token)?;
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn skip_next(&self, access_token: &str) -> Result<(), ApiError> {
        self.player_call(access_token)?;
        if self.fail_skip.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 404,
                message: "No active device".to_string(),
            });
        }
        self.skip_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn skip_previous(&self, access_token: &str) -> Result<(), ApiError> {
        self.player_call(access_token)?;
        self.previous_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn search_tracks(&self, access_token: &str, query: &str) -> Result<Vec<Track>, ApiError> {
        self.player_call(access_token)?;
        Ok(vec![
            track("track-1", &format!("{query} one")),
            track("track-2", &format!("{query} two")),
        ])
    }

    async fn enqueue_track(&self, access_token: &str, _track_uri: &str) -> Result<(), ApiError> {
        self.player_call(access_token)?;
        self.enqueue_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_devices(&self, access_token: &str) -> Result<Vec<Device>, ApiError> {
        self.player_call(access_token)?;
        Ok(vec![Device {
            id: Some("device-1".to_string()),
            name: "Kitchen".to_string(),
            kind: "Speaker".to_string(),
            is_active: true,
            volume_percent: Some(40),
        }])
    }

    async fn transfer_playback(&self, access_token: &str, _device_id: &str) -> Result<(), ApiError> {
        self.player_call(access_token)?;
        self.transfer_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn manager(api: Arc<MockSpotify>) -> RoomManager {
    RoomManager::new(Arc::new(SessionRegistry::new()), api, 10, 0)
}

pub fn token(access_token: &str, expires_at: i64) -> SpotifyToken {
    SpotifyToken {
        access_token: access_token.to_string(),
        refresh_token: "refresh-0".to_string(),
        scope: "user-modify-playback-state".to_string(),
        token_type: "Bearer".to_string(),
        expires_at,
    }
}

/// Gives the host's session a token valid for an hour.
pub async fn authenticate(manager: &RoomManager, host: &str) {
    let session = manager
        .registry()
        .lookup_by_user(host)
        .expect("host has a session");
    session
        .token()
        .install(token("access-0", utils::now_timestamp() + 3600))
        .await;
}

/// Creates an authenticated room for [`HOST`] and returns its code.
pub async fn open_room(manager: &RoomManager, votes_to_skip: u32, guest_can_pause: bool) -> String {
    let room = manager
        .create_room(HOST, votes_to_skip, guest_can_pause)
        .expect("room is created");
    authenticate(manager, HOST).await;
    room.room_identifier
}

pub fn track(id: &str, name: &str) -> Track {
    Track {
        id: Some(id.to_string()),
        name: name.to_string(),
        uri: format!("spotify:track:{id}"),
        duration_ms: 180_000,
        artists: vec![AlbumArtist {
            id: None,
            name: "Test Artist".to_string(),
        }],
        album: Album {
            id: None,
            name: "Test Album".to_string(),
            images: vec![
                Image {
                    url: "https://images.example/large".to_string(),
                    height: Some(640),
                    width: Some(640),
                },
                Image {
                    url: "https://images.example/small".to_string(),
                    height: Some(64),
                    width: Some(64),
                },
            ],
        },
    }
}

pub fn playing(track_id: &str) -> PlaybackSnapshot {
    PlaybackSnapshot {
        is_playing: true,
        progress_ms: Some(42_000),
        item: Some(track(track_id, "Now Playing")),
    }
}
