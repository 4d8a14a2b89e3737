use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OAuth credentials held on behalf of a room's host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotifyToken {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub token_type: String,
    /// Absolute expiry in epoch seconds.
    pub expires_at: i64,
}

/// Token endpoint response for both the code exchange and the refresh grant.
///
/// Spotify does not always resend `refresh_token` (nor `scope`) on refresh,
/// hence the options.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
}

/// A login that was started but whose callback has not arrived yet.
#[derive(Debug, Clone)]
pub struct PkceLogin {
    pub code_verifier: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<AlbumArtist>,
    pub album: Album,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracksPage {
    pub items: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: Option<TracksPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_active: bool,
    pub volume_percent: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

/// `GET /me/player`. `item` is absent for ads or when nothing is loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub progress_ms: Option<u64>,
    pub item: Option<Track>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferPlaybackRequest {
    pub device_ids: Vec<String>,
    pub play: bool,
}

/// Public view of a room, as returned to the browser.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_identifier: String,
    pub guest_can_pause: bool,
    pub votes_to_skip: u32,
    pub created_at: DateTime<Utc>,
    pub current_song_id: Option<String>,
    pub currently_playing: bool,
    pub current_votes: usize,
    pub is_host: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub guest_can_pause: bool,
    pub votes_to_skip: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuery {
    pub room_identifier: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceQuery {
    pub device_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSongRequest {
    pub room_identifier: String,
    pub query: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueTrackRequest {
    pub room_identifier: String,
    pub track_uri: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSongResult {
    pub artist_name: String,
    pub song_name: String,
    pub picture_uri: Option<String>,
    pub song_href: String,
}

impl From<Track> for SearchSongResult {
    fn from(track: Track) -> Self {
        Self {
            artist_name: first_artist(&track),
            song_name: track.name,
            // smallest cover is last
            picture_uri: track.album.images.last().map(|i| i.url.clone()),
            song_href: track.uri,
        }
    }
}

/// What the room page shows about the track that is playing right now.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongContext {
    pub song_title: String,
    pub artist: String,
    pub song_duration: u64,
    pub current_progress: u64,
    pub current_img_url: Option<String>,
    pub playing_status: bool,
    pub current_votes: usize,
    pub needed_votes_to_skip: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipResponse {
    pub message: &'static str,
    pub current_votes: usize,
    pub needed_votes_to_skip: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub url: String,
}

pub fn first_artist(track: &Track) -> String {
    track
        .artists
        .first()
        .map(|a| a.name.clone())
        .unwrap_or_default()
}
