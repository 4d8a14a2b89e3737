use reqwest::{Client, StatusCode, header::CONTENT_LENGTH};

use crate::{
    spotify::{ApiError, SEARCH_LIMIT, check_response},
    types::{
        Device, DevicesResponse, PlaybackSnapshot, SearchResponse, Track, TransferPlaybackRequest,
    },
};

/// Retrieves the playback state of the host's account.
///
/// Spotify answers `204 No Content` when no device is active, which is
/// returned as `Ok(None)` rather than an error.
pub async fn current_playback(
    client: &Client,
    api_url: &str,
    token: &str,
) -> Result<Option<PlaybackSnapshot>, ApiError> {
    let response = client
        .get(format!("{api_url}/me/player"))
        .bearer_auth(token)
        .send()
        .await?;

    if response.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let snapshot = check_response(response)
        .await?
        .json::<PlaybackSnapshot>()
        .await?;
    Ok(Some(snapshot))
}

pub async fn pause(client: &Client, api_url: &str, token: &str) -> Result<(), ApiError> {
    let response = client
        .put(format!("{api_url}/me/player/pause"))
        .bearer_auth(token)
        .header(CONTENT_LENGTH, 0)
        .send()
        .await?;

    check_response(response).await.map(|_| ())
}

pub async fn resume(client: &Client, api_url: &str, token: &str) -> Result<(), ApiError> {
    let response = client
        .put(format!("{api_url}/me/player/play"))
        .bearer_auth(token)
        .header(CONTENT_LENGTH, 0)
        .send()
        .await?;

    check_response(response).await.map(|_| ())
}

pub async fn skip_next(client: &Client, api_url: &str, token: &str) -> Result<(), ApiError> {
    let response = client
        .post(format!("{api_url}/me/player/next"))
        .bearer_auth(token)
        .header(CONTENT_LENGTH, 0)
        .send()
        .await?;

    check_response(response).await.map(|_| ())
}

pub async fn skip_previous(client: &Client, api_url: &str, token: &str) -> Result<(), ApiError> {
    let response = client
        .post(format!("{api_url}/me/player/previous"))
        .bearer_auth(token)
        .header(CONTENT_LENGTH, 0)
        .send()
        .await?;

    check_response(response).await.map(|_| ())
}

/// Searches the catalogue for tracks matching `query`.
///
/// Returns at most [`SEARCH_LIMIT`] tracks, in Spotify's relevance order.
pub async fn search_tracks(
    client: &Client,
    api_url: &str,
    token: &str,
    query: &str,
) -> Result<Vec<Track>, ApiError> {
    let limit = SEARCH_LIMIT.to_string();
    let response = client
        .get(format!("{api_url}/search"))
        .bearer_auth(token)
        .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
        .send()
        .await?;

    let res = check_response(response)
        .await?
        .json::<SearchResponse>()
        .await?;

    let mut tracks = res.tracks.map(|page| page.items).unwrap_or_default();
    tracks.truncate(SEARCH_LIMIT);
    Ok(tracks)
}

/// Appends a track to the end of the host's playback queue.
pub async fn enqueue_track(
    client: &Client,
    api_url: &str,
    token: &str,
    track_uri: &str,
) -> Result<(), ApiError> {
    let response = client
        .post(format!("{api_url}/me/player/queue"))
        .bearer_auth(token)
        .query(&[("uri", track_uri)])
        .header(CONTENT_LENGTH, 0)
        .send()
        .await?;

    check_response(response).await.map(|_| ())
}

pub async fn list_devices(
    client: &Client,
    api_url: &str,
    token: &str,
) -> Result<Vec<Device>, ApiError> {
    let response = client
        .get(format!("{api_url}/me/player/devices"))
        .bearer_auth(token)
        .send()
        .await?;

    let res = check_response(response)
        .await?
        .json::<DevicesResponse>()
        .await?;
    Ok(res.devices)
}

/// Moves playback to `device_id` and starts playing there.
pub async fn transfer_playback(
    client: &Client,
    api_url: &str,
    token: &str,
    device_id: &str,
) -> Result<(), ApiError> {
    let body = TransferPlaybackRequest {
        device_ids: vec![device_id.to_string()],
        play: true,
    };

    let response = client
        .put(format!("{api_url}/me/player"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await?;

    check_response(response).await.map(|_| ())
}
