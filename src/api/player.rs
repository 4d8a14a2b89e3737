use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::{
    api::UserId,
    errors::RoomResult,
    management::{LoginStart, RoomManager, SkipOutcome},
    types::{
        Device, DeviceQuery, EnqueueTrackRequest, LoginResponse, RoomQuery, SearchSongRequest,
        SearchSongResult, SkipResponse,
    },
};

/// `200 {url}` to start the Spotify login, `201` if the room is already connected.
pub async fn login(
    State(manager): State<Arc<RoomManager>>,
    Extension(UserId(user)): Extension<UserId>,
    Query(query): Query<RoomQuery>,
) -> RoomResult<Response> {
    let response = match manager.begin_login(&user, &query.room_identifier).await? {
        LoginStart::Redirect(url) => Json(LoginResponse { url }).into_response(),
        LoginStart::AlreadyAuthenticated => StatusCode::CREATED.into_response(),
    };
    Ok(response)
}

pub async fn auth_status(
    State(manager): State<Arc<RoomManager>>,
    Query(query): Query<RoomQuery>,
) -> RoomResult<Json<Value>> {
    let status = manager.auth_status(&query.room_identifier).await?;
    Ok(Json(json!({ "status": status })))
}

pub async fn current_song(
    State(manager): State<Arc<RoomManager>>,
    Query(query): Query<RoomQuery>,
) -> RoomResult<Response> {
    let response = match manager.current_song(&query.room_identifier).await? {
        Some(song) => Json(song).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}

pub async fn skip_song(
    State(manager): State<Arc<RoomManager>>,
    Extension(UserId(user)): Extension<UserId>,
    Query(query): Query<RoomQuery>,
) -> RoomResult<Json<SkipResponse>> {
    let outcome = manager.vote_or_skip(&user, &query.room_identifier).await?;
    Ok(Json(skip_response(outcome)))
}

pub fn skip_response(outcome: SkipOutcome) -> SkipResponse {
    let (message, current_votes, needed_votes_to_skip) = match outcome {
        SkipOutcome::Skipped { needed } => ("skipped", 0, needed),
        SkipOutcome::Voted { tally, needed } => ("voted", tally, needed),
        SkipOutcome::AlreadyVoted { tally, needed } => ("already voted", tally, needed),
        SkipOutcome::Pending { tally, needed } => ("pending", tally, needed),
    };

    SkipResponse {
        message,
        current_votes,
        needed_votes_to_skip,
    }
}

pub async fn toggle_playback(
    State(manager): State<Arc<RoomManager>>,
    Extension(UserId(user)): Extension<UserId>,
    Query(query): Query<RoomQuery>,
) -> RoomResult<Json<Value>> {
    let playing = manager
        .toggle_playback(&user, &query.room_identifier)
        .await?;
    Ok(Json(json!({ "playing": playing })))
}

pub async fn rollback(
    State(manager): State<Arc<RoomManager>>,
    Extension(UserId(user)): Extension<UserId>,
    Query(query): Query<RoomQuery>,
) -> RoomResult<StatusCode> {
    manager.rollback(&user, &query.room_identifier).await?;
    Ok(StatusCode::OK)
}

pub async fn search(
    State(manager): State<Arc<RoomManager>>,
    Json(request): Json<SearchSongRequest>,
) -> RoomResult<Json<Vec<SearchSongResult>>> {
    let results = manager
        .search(&request.room_identifier, &request.query)
        .await?;
    Ok(Json(results))
}

pub async fn enqueue(
    State(manager): State<Arc<RoomManager>>,
    Json(request): Json<EnqueueTrackRequest>,
) -> RoomResult<StatusCode> {
    manager
        .enqueue_track(&request.room_identifier, &request.track_uri)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn devices(
    State(manager): State<Arc<RoomManager>>,
    Extension(UserId(user)): Extension<UserId>,
) -> RoomResult<Json<Vec<Device>>> {
    Ok(Json(manager.list_devices(&user).await?))
}

pub async fn force_device(
    State(manager): State<Arc<RoomManager>>,
    Extension(UserId(user)): Extension<UserId>,
    Query(query): Query<DeviceQuery>,
) -> RoomResult<StatusCode> {
    manager.force_device(&user, &query.device_id).await?;
    Ok(StatusCode::OK)
}
