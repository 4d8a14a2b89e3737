use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    api::UserId,
    errors::RoomResult,
    management::RoomManager,
    types::{CreateRoomRequest, RoomQuery, RoomView},
};

pub async fn create_room(
    State(manager): State<Arc<RoomManager>>,
    Extension(UserId(user)): Extension<UserId>,
    Json(request): Json<CreateRoomRequest>,
) -> RoomResult<Json<RoomView>> {
    let room = manager.create_room(&user, request.votes_to_skip, request.guest_can_pause)?;
    Ok(Json(room))
}

pub async fn my_room(
    State(manager): State<Arc<RoomManager>>,
    Extension(UserId(user)): Extension<UserId>,
) -> RoomResult<Json<RoomView>> {
    Ok(Json(manager.my_room(&user)?))
}

pub async fn get_room(
    State(manager): State<Arc<RoomManager>>,
    Extension(UserId(user)): Extension<UserId>,
    Query(query): Query<RoomQuery>,
) -> RoomResult<Json<RoomView>> {
    Ok(Json(manager.get_room(&user, &query.room_identifier)?))
}

pub async fn check_owner(
    State(manager): State<Arc<RoomManager>>,
    Extension(UserId(user)): Extension<UserId>,
    Query(query): Query<RoomQuery>,
) -> RoomResult<Json<bool>> {
    Ok(Json(
        manager.check_ownership(&user, &query.room_identifier)?,
    ))
}

pub async fn leave_room(
    State(manager): State<Arc<RoomManager>>,
    Extension(UserId(user)): Extension<UserId>,
    Query(query): Query<RoomQuery>,
) -> RoomResult<StatusCode> {
    manager.leave_room(&user, &query.room_identifier)?;
    Ok(StatusCode::OK)
}
