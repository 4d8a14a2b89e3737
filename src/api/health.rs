use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use crate::management::RoomManager;

pub async fn health(State(manager): State<Arc<RoomManager>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "rooms": manager.registry().len()
    }))
}
