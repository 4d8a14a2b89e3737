use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::errors::RoomError;

impl RoomError {
    pub fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidSettings(_) | Self::InvalidLoginState(_) => StatusCode::BAD_REQUEST,
            Self::NotAuthenticated | Self::RefreshFailed(_) => StatusCode::UNAUTHORIZED,
            Self::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.as_status_code(), body).into_response()
    }
}
