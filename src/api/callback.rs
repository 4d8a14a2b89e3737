use std::sync::Arc;

use axum::{
    Extension,
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};

use crate::{api::UserId, management::RoomManager, types::CallbackQuery, warning};

const LOGIN_SUCCESS_PAGE: &str = "<h2>Authentication successful.</h2>\
    <p>You can close this window.</p>\
    <script>window.close();</script>";

/// Spotify redirects the host's browser here after the consent screen.
pub async fn callback(
    State(manager): State<Arc<RoomManager>>,
    Extension(UserId(user)): Extension<UserId>,
    Query(params): Query<CallbackQuery>,
) -> (StatusCode, Html<&'static str>) {
    if let Some(reason) = params.error {
        warning!("Spotify login was declined: {}", reason);
        return (StatusCode::BAD_REQUEST, Html("<h4>Login was declined.</h4>"));
    }

    let (Some(code), Some(state)) = (params.code, params.state) else {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>Missing authorization code.</h4>"),
        );
    };

    match manager.complete_login(&user, &code, &state).await {
        Ok(_) => (StatusCode::OK, Html(LOGIN_SUCCESS_PAGE)),
        Err(e) => {
            warning!("Login callback failed: {}", e);
            (e.as_status_code(), Html("<h4>Login failed.</h4>"))
        }
    }
}
