use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::{
    Res, api,
    config::Settings,
    info,
    management::RoomManager,
    spotify::{PlaybackApi, SpotifyWebApi},
};

/// Builds the full route table on top of `manager`.
///
/// The browser app lives on another origin and sends the identity cookie, so
/// CORS allows exactly that origin with credentials.
pub fn router(manager: Arc<RoomManager>, frontend_origin: &str) -> Res<Router> {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_str(frontend_origin)?)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let room_routes = Router::new()
        .route("/create-room", post(api::create_room))
        .route("/mine", get(api::my_room))
        .route("/get-room", get(api::get_room))
        .route("/check-owner", get(api::check_owner))
        .route("/leave-room", post(api::leave_room));

    let spotify_routes = Router::new()
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .route("/auth-status", get(api::auth_status))
        .route("/current-song", get(api::current_song))
        .route("/skip-song", post(api::skip_song))
        .route("/toggle-playback", post(api::toggle_playback))
        .route("/rollback", post(api::rollback))
        .route("/search", post(api::search))
        .route("/enqueue", post(api::enqueue))
        .route("/devices", get(api::devices))
        .route("/force-device", post(api::force_device));

    let app = Router::new()
        .route("/health", get(api::health))
        .nest("/room", room_routes)
        .nest("/spotify", spotify_routes)
        .layer(middleware::from_fn(api::identify))
        .layer(cors)
        .with_state(manager);

    Ok(app)
}

/// Wires the Spotify client, the room manager and the router, then serves
/// until Ctrl-C.
pub async fn start_api_server(settings: Settings) -> Res<()> {
    let addr = SocketAddr::from_str(&settings.server_addr)?;

    let api: Arc<dyn PlaybackApi> = Arc::new(SpotifyWebApi::new(&settings)?);
    let manager = Arc::new(RoomManager::from_settings(api, &settings));
    let app = router(manager, &settings.frontend_origin)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
