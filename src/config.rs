//! Configuration management for the room server.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage application
//! configuration including Spotify API credentials, server settings, and the
//! timing parameters of the token cache and the room registry.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf, str::FromStr};

use thiserror::Error;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SPOTIFY_SCOPE: &str = "user-read-playback-state user-modify-playback-state user-read-currently-playing";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:4200";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TOKEN_REFRESH_SKEW_SECS: i64 = 10;
pub const DEFAULT_ROOM_IDLE_TIMEOUT_SECS: i64 = 6 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the necessary directory structure if it doesn't exist and loads
/// environment variables from a `.env` file located in the platform-specific
/// local data directory under `spotiroom/.env`. A missing file is not an error:
/// the server can be configured from the process environment alone.
///
/// # Directory Structure
///
/// The function looks for the `.env` file in:
/// - Linux: `~/.local/share/spotiroom/.env`
/// - macOS: `~/Library/Application Support/spotiroom/.env`
/// - Windows: `%LOCALAPPDATA%/spotiroom/.env`
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or if an
/// existing `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotiroom/.env");
    path
}

/// Everything the server needs at runtime, read once at startup.
///
/// Handlers never touch the environment directly; the settings are injected
/// into the router state and the Spotify client.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub frontend_origin: String,
    pub http_timeout_secs: u64,
    pub token_refresh_skew_secs: i64,
    /// Zero disables idle eviction.
    pub room_idle_timeout_secs: i64,
}

impl Settings {
    /// Collects the settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when a required variable is absent and
    /// [`ConfigError::Invalid`] when a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server_addr: server_addr(),
            client_id: spotify_client_id()?,
            client_secret: spotify_client_secret(),
            redirect_uri: spotify_redirect_uri()?,
            scope: spotify_scope(),
            auth_url: spotify_apiauth_url(),
            token_url: spotify_apitoken_url(),
            api_url: spotify_apiurl(),
            frontend_origin: frontend_origin(),
            http_timeout_secs: parsed_or("SPOTIFY_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            token_refresh_skew_secs: parsed_or(
                "TOKEN_REFRESH_SKEW_SECS",
                DEFAULT_TOKEN_REFRESH_SKEW_SECS,
            )?,
            room_idle_timeout_secs: parsed_or(
                "ROOM_IDLE_TIMEOUT_SECS",
                DEFAULT_ROOM_IDLE_TIMEOUT_SECS,
            )?,
        })
    }

    /// Settings pointing at the public Spotify endpoints with all defaults.
    pub fn with_client(client_id: &str, redirect_uri: &str) -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDRESS.to_string(),
            client_id: client_id.to_string(),
            client_secret: None,
            redirect_uri: redirect_uri.to_string(),
            scope: DEFAULT_SPOTIFY_SCOPE.to_string(),
            auth_url: DEFAULT_SPOTIFY_AUTH_URL.to_string(),
            token_url: DEFAULT_SPOTIFY_TOKEN_URL.to_string(),
            api_url: DEFAULT_SPOTIFY_API_URL.to_string(),
            frontend_origin: DEFAULT_FRONTEND_ORIGIN.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            token_refresh_skew_secs: DEFAULT_TOKEN_REFRESH_SKEW_SECS,
            room_idle_timeout_secs: DEFAULT_ROOM_IDLE_TIMEOUT_SECS,
        }
    }
}

/// Returns the address the HTTP server binds to.
///
/// Reads `SERVER_ADDRESS`, falling back to `127.0.0.1:8080`.
pub fn server_addr() -> String {
    env::var("SERVER_ADDRESS").unwrap_or_else(|_| DEFAULT_SERVER_ADDRESS.to_string())
}

/// Returns the Spotify API client ID for authentication.
///
/// Retrieves the `SPOTIFY_API_AUTH_CLIENT_ID` environment variable which
/// contains the client ID obtained when registering the application with
/// Spotify's developer platform.
pub fn spotify_client_id() -> Result<String, ConfigError> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// Returns the Spotify API client secret, if configured.
///
/// When present, token requests authenticate with HTTP Basic in addition to
/// the PKCE verifier. The secret should never be logged.
pub fn spotify_client_secret() -> Option<String> {
    env::var("SPOTIFY_API_AUTH_CLIENT_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
}

/// Returns the Spotify OAuth redirect URI.
///
/// This must match the redirect URI registered in the Spotify application
/// settings and point at this server's `/spotify/callback` route.
pub fn spotify_redirect_uri() -> Result<String, ConfigError> {
    required("SPOTIFY_API_REDIRECT_URI")
}

/// Returns the Spotify API scope permissions requested at login.
pub fn spotify_scope() -> String {
    env::var("SPOTIFY_API_AUTH_SCOPE").unwrap_or_else(|_| DEFAULT_SPOTIFY_SCOPE.to_string())
}

/// Returns the Spotify OAuth authorization URL.
pub fn spotify_apiauth_url() -> String {
    env::var("SPOTIFY_API_AUTH_URL").unwrap_or_else(|_| DEFAULT_SPOTIFY_AUTH_URL.to_string())
}

/// Returns the Spotify Web API base URL.
pub fn spotify_apiurl() -> String {
    env::var("SPOTIFY_API_URL").unwrap_or_else(|_| DEFAULT_SPOTIFY_API_URL.to_string())
}

/// Returns the Spotify OAuth token exchange URL.
pub fn spotify_apitoken_url() -> String {
    env::var("SPOTIFY_API_TOKEN_URL").unwrap_or_else(|_| DEFAULT_SPOTIFY_TOKEN_URL.to_string())
}

/// Returns the browser origin allowed to call the API with credentials.
pub fn frontend_origin() -> String {
    env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGIN.to_string())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parsed_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
