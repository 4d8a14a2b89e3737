//! Spotify Room Server Library
//!
//! This library provides a small collaborative listening server: a host opens a
//! room backed by their Spotify account, guests join it with a short code, and
//! guests can force a skip of the current track by voting. It includes modules for
//! the room and session registry, the OAuth token lifecycle, the Spotify Web API
//! client, and the HTTP surface that exposes all of it.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for rooms, playback and the OAuth callback
//! - `config` - Configuration management and environment variables
//! - `errors` - Error taxonomy returned by room operations
//! - `management` - Session registry, votes, privileges, tokens and playback
//! - `server` - Router construction and the HTTP listener
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use spotiroom::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> spotiroom::Res<()> {
//!     config::load_env().await?;
//!     let settings = config::Settings::from_env()?;
//!     server::start_api_server(settings).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod errors;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used at the edges of the application (startup, configuration, server
/// lifecycle) where any error is fatal and only needs to be reported. Room
/// operations use the typed [`errors::RoomError`] instead.
///
/// # Type Parameters
///
/// - `T` - The success type returned on successful operations
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for general information and
/// status updates throughout the server.
///
/// # Example
///
/// ```
/// info!("Listening on {}", addr);
/// info!("Room {} created", code);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// Used to provide positive feedback when operations such as a login or a
/// vote-triggered skip complete successfully.
///
/// # Example
///
/// ```
/// success!("Room {} authenticated with Spotify", code);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only used for fatal startup errors (unreadable configuration, unbindable
/// address). Request handling never calls this macro.
///
/// # Behavior
///
/// This macro will cause the program to exit immediately after printing
/// the error message.
///
/// # Example
///
/// ```
/// error!("Failed to bind {}: {}", addr, e);
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues: failed upstream calls, failed token refreshes,
/// rejected login callbacks. The failure is still returned to the caller.
///
/// # Example
///
/// ```
/// warning!("Token refresh failed for room {}: {}", code, e);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
