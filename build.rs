//! Build script for the Spotify room server.
//!
//! Copies the `.env.example` configuration template into the user's local data
//! directory, next to where [`load_env`](../src/config.rs) looks for `.env`.
//! Operators get a ready-to-edit template in the expected location after
//! installation.

use std::{env, fs, path::PathBuf};

/// Copies `.env.example` into the local data directory.
///
/// # Destination Location
///
/// - Linux: `~/.local/share/spotiroom/.env.example`
/// - macOS: `~/Library/Application Support/spotiroom/.env.example`
/// - Windows: `%LOCALAPPDATA%/spotiroom/.env.example`
///
/// A missing template only produces a cargo warning; directory or copy
/// failures fail the build.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("spotiroom");
    fs::create_dir_all(&out_dir)?;

    if env_example_path.is_file() {
        fs::copy(&env_example_path, out_dir.join(".env.example"))?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
    }

    Ok(())
}
