use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

/// Characters allowed in a shareable room code.
pub const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const ROOM_CODE_LENGTH: usize = 5;
pub const USER_IDENTIFIER_LENGTH: usize = 20;

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Opaque value echoed back by Spotify on the OAuth callback.
pub fn generate_oauth_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Identifier bound to one browser through the identity cookie.
pub fn generate_user_identifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(USER_IDENTIFIER_LENGTH)
        .map(char::from)
        .collect()
}

/// Short room code built from [`ROOM_CODE_CHARSET`].
pub fn generate_room_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ROOM_CODE_CHARSET[rng.random_range(0..ROOM_CODE_CHARSET.len())] as char)
        .collect()
}

/// Room codes are typed by people; accept lower case and stray whitespace.
pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}
