use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::utils;

pub const IDENTITY_COOKIE: &str = "spotiroom_uid";

/// The caller's opaque identifier, taken from the identity cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

/// Attaches a [`UserId`] to every request.
///
/// A missing or malformed cookie gets a fresh identifier, which is sent back
/// with the response so the browser keeps it.
pub async fn identify(jar: CookieJar, mut request: Request, next: Next) -> Response {
    let existing = jar
        .get(IDENTITY_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| is_valid_identifier(v));

    let (user, jar) = match existing {
        Some(user) => (user, jar),
        None => {
            let user = utils::generate_user_identifier();
            let cookie = Cookie::build((IDENTITY_COOKIE, user.clone()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            (user, jar.add(cookie))
        }
    };

    request.extensions_mut().insert(UserId(user));
    (jar, next.run(request).await).into_response()
}

pub fn is_valid_identifier(value: &str) -> bool {
    value.len() == utils::USER_IDENTIFIER_LENGTH
        && value.chars().all(|c| c.is_ascii_alphanumeric())
}
