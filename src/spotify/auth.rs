use reqwest::{Client, RequestBuilder, Url};

use crate::{
    config::Settings,
    spotify::{ApiError, check_response},
    types::TokenGrant,
};

/// Builds the Spotify authorization URL for an authorization code + PKCE login.
///
/// The host's browser is sent to this URL by the login endpoint. Spotify
/// redirects back to the configured redirect URI with `code` and the same
/// `state`, which the callback handler checks against the pending login.
///
/// # Arguments
///
/// * `settings` - Client ID, redirect URI, scope and accounts URL
/// * `code_challenge` - SHA256 challenge derived from the session's verifier
/// * `state` - Opaque value tying the callback to the room that started the login
///
/// # Example
///
/// ```
/// let url = authorize_url(&settings, &challenge, &state)?;
/// assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
/// ```
pub fn authorize_url(
    settings: &Settings,
    code_challenge: &str,
    state: &str,
) -> Result<String, ApiError> {
    let url = Url::parse_with_params(
        &settings.auth_url,
        &[
            ("client_id", settings.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", settings.redirect_uri.as_str()),
            ("code_challenge_method", "S256"),
            ("code_challenge", code_challenge),
            ("state", state),
            ("scope", settings.scope.as_str()),
            ("show_dialog", "true"),
        ],
    )
    .map_err(|e| ApiError::Decode(e.to_string()))?;

    Ok(url.to_string())
}

/// Exchanges an authorization code for an access token using PKCE.
///
/// Completes the OAuth 2.0 flow by exchanging the authorization code received
/// on the callback. The verifier must be the one whose challenge was sent in
/// the authorization URL.
///
/// # Arguments
///
/// * `code` - Authorization code received from the OAuth callback
/// * `verifier` - PKCE code verifier stored on the session when the login started
///
/// # Error Handling
///
/// Common failure scenarios:
/// - Invalid or expired authorization code (`Status { status: 400, .. }`)
/// - Code verifier doesn't match the challenge
/// - Network connectivity issues or timeouts
pub async fn exchange_code_pkce(
    client: &Client,
    settings: &Settings,
    code: &str,
    verifier: &str,
) -> Result<TokenGrant, ApiError> {
    let request = client.post(&settings.token_url).form(&[
        ("grant_type", "authorization_code"),
        ("client_id", settings.client_id.as_str()),
        ("code", code),
        ("code_verifier", verifier),
        ("redirect_uri", settings.redirect_uri.as_str()),
    ]);

    let response = with_client_secret(request, settings).send().await?;
    let grant = check_response(response).await?.json::<TokenGrant>().await?;
    Ok(grant)
}

/// Refreshes an expired access token using a refresh token.
///
/// The response may or may not carry a new refresh token; merging the grant
/// into the stored token is left to the token lifecycle manager.
///
/// # Arguments
///
/// * `refresh_token` - Refresh token obtained from the code exchange
///
/// # Error Conditions
///
/// - Invalid or revoked refresh token (`Status { status: 400, .. }`)
/// - Network connectivity issues or timeouts
pub async fn refresh_token(
    client: &Client,
    settings: &Settings,
    refresh_token: &str,
) -> Result<TokenGrant, ApiError> {
    let request = client.post(&settings.token_url).form(&[
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", settings.client_id.as_str()),
    ]);

    let response = with_client_secret(request, settings).send().await?;
    let grant = check_response(response).await?.json::<TokenGrant>().await?;
    Ok(grant)
}

fn with_client_secret(request: RequestBuilder, settings: &Settings) -> RequestBuilder {
    match &settings.client_secret {
        Some(secret) => request.basic_auth(&settings.client_id, Some(secret)),
        None => request,
    }
}
