use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    errors::{RoomError, RoomResult},
    spotify::{ApiError, PlaybackApi},
    types::{SpotifyToken, TokenGrant},
    utils, warning,
};

#[derive(Debug, Clone, Default)]
pub enum TokenState {
    #[default]
    Unauthenticated,
    Active(SpotifyToken),
    /// The last refresh failed; the host has to log in again
    Unusable(SpotifyToken),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Unauthenticated,
    Valid,
    ExpiringSoon,
    Unusable,
}

/// Holds a session's token behind an async lock.
///
/// The lock is held for the whole refresh round trip, so concurrent callers
/// wait for the refresh in progress instead of starting their own.
#[derive(Debug, Default)]
pub struct TokenCell {
    state: Mutex<TokenState>,
}

impl TokenCell {
    pub async fn install(&self, token: SpotifyToken) {
        *self.state.lock().await = TokenState::Active(token);
    }

    pub async fn status(&self, now: i64, skew_secs: i64) -> TokenStatus {
        match &*self.state.lock().await {
            TokenState::Unauthenticated => TokenStatus::Unauthenticated,
            TokenState::Unusable(_) => TokenStatus::Unusable,
            TokenState::Active(token) if is_expiring(token, now, skew_secs) => {
                TokenStatus::ExpiringSoon
            }
            TokenState::Active(_) => TokenStatus::Valid,
        }
    }

    /// The usable token, if any.
    pub async fn current(&self) -> Option<SpotifyToken> {
        match &*self.state.lock().await {
            TokenState::Active(token) => Some(token.clone()),
            _ => None,
        }
    }
}

/// Drives the OAuth token lifecycle for every session.
pub struct TokenManager {
    api: Arc<dyn PlaybackApi>,
    skew_secs: i64,
}

impl TokenManager {
    pub fn new(api: Arc<dyn PlaybackApi>, skew_secs: i64) -> Self {
        TokenManager { api, skew_secs }
    }

    pub fn skew_secs(&self) -> i64 {
        self.skew_secs
    }

    /// Trades the callback's authorization code for a token.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> RoomResult<SpotifyToken> {
        let grant = self.api.exchange_authorization_code(code, verifier).await?;
        token_from_grant(grant, utils::now_timestamp())
    }

    /// Returns an access token that is good for at least the skew window,
    /// refreshing it first when needed.
    ///
    /// A failed refresh marks the token unusable and is not retried here.
    pub async fn ensure_valid(&self, cell: &TokenCell) -> RoomResult<String> {
        let mut state = cell.state.lock().await;

        let token = match &*state {
            TokenState::Active(token) => token.clone(),
            TokenState::Unauthenticated | TokenState::Unusable(_) => {
                return Err(RoomError::NotAuthenticated);
            }
        };

        if !is_expiring(&token, utils::now_timestamp(), self.skew_secs) {
            return Ok(token.access_token);
        }

        self.refresh_locked(&mut state, token).await
    }

    /// Refreshes after Spotify rejected `rejected_access_token` with a 401.
    ///
    /// If another request already replaced that token, its replacement is
    /// returned without a second refresh.
    pub async fn refresh_rejected(
        &self,
        cell: &TokenCell,
        rejected_access_token: &str,
    ) -> RoomResult<String> {
        let mut state = cell.state.lock().await;

        let token = match &*state {
            TokenState::Active(token) if token.access_token != rejected_access_token => {
                return Ok(token.access_token.clone());
            }
            TokenState::Active(token) => token.clone(),
            TokenState::Unauthenticated | TokenState::Unusable(_) => {
                return Err(RoomError::NotAuthenticated);
            }
        };

        self.refresh_locked(&mut state, token).await
    }

    async fn refresh_locked(
        &self,
        state: &mut TokenState,
        token: SpotifyToken,
    ) -> RoomResult<String> {
        match self.api.refresh_access_token(&token.refresh_token).await {
            Ok(grant) => {
                let refreshed = merge_grant(&token, grant, utils::now_timestamp());
                let access_token = refreshed.access_token.clone();
                *state = TokenState::Active(refreshed);
                Ok(access_token)
            }
            Err(e) => {
                warning!("Spotify token refresh failed: {}", e);
                *state = TokenState::Unusable(token);
                Err(RoomError::RefreshFailed(e.to_string()))
            }
        }
    }
}

pub fn is_expiring(token: &SpotifyToken, now: i64, skew_secs: i64) -> bool {
    now >= token.expires_at - skew_secs
}

/// Builds a token from a code exchange, which must carry a refresh token.
pub fn token_from_grant(grant: TokenGrant, now: i64) -> RoomResult<SpotifyToken> {
    let refresh_token = grant
        .refresh_token
        .ok_or_else(|| ApiError::Decode("token response without refresh_token".to_string()))?;

    Ok(SpotifyToken {
        access_token: grant.access_token,
        refresh_token,
        scope: grant.scope.unwrap_or_default(),
        token_type: grant.token_type.unwrap_or_else(|| "Bearer".to_string()),
        expires_at: now + grant.expires_in,
    })
}

/// Applies a refresh grant, keeping whatever the response left out.
pub fn merge_grant(token: &SpotifyToken, grant: TokenGrant, now: i64) -> SpotifyToken {
    SpotifyToken {
        access_token: grant.access_token,
        refresh_token: grant
            .refresh_token
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| token.refresh_token.clone()),
        scope: grant.scope.unwrap_or_else(|| token.scope.clone()),
        token_type: grant.token_type.unwrap_or_else(|| token.token_type.clone()),
        expires_at: now + grant.expires_in,
    }
}
