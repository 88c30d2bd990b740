//! Proactive access token refresh.
//!
//! Flow Overview:
//! 1. Every session read classifies the token with `TokenState::state_at`.
//! 2. `Fresh` tokens (more than 60s before expiry) are returned untouched; no
//!    network call is made.
//! 3. `Stale` tokens are exchanged through `POST /auth/refresh`. The new expiry
//!    comes from the new token's `exp` claim, or now + 15 minutes when the
//!    token does not decode.
//! 4. A stale token without a refresh token is tagged `RefreshTokenMissing`;
//!    a failed exchange is tagged `RefreshTokenError` and keeps the old values.
//!
//! There is no retry or backoff here. A failed refresh is surfaced once and the
//! next read tries again because the token is still stale.

use super::{
    codec,
    error::SessionError,
    types::{RefreshRequest, RefreshResponse},
    Backend, Error,
};
use tracing::{debug, error, info, instrument, warn};

/// Seconds before expiry at which a token counts as stale.
pub const REFRESH_LEEWAY_SECONDS: i64 = 60;
/// Lifetime assumed for access tokens whose `exp` cannot be read.
pub const FALLBACK_ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefreshState {
    Fresh,
    Stale,
    NoRefreshToken,
    RefreshFailed,
}

/// Result of a `refresh_if_stale` pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Fresh,
    Refreshed,
    Invalidated(SessionError),
}

/// Token half of a session record.
#[derive(Clone)]
pub struct TokenState {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub access_token_expires: i64,
    pub error: Option<SessionError>,
}

impl std::fmt::Debug for TokenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token", &"[redacted]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("access_token_expires", &self.access_token_expires)
            .field("error", &self.error)
            .finish()
    }
}

impl TokenState {
    #[must_use]
    pub fn new(access_token: String, refresh_token: Option<String>, now: i64) -> Self {
        let access_token_expires = access_token_expiry(&access_token, now);
        Self {
            access_token,
            refresh_token: refresh_token.filter(|token| !token.is_empty()),
            access_token_expires,
            error: None,
        }
    }

    #[must_use]
    pub fn state_at(&self, now: i64) -> RefreshState {
        if now < self.access_token_expires.saturating_sub(REFRESH_LEEWAY_SECONDS) {
            RefreshState::Fresh
        } else if self.refresh_token.is_none() {
            RefreshState::NoRefreshToken
        } else if self.error == Some(SessionError::RefreshTokenError) {
            RefreshState::RefreshFailed
        } else {
            RefreshState::Stale
        }
    }
}

/// Expiry of `token` from its `exp` claim, falling back to now + 15 minutes.
#[must_use]
pub fn access_token_expiry(token: &str, now: i64) -> i64 {
    codec::parse(token)
        .and_then(|token| token.expires_at())
        .unwrap_or_else(|| now.saturating_add(FALLBACK_ACCESS_TOKEN_TTL_SECONDS))
}

/// Exchange a refresh token for a new access/refresh pair.
///
/// # Errors
/// Returns an error on network failure, a non-OK status or a malformed body.
#[instrument(skip_all)]
pub async fn refresh_access_token(
    backend: &Backend,
    refresh_token: &str,
) -> Result<RefreshResponse, Error> {
    let refresh_url = backend.endpoint_url("/auth/refresh");

    let response = backend
        .client()
        .post(&refresh_url)
        .json(&RefreshRequest { refresh_token })
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(Error::Status {
            url: refresh_url,
            status: response.status(),
        });
    }

    let tokens: RefreshResponse = response.json().await?;

    if tokens.access_token.is_empty() {
        return Err(Error::MissingField("access_token"));
    }

    Ok(tokens)
}

/// Refresh `state` in place when it is stale at `now`.
#[instrument(skip(backend))]
pub async fn refresh_if_stale(backend: &Backend, state: &mut TokenState, now: i64) -> Outcome {
    let refresh_token = match state.state_at(now) {
        RefreshState::Fresh => return Outcome::Fresh,
        RefreshState::NoRefreshToken => {
            warn!("Access token is stale and no refresh token is available");

            state.error = Some(SessionError::RefreshTokenMissing);

            return Outcome::Invalidated(SessionError::RefreshTokenMissing);
        }
        RefreshState::Stale | RefreshState::RefreshFailed => {
            match state.refresh_token.clone() {
                Some(token) => token,
                None => return Outcome::Invalidated(SessionError::RefreshTokenMissing),
            }
        }
    };

    debug!(
        "Access token expires in {} seconds, refreshing",
        state.access_token_expires.saturating_sub(now)
    );

    match refresh_access_token(backend, &refresh_token).await {
        Ok(tokens) => {
            state.access_token_expires = access_token_expiry(&tokens.access_token, now);
            state.access_token = tokens.access_token;
            if !tokens.refresh_token.is_empty() {
                state.refresh_token = Some(tokens.refresh_token);
            }
            state.error = None;

            info!(
                "Access token refreshed, valid for {} seconds",
                state.access_token_expires.saturating_sub(now)
            );

            Outcome::Refreshed
        }
        Err(e) => {
            error!("Error refreshing access token: {}", e);

            state.error = Some(SessionError::RefreshTokenError);

            Outcome::Invalidated(SessionError::RefreshTokenError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{codec::tests::jwt_with, AuthConfig};
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NOW: i64 = 1_700_000_000;

    fn backend(uri: &str) -> Backend {
        Backend::new(&AuthConfig::new(
            uri.to_string(),
            SecretString::from("secret".to_string()),
        ))
        .unwrap()
    }

    fn token_expiring_at(exp: i64) -> String {
        jwt_with(&json!({ "sub": "user-1", "exp": exp }))
    }

    #[test]
    fn expiry_comes_from_exp_claim() {
        assert_eq!(access_token_expiry(&token_expiring_at(NOW + 300), NOW), NOW + 300);
    }

    #[test]
    fn expiry_falls_back_for_opaque_tokens() {
        assert_eq!(access_token_expiry("opaque", NOW), NOW + 900);
        assert_eq!(access_token_expiry("abc.def.ghi", NOW), NOW + 900);
    }

    #[test]
    fn state_classification() {
        let mut state = TokenState::new(
            token_expiring_at(NOW + 61),
            Some("refresh".to_string()),
            NOW,
        );
        assert_eq!(state.state_at(NOW), RefreshState::Fresh);
        assert_eq!(state.state_at(NOW + 1), RefreshState::Stale);
        assert_eq!(state.state_at(NOW + 500), RefreshState::Stale);

        state.error = Some(SessionError::RefreshTokenError);
        assert_eq!(state.state_at(NOW + 1), RefreshState::RefreshFailed);

        state.refresh_token = None;
        assert_eq!(state.state_at(NOW + 1), RefreshState::NoRefreshToken);
        assert_eq!(state.state_at(NOW), RefreshState::Fresh);
    }

    #[test]
    fn empty_refresh_token_counts_as_missing() {
        let state = TokenState::new(token_expiring_at(NOW), Some(String::new()), NOW);
        assert_eq!(state.state_at(NOW), RefreshState::NoRefreshToken);
    }

    #[test]
    fn extreme_exp_claims_do_not_overflow() {
        let state = TokenState::new(
            jwt_with(&json!({ "exp": -1e300 })),
            Some("refresh".to_string()),
            NOW,
        );
        assert_eq!(state.access_token_expires, NOW + FALLBACK_ACCESS_TOKEN_TTL_SECONDS);
        assert_eq!(state.state_at(NOW), RefreshState::Fresh);

        let state = TokenState::new(token_expiring_at(i64::MIN), Some("refresh".to_string()), NOW);
        assert_eq!(state.access_token_expires, i64::MIN);
        assert_eq!(state.state_at(NOW), RefreshState::Stale);

        let state = TokenState::new(token_expiring_at(i64::MAX), Some("refresh".to_string()), NOW);
        assert_eq!(state.state_at(NOW), RefreshState::Fresh);
    }

    #[tokio::test]
    async fn long_expired_token_is_refreshed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": token_expiring_at(NOW + 3600),
                "refresh_token": "refresh-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut state = TokenState::new(
            token_expiring_at(i64::MIN),
            Some("refresh-1".to_string()),
            NOW,
        );

        let outcome = refresh_if_stale(&backend(&server.uri()), &mut state, NOW).await;

        assert_eq!(outcome, Outcome::Refreshed);
        assert_eq!(state.access_token_expires, NOW + 3600);
    }

    #[test]
    fn debug_redacts_tokens() {
        let state = TokenState::new("secret-token".to_string(), None, NOW);
        assert!(!format!("{state:?}").contains("secret-token"));
    }

    #[tokio::test]
    async fn fresh_token_makes_no_call() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let access = token_expiring_at(NOW + 3600);
        let mut state = TokenState::new(access.clone(), Some("refresh".to_string()), NOW);

        let outcome = refresh_if_stale(&backend(&server.uri()), &mut state, NOW).await;

        assert_eq!(outcome, Outcome::Fresh);
        assert_eq!(state.access_token, access);
    }

    #[tokio::test]
    async fn stale_token_is_refreshed_once() {
        let server = MockServer::start().await;
        let new_access = token_expiring_at(NOW + 3600);

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(json!({ "refresh_token": "refresh-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": new_access,
                "refresh_token": "refresh-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut state = TokenState::new(
            token_expiring_at(NOW + 30),
            Some("refresh-1".to_string()),
            NOW,
        );
        state.error = Some(SessionError::RefreshTokenError);

        let outcome = refresh_if_stale(&backend(&server.uri()), &mut state, NOW).await;

        assert_eq!(outcome, Outcome::Refreshed);
        assert_eq!(state.access_token, new_access);
        assert_eq!(state.refresh_token.as_deref(), Some("refresh-2"));
        assert_eq!(state.access_token_expires, NOW + 3600);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn refreshed_opaque_token_gets_fallback_expiry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "opaque-access",
                "refresh_token": "refresh-2"
            })))
            .mount(&server)
            .await;

        let mut state = TokenState::new(
            token_expiring_at(NOW - 10),
            Some("refresh-1".to_string()),
            NOW,
        );

        refresh_if_stale(&backend(&server.uri()), &mut state, NOW).await;

        assert_eq!(state.access_token, "opaque-access");
        assert_eq!(state.access_token_expires, NOW + FALLBACK_ACCESS_TOKEN_TTL_SECONDS);
    }

    #[tokio::test]
    async fn missing_refresh_token_makes_no_call() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut state = TokenState::new(token_expiring_at(NOW + 10), None, NOW);

        let outcome = refresh_if_stale(&backend(&server.uri()), &mut state, NOW).await;

        assert_eq!(
            outcome,
            Outcome::Invalidated(SessionError::RefreshTokenMissing)
        );
        assert_eq!(state.error, Some(SessionError::RefreshTokenMissing));
    }

    #[tokio::test]
    async fn server_error_keeps_previous_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "detail": "boom"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stale = token_expiring_at(NOW - 5);
        let mut state = TokenState::new(stale.clone(), Some("refresh-1".to_string()), NOW);

        let outcome = refresh_if_stale(&backend(&server.uri()), &mut state, NOW).await;

        assert_eq!(outcome, Outcome::Invalidated(SessionError::RefreshTokenError));
        assert_eq!(state.error, Some(SessionError::RefreshTokenError));
        assert_eq!(state.access_token, stale);
        assert_eq!(state.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(state.access_token_expires, NOW - 5);
    }

    #[tokio::test]
    async fn failed_refresh_is_retried_on_next_read() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;

        let backend = backend(&server.uri());
        let mut state = TokenState::new(
            token_expiring_at(NOW),
            Some("refresh-1".to_string()),
            NOW,
        );

        refresh_if_stale(&backend, &mut state, NOW).await;
        let outcome = refresh_if_stale(&backend, &mut state, NOW + 1).await;

        assert_eq!(outcome, Outcome::Invalidated(SessionError::RefreshTokenError));
    }
}
