//! Session endpoints mirroring the `NextAuth` routes the frontend calls.
//!
//! Flow Overview: the sign-in form posts the backend-issued token to the
//! credentials callback, which verifies it and sets the session cookie. Every
//! later `GET /api/auth/session` refreshes the access token when it is about to
//! expire and re-issues the cookie. Sign-out drops the record and always clears
//! the cookie.

use crate::auth::{
    codec,
    cookie::{clear_session_cookie, extract_session_id, session_cookie},
    types::SignInRequest,
    verify, Session, SessionStore,
};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

/// Auth-related flags the UI needs before a session exists.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct AuthSettings {
    pub sign_out_enabled: bool,
    pub quick_start: bool,
}

#[utoipa::path(
    post,
    path = "/api/auth/callback/credentials",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Session created", body = Session),
        (status = 400, description = "Missing payload"),
        (status = 401, description = "Credentials rejected")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn callback(
    store: Extension<Arc<SessionStore>>,
    payload: Option<Json<SignInRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    // The form may hand us a raw backend token or an already-encoded session.
    let Some(token) = codec::parse(request.session_token.trim()) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let Some(session_token) = token.session_token() else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let claims = token.claims();
    let refresh_token = request
        .refresh_token
        .as_deref()
        .or_else(|| claims.get("refresh_token").and_then(Value::as_str));

    let Some(verified) = verify::verify(store.backend(), session_token, refresh_token).await
    else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let (session_id, session) = match store.create(verified).await {
        Ok(created) => created,
        Err(err) => {
            error!("Failed to create session: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut headers = HeaderMap::new();
    match session_cookie(store.config(), &session_id) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to set session cookie: {err}");
            store.destroy(&session_id).await;
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    (StatusCode::OK, headers, Json(session)).into_response()
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Session is active; `error` is set when the refresh failed", body = Session),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn session(headers: HeaderMap, store: Extension<Arc<SessionStore>>) -> Response {
    // Missing cookies are treated as "no session" to avoid leaking auth state.
    let Some(session_id) = extract_session_id(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let mut response_headers = HeaderMap::new();

    match store.read(&session_id).await {
        Some(session) => {
            // Sliding expiry: every read extends the cookie.
            if let Ok(cookie) = session_cookie(store.config(), &session_id) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            (StatusCode::OK, response_headers, Json(session)).into_response()
        }
        None => {
            debug!("Session cookie does not match a live session");
            if let Ok(cookie) = clear_session_cookie(store.config()) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            (StatusCode::NO_CONTENT, response_headers).into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/signout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn signout(headers: HeaderMap, store: Extension<Arc<SessionStore>>) -> Response {
    if let Some(session_id) = extract_session_id(&headers) {
        store.destroy(&session_id).await;
    }

    // Always clear the cookie, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(store.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

#[utoipa::path(
    get,
    path = "/api/auth/config",
    responses(
        (status = 200, description = "Auth UI flags", body = AuthSettings)
    ),
    tag = "auth"
)]
pub async fn config(store: Extension<Arc<SessionStore>>) -> Json<AuthSettings> {
    Json(AuthSettings {
        sign_out_enabled: store.config().sign_out_enabled(),
        quick_start: store.config().quick_start(),
    })
}
