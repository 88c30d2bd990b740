//! Request and response types for the backend auth endpoints and the session
//! JSON served to the frontend. Token fields must never be logged.

use super::error::SessionError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyRequest<'a> {
    pub session_token: &'a str,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub authenticated: bool,
    pub user: Option<BackendUser>,
}

/// User record as the backend sends it. Field spellings differ between
/// backend versions, hence the aliases.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BackendUser {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "image")]
    pub picture: Option<String>,
    pub organization_id: Option<String>,
    #[serde(default, alias = "email_verified")]
    pub is_email_verified: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Normalized identity exposed on the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub organization_id: Option<String>,
    pub email_verified: bool,
}

/// Session summary returned to the frontend on every read.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub user: User,
    pub session_token: String,
    /// Kept server-side; the browser never sees the refresh token.
    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,
    /// Access token expiry, unix seconds.
    pub access_token_expires: i64,
    /// Session cookie expiry, recomputed on every read (RFC 3339).
    pub expires: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

/// Credentials posted by the sign-in form.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub session_token: String,
    pub refresh_token: Option<String>,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // Some backends serialize numeric primary keys.
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invalid user id: {other}"
        ))),
    }
}
