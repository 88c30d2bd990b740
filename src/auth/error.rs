use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} - {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("missing field in response: {0}")]
    MissingField(&'static str),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to generate session id")]
    Rng(#[from] rand::Error),
    #[error("unknown session")]
    UnknownSession,
}

/// Failure tag carried by a session after a refresh attempt went wrong.
///
/// The tag is serialized as-is into the session JSON; the frontend treats any
/// tagged session as signed out and redirects to sign-in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SessionError {
    /// Stale session without a refresh token; terminal until re-login.
    RefreshTokenMissing,
    /// The backend rejected the refresh or could not be reached.
    RefreshTokenError,
}

impl SessionError {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionError::RefreshTokenMissing => "RefreshTokenMissing",
            SessionError::RefreshTokenError => "RefreshTokenError",
        }
    }
}
