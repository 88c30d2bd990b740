//! Authentication session lifecycle: credential verification against the
//! backend, token decoding, proactive refresh and the cookie-backed session
//! store. This module handles bearer and refresh tokens; never log them.

pub mod codec;
pub mod config;
pub mod cookie;
pub mod error;
pub mod refresh;
pub mod session;
pub mod types;
pub mod verify;

pub use config::{is_development_env, resolve_backend_url, AuthConfig};
pub use error::{Error, SessionError};
pub use session::SessionStore;
pub use types::{Session, User};

use reqwest::Client;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument};
use url::Url;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// HTTP client bound to the backend base URL.
#[derive(Clone, Debug)]
pub struct Backend {
    client: Client,
    base_url: String,
}

impl Backend {
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn new(config: &AuthConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url(config.backend_url())?,
        })
    }

    #[must_use]
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }
}

/// Normalize the backend URL, keeping any path prefix the backend is
/// mounted under.
#[instrument]
fn base_url(backend_url: &str) -> Result<String, Error> {
    let url = Url::parse(backend_url)?;

    let host = url
        .host_str()
        .ok_or(Error::Url(url::ParseError::EmptyHost))?;

    let port = url.port_or_known_default().ok_or(Error::Url(url::ParseError::InvalidPort))?;

    let path = url.path().trim_end_matches('/');

    let base_url = format!("{}://{host}:{port}{path}", url.scheme());

    debug!("backend base URL: {}", base_url);

    Ok(base_url)
}

/// Current time in unix seconds.
#[must_use]
pub fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
