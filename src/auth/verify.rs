use super::{
    types::{BackendUser, User, VerifyRequest, VerifyResponse},
    Backend, Error,
};
use regex::Regex;
use tracing::{error, instrument, warn};
use url::Url;

const GOOGLE_PICTURE_HOST: &str = "googleusercontent.com";
const GOOGLE_PICTURE_SIZE: &str = "=s96-c";

/// Identity confirmed by the backend together with the tokens that proved it.
#[derive(Clone, Debug)]
pub struct VerifiedUser {
    pub user: User,
    pub session_token: String,
    pub refresh_token: Option<String>,
}

/// Verify a session token against `POST /auth/verify`.
///
/// Fails closed: any non-OK status, malformed body or network error yields
/// `None`, indistinguishable from wrong credentials.
#[instrument(skip_all)]
pub async fn verify(
    backend: &Backend,
    session_token: &str,
    refresh_token: Option<&str>,
) -> Option<VerifiedUser> {
    if session_token.trim().is_empty() {
        return None;
    }

    let response = match request_verify(backend, session_token).await {
        Ok(response) => response,
        Err(e) => {
            error!("Error verifying session token: {}", e);

            return None;
        }
    };

    let Some(user) = response.user.filter(|_| response.authenticated) else {
        warn!("Session token rejected by backend");

        return None;
    };

    Some(VerifiedUser {
        user: normalize_user(user),
        session_token: session_token.to_string(),
        refresh_token: refresh_token.map(ToString::to_string),
    })
}

async fn request_verify(backend: &Backend, session_token: &str) -> Result<VerifyResponse, Error> {
    let verify_url = backend.endpoint_url("/auth/verify");

    let response = backend
        .client()
        .post(&verify_url)
        .json(&VerifyRequest { session_token })
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(Error::Status {
            url: verify_url,
            status: response.status(),
        });
    }

    Ok(response.json::<VerifyResponse>().await?)
}

fn normalize_user(user: BackendUser) -> User {
    User {
        id: user.id,
        name: user.name,
        email: user.email,
        image: user.picture.as_deref().map(normalize_picture),
        organization_id: user.organization_id.filter(|id| !id.is_empty()),
        email_verified: user.is_email_verified,
    }
}

fn is_google_picture_host(host: &str) -> bool {
    host == GOOGLE_PICTURE_HOST
        || host
            .strip_suffix(GOOGLE_PICTURE_HOST)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Pin Google-hosted profile pictures to the 96px thumbnail.
#[must_use]
pub fn normalize_picture(picture: &str) -> String {
    let is_google = Url::parse(picture)
        .ok()
        .and_then(|url| url.host_str().map(is_google_picture_host))
        .unwrap_or(false);

    if !is_google {
        return picture.to_string();
    }

    Regex::new(r"=s\d+(-c)?$").map_or_else(
        |_| picture.to_string(),
        |re| {
            if re.is_match(picture) {
                re.replace(picture, GOOGLE_PICTURE_SIZE).into_owned()
            } else {
                format!("{picture}{GOOGLE_PICTURE_SIZE}")
            }
        },
    )
}
