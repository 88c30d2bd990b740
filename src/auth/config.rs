use secrecy::SecretString;
use std::{env, time::Duration};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_SESSION_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
const DEVELOPMENT_ENVIRONMENTS: [&str; 3] = ["development", "local", "dev"];

#[derive(Clone, Debug)]
pub struct AuthConfig {
    backend_url: String,
    secret: SecretString,
    frontend_env: String,
    local_auth: bool,
    quick_start: bool,
    session_max_age_seconds: i64,
    request_timeout: Duration,
}

impl AuthConfig {
    #[must_use]
    pub fn new(backend_url: String, secret: SecretString) -> Self {
        Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            secret,
            frontend_env: "production".to_string(),
            local_auth: false,
            quick_start: false,
            session_max_age_seconds: DEFAULT_SESSION_MAX_AGE_SECONDS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_frontend_env(mut self, frontend_env: String) -> Self {
        self.frontend_env = frontend_env;
        self
    }

    #[must_use]
    pub fn with_local_auth(mut self, enabled: bool) -> Self {
        self.local_auth = enabled;
        self
    }

    #[must_use]
    pub fn with_quick_start(mut self, enabled: bool) -> Self {
        self.quick_start = enabled;
        self
    }

    #[must_use]
    pub fn with_session_max_age_seconds(mut self, seconds: i64) -> Self {
        self.session_max_age_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    #[must_use]
    pub fn frontend_env(&self) -> &str {
        &self.frontend_env
    }

    #[must_use]
    pub fn quick_start(&self) -> bool {
        self.quick_start
    }

    #[must_use]
    pub fn session_max_age_seconds(&self) -> i64 {
        self.session_max_age_seconds
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        is_development_env(&self.frontend_env)
    }

    /// Cookies go out without `Secure` only in development environments.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        !self.is_development()
    }

    /// Local auth runs without a real identity provider, so there is nothing
    /// to sign out of.
    #[must_use]
    pub fn sign_out_enabled(&self) -> bool {
        !self.local_auth
    }
}

/// `development`, `dev` and `local` (any case) count as development.
#[must_use]
pub fn is_development_env(frontend_env: &str) -> bool {
    DEVELOPMENT_ENVIRONMENTS
        .iter()
        .any(|name| frontend_env.trim().eq_ignore_ascii_case(name))
}

/// Resolve the backend base URL: explicit value, then
/// `NEXT_PUBLIC_API_BASE_URL`, then the local default.
#[must_use]
pub fn resolve_backend_url(explicit: Option<&str>) -> String {
    explicit
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .or_else(|| {
            env::var("NEXT_PUBLIC_API_BASE_URL")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(
            "https://api.example.dev/".to_string(),
            SecretString::from("secret".to_string()),
        )
    }

    #[test]
    fn new_trims_trailing_slash_and_uses_defaults() {
        let config = config();
        assert_eq!(config.backend_url(), "https://api.example.dev");
        assert_eq!(config.session_max_age_seconds(), 604_800);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.session_cookie_secure());
        assert!(config.sign_out_enabled());
        assert!(!config.quick_start());
    }

    #[test]
    fn development_disables_secure_cookies() {
        for env in ["development", "LOCAL", "dev"] {
            let config = config().with_frontend_env(env.to_string());
            assert!(config.is_development(), "{env}");
            assert!(!config.session_cookie_secure(), "{env}");
        }
        let config = config().with_frontend_env("staging".to_string());
        assert!(config.session_cookie_secure());
    }

    #[test]
    fn local_auth_suppresses_sign_out() {
        assert!(!config().with_local_auth(true).sign_out_enabled());
    }

    #[test]
    fn resolve_backend_url_prefers_explicit_value() {
        temp_env::with_vars(
            [("NEXT_PUBLIC_API_BASE_URL", Some("https://public.example.dev"))],
            || {
                assert_eq!(
                    resolve_backend_url(Some("https://backend.internal/")),
                    "https://backend.internal"
                );
                assert_eq!(resolve_backend_url(Some("  ")), "https://public.example.dev");
                assert_eq!(resolve_backend_url(None), "https://public.example.dev");
            },
        );
    }

    #[test]
    fn resolve_backend_url_falls_back_to_default() {
        temp_env::with_vars([("NEXT_PUBLIC_API_BASE_URL", None::<String>)], || {
            assert_eq!(resolve_backend_url(None), DEFAULT_BACKEND_URL);
        });
    }
}
