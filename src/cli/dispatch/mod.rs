use crate::auth::{resolve_backend_url, AuthConfig};
use crate::cli::actions::Action;
use anyhow::{anyhow, Result};
use secrecy::SecretString;
use std::time::Duration;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let secret = matches
        .get_one::<String>("secret")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| SecretString::from(s.to_string()))
        .ok_or_else(|| anyhow!("missing required argument: --secret"))?;

    let backend_url = resolve_backend_url(
        matches
            .get_one::<String>("backend-url")
            .map(String::as_str),
    );

    let mut config = AuthConfig::new(backend_url, secret)
        .with_local_auth(matches.get_flag("local-auth"))
        .with_quick_start(matches.get_flag("quick-start"));

    if let Some(frontend_env) = matches.get_one::<String>("frontend-env") {
        config = config.with_frontend_env(frontend_env.clone());
    }

    if let Some(max_age) = matches.get_one::<i64>("session-max-age") {
        config = config.with_session_max_age_seconds(*max_age);
    }

    if let Some(timeout) = matches.get_one::<u64>("request-timeout") {
        config = config.with_request_timeout(Duration::from_secs(*timeout));
    }

    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(3000),
        config,
    })
}
