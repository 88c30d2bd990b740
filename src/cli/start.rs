use crate::auth::is_development_env;
use crate::cli::{actions::Action, commands, dispatch::handler, telemetry};
use anyhow::Result;

/// Start the CLI
/// # Errors
/// Return error if logging can't be initialized or the arguments are invalid
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let development = matches
        .get_one::<String>("frontend-env")
        .is_some_and(|env| is_development_env(env));

    let verbosity_level = telemetry::verbosity_level(
        matches.get_one::<u8>("verbosity").copied().unwrap_or(0),
        development,
    );

    telemetry::init(verbosity_level)?;

    let action = handler(&matches)?;

    Ok(action)
}
