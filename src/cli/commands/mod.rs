use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        FalseyValueParser, ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("sessiongate")
        .about("Session gateway for the testing platform frontend")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("3000")
                .env("SESSIONGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("backend-url")
                .long("backend-url")
                .help("Backend base URL, falls back to NEXT_PUBLIC_API_BASE_URL, example: http://backend:8080")
                .env("BACKEND_URL"),
        )
        .arg(
            Arg::new("secret")
                .long("secret")
                .help("Secret used to derive session keys")
                .env("NEXTAUTH_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("frontend-env")
                .long("frontend-env")
                .help("Deployment environment, `development` disables secure cookies")
                .default_value("production")
                .env("FRONTEND_ENV"),
        )
        .arg(
            Arg::new("local-auth")
                .long("local-auth")
                .help("Local authentication mode, disables sign-out")
                .env("NEXT_PUBLIC_LOCAL_AUTH_ENABLED")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
        .arg(
            Arg::new("quick-start")
                .long("quick-start")
                .help("Quick start mode, hides organization entries from navigation")
                .env("QUICK_START_MODE")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
        .arg(
            Arg::new("session-max-age")
                .long("session-max-age")
                .help("Session lifetime in seconds")
                .default_value("604800")
                .env("SESSION_MAX_AGE")
                .value_parser(clap::value_parser!(i64).range(60..)),
        )
        .arg(
            Arg::new("request-timeout")
                .long("request-timeout")
                .help("Backend request timeout in seconds")
                .default_value("10")
                .env("SESSIONGATE_REQUEST_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("SESSIONGATE_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
