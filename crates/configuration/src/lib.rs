use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{Config, DatabaseSettings, LoggingSettings, ServerSettings, StatsCacheSettings};

/// Prefix of environment variables that override file settings,
/// e.g. `TRADELOG__STATS_CACHE__FRESHNESS_WINDOW=2m`.
pub const ENV_PREFIX: &str = "TRADELOG";

/// Loads the application configuration.
///
/// Sources are layered: built-in defaults, then the TOML file (`config.toml` in the
/// working directory when no path is given, optional in that case), then environment
/// variables. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_layers(path, None)
}

/// `env` replaces the process environment when given.
fn load_layers(
    path: Option<&Path>,
    env: Option<config::Map<String, String>>,
) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config.toml").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("stats_cache.periods")
                .source(env),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;

    validate(config)
}

/// Checks cross-field constraints the type system can't express.
fn validate(mut config: Config) -> Result<Config, ConfigError> {
    if config.stats_cache.periods.is_empty() {
        return Err(ConfigError::ValidationError(
            "stats_cache.periods must name at least one period".to_string(),
        ));
    }

    let mut seen = Vec::with_capacity(config.stats_cache.periods.len());
    config.stats_cache.periods.retain(|period| {
        if seen.contains(period) {
            false
        } else {
            seen.push(*period);
            true
        }
    });

    if config.database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{EquityCurveScope, Period};
    use std::io::Write;
    use std::time::Duration;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("tradelog-config-")
            .suffix(".toml")
            .tempfile()
            .expect("create temp config");
        file.write_all(contents.as_bytes()).expect("write temp config");
        file
    }

    #[test]
    fn defaults_apply_when_sections_are_missing() {
        let file = write_config("");
        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.stats_cache.freshness_window, Duration::from_secs(300));
        assert_eq!(config.stats_cache.periods, Period::ALL.to_vec());
        assert_eq!(config.stats_cache.equity_curve_scope, EquityCurveScope::FullHistory);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.server.addr.port(), 8080);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn stats_cache_section_is_parsed() {
        let file = write_config(
            r#"
[stats_cache]
freshness_window = "90s"
periods = ["today", "ALL_TIME", "today"]
equity_curve_scope = "period"

[server]
addr = "0.0.0.0:9000"
"#,
        );
        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.stats_cache.freshness_window, Duration::from_secs(90));
        assert_eq!(config.stats_cache.periods, vec![Period::Today, Period::AllTime]);
        assert_eq!(config.stats_cache.equity_curve_scope, EquityCurveScope::Period);
        assert!(!config.stats_cache.is_enabled(Period::Week));
        assert_eq!(config.server.addr.port(), 9000);
    }

    #[test]
    fn empty_period_set_is_rejected() {
        let file = write_config("[stats_cache]\nperiods = []\n");
        let result = load_config(Some(file.path()));

        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn unknown_period_is_a_load_error() {
        let file = write_config("[stats_cache]\nperiods = [\"QUARTER\"]\n");
        let result = load_config(Some(file.path()));

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/tradelog.toml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn environment_overrides_the_file() {
        let file = write_config(
            r#"
[stats_cache]
freshness_window = "90s"
periods = ["MONTH"]

[database]
max_connections = 4
"#,
        );
        let env = config::Map::from([
            (
                "TRADELOG__STATS_CACHE__PERIODS".to_string(),
                "TODAY,WEEK".to_string(),
            ),
            (
                "TRADELOG__STATS_CACHE__FRESHNESS_WINDOW".to_string(),
                "2m".to_string(),
            ),
            ("UNRELATED__STATS_CACHE__PERIODS".to_string(), "MONTH".to_string()),
        ]);

        let config = load_layers(Some(file.path()), Some(env)).unwrap();

        assert_eq!(config.stats_cache.periods, vec![Period::Today, Period::Week]);
        assert_eq!(config.stats_cache.freshness_window, Duration::from_secs(120));
        assert_eq!(config.database.max_connections, 4);
    }
}
