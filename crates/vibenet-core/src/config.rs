use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup without `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value: usize = parse_as(var, &or_default(var, default))?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("VIBENET_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_as(
        "VIBENET_BIND_ADDR",
        &or_default("VIBENET_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("VIBENET_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("VIBENET_DATA_DIR", "./data"));

    let reddit_base_url = or_default("VIBENET_REDDIT_BASE_URL", "https://www.reddit.com");
    let user_agent = or_default(
        "VIBENET_USER_AGENT",
        "Mozilla/5.0 (topic-sentiment-project)",
    );
    let request_timeout_secs: u64 = parse_as(
        "VIBENET_REQUEST_TIMEOUT_SECS",
        &or_default("VIBENET_REQUEST_TIMEOUT_SECS", "30"),
    )?;
    let inter_request_delay_ms: u64 = parse_as(
        "VIBENET_INTER_REQUEST_DELAY_MS",
        &or_default("VIBENET_INTER_REQUEST_DELAY_MS", "1000"),
    )?;
    let posts_per_month = positive_usize("VIBENET_POSTS_PER_MONTH", "100")?;
    let final_limit = positive_usize("VIBENET_FINAL_LIMIT", "300")?;

    let model_url = or_default("VIBENET_MODEL_URL", "http://localhost:8080");
    let model_max_tokens = positive_usize("VIBENET_MODEL_MAX_TOKENS", "128")?;
    let confidence_floor: f64 = parse_as(
        "VIBENET_CONFIDENCE_FLOOR",
        &or_default("VIBENET_CONFIDENCE_FLOOR", "0.55"),
    )?;
    if !(0.0..=1.0).contains(&confidence_floor) {
        return Err(ConfigError::InvalidEnvVar {
            var: "VIBENET_CONFIDENCE_FLOOR".to_string(),
            reason: format!("{confidence_floor} is outside [0, 1]"),
        });
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        data_dir,
        reddit_base_url,
        user_agent,
        request_timeout_secs,
        inter_request_delay_ms,
        posts_per_month,
        final_limit,
        model_url,
        model_max_tokens,
        confidence_floor,
    })
}

/// Parse a trimmed env value, mapping failures to [`ConfigError::InvalidEnvVar`].
fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VIBENET_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
