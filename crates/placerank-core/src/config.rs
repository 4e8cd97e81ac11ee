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
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("PLACERANK_ENV", "development"))?;
    let log_level = or_default("PLACERANK_LOG_LEVEL", "info");

    let chart_window_days = parse_u32("PLACERANK_CHART_WINDOW_DAYS", "30")?;
    if chart_window_days == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PLACERANK_CHART_WINDOW_DAYS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let api_base_url = optional("PLACERANK_API_BASE_URL");
    if let Some(url) = &api_base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidEnvVar {
                var: "PLACERANK_API_BASE_URL".to_string(),
                reason: format!("'{url}' must start with http:// or https://"),
            });
        }
    }
    let api_token = optional("PLACERANK_API_TOKEN");

    let http_timeout_secs = parse_u64("PLACERANK_HTTP_TIMEOUT_SECS", "30")?;
    let friend_poll_interval_ms = parse_u64("PLACERANK_FRIEND_POLL_INTERVAL_MS", "500")?;
    let friend_confirm_timeout_secs = parse_u64("PLACERANK_FRIEND_CONFIRM_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("PLACERANK_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("PLACERANK_RETRY_BACKOFF_BASE_MS", "1000")?;
    let retry_max_delay_ms = parse_u64("PLACERANK_RETRY_MAX_DELAY_MS", "30000")?;
    let name_max_chars = parse_usize("PLACERANK_NAME_MAX_CHARS", "10")?;

    Ok(AppConfig {
        env,
        log_level,
        chart_window_days,
        api_base_url,
        api_token,
        http_timeout_secs,
        friend_poll_interval_ms,
        friend_confirm_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        retry_max_delay_ms,
        name_max_chars,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PLACERANK_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
