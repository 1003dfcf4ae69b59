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
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
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

    let env = parse_environment(&or_default("MEDORCH_ENV", "development"))?;
    let bind_addr = parse_addr("MEDORCH_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("MEDORCH_LOG_LEVEL", "info");

    // The scripts historically honoured a bare PYTHON_PATH.
    let python_path = lookup("MEDORCH_PYTHON_PATH")
        .or_else(|_| lookup("PYTHON_PATH"))
        .unwrap_or_else(|_| "python".to_string());

    let scraper_script = PathBuf::from(or_default("MEDORCH_SCRAPER_SCRIPT", "all_scapes.py"));
    let ranking_script = PathBuf::from(or_default(
        "MEDORCH_RANKING_SCRIPT",
        "find_pharmacies.py",
    ));
    let routing_script = PathBuf::from(or_default("MEDORCH_ROUTING_SCRIPT", "delivery_map.py"));

    let workers_per_source = parse_usize("MEDORCH_WORKERS_PER_SOURCE", "3")?;
    if workers_per_source == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "MEDORCH_WORKERS_PER_SOURCE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let worker_timeout_secs = parse_u64("MEDORCH_WORKER_TIMEOUT_SECS", "120")?;
    let default_top_k = parse_u32("MEDORCH_DEFAULT_TOP_K", "5")?;
    if default_top_k == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "MEDORCH_DEFAULT_TOP_K".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let rate_limit_per_minute = parse_u32("MEDORCH_RATE_LIMIT_PER_MINUTE", "120")?;

    let agents_path = PathBuf::from(or_default("MEDORCH_AGENTS_PATH", "./config/agents.yaml"));
    let api_keys = lookup("MEDORCH_API_KEYS")
        .ok()
        .filter(|s| !s.trim().is_empty());

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        python_path,
        scraper_script,
        ranking_script,
        routing_script,
        workers_per_source,
        worker_timeout_secs,
        default_top_k,
        rate_limit_per_minute,
        agents_path,
        api_keys,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MEDORCH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
