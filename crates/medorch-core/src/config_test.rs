use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "MEDORCH_ENV"));
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.python_path, "python");
    assert_eq!(cfg.scraper_script.to_str(), Some("all_scapes.py"));
    assert_eq!(cfg.ranking_script.to_str(), Some("find_pharmacies.py"));
    assert_eq!(cfg.routing_script.to_str(), Some("delivery_map.py"));
    assert_eq!(cfg.workers_per_source, 3);
    assert_eq!(cfg.worker_timeout_secs, 120);
    assert_eq!(cfg.default_top_k, 5);
    assert_eq!(cfg.rate_limit_per_minute, 120);
    assert_eq!(cfg.agents_path.to_str(), Some("./config/agents.yaml"));
    assert!(cfg.api_keys.is_none());
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("MEDORCH_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MEDORCH_BIND_ADDR"),
        "expected InvalidEnvVar(MEDORCH_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn python_path_prefers_namespaced_var() {
    let mut map = HashMap::new();
    map.insert("PYTHON_PATH", "/usr/bin/python3");
    map.insert("MEDORCH_PYTHON_PATH", "/opt/venv/bin/python");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.python_path, "/opt/venv/bin/python");
}

#[test]
fn python_path_falls_back_to_legacy_var() {
    let mut map = HashMap::new();
    map.insert("PYTHON_PATH", "/usr/bin/python3");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.python_path, "/usr/bin/python3");
}

#[test]
fn workers_per_source_override() {
    let mut map = HashMap::new();
    map.insert("MEDORCH_WORKERS_PER_SOURCE", "6");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.workers_per_source, 6);
}

#[test]
fn workers_per_source_zero_is_rejected() {
    let mut map = HashMap::new();
    map.insert("MEDORCH_WORKERS_PER_SOURCE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MEDORCH_WORKERS_PER_SOURCE"),
        "expected InvalidEnvVar(MEDORCH_WORKERS_PER_SOURCE), got: {result:?}"
    );
}

#[test]
fn workers_per_source_negative_is_rejected() {
    let mut map = HashMap::new();
    map.insert("MEDORCH_WORKERS_PER_SOURCE", "-2");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

#[test]
fn worker_timeout_secs_override_and_disable() {
    let mut map = HashMap::new();
    map.insert("MEDORCH_WORKER_TIMEOUT_SECS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.worker_timeout_secs, 0);
}

#[test]
fn worker_timeout_secs_invalid() {
    let mut map = HashMap::new();
    map.insert("MEDORCH_WORKER_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MEDORCH_WORKER_TIMEOUT_SECS"),
        "expected InvalidEnvVar(MEDORCH_WORKER_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn default_top_k_invalid() {
    let mut map = HashMap::new();
    map.insert("MEDORCH_DEFAULT_TOP_K", "five");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MEDORCH_DEFAULT_TOP_K"),
        "expected InvalidEnvVar(MEDORCH_DEFAULT_TOP_K), got: {result:?}"
    );
}

#[test]
fn blank_api_keys_are_treated_as_unset() {
    let mut map = HashMap::new();
    map.insert("MEDORCH_API_KEYS", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.api_keys.is_none());
}

#[test]
fn debug_output_redacts_api_keys() {
    let mut map = HashMap::new();
    map.insert("MEDORCH_API_KEYS", "secret-token");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("secret-token"));
    assert!(debug.contains("[redacted]"));
}

#[test]
fn default_top_k_zero_is_rejected() {
    let mut map = HashMap::new();
    map.insert("MEDORCH_DEFAULT_TOP_K", "0");
    assert!(build_app_config(lookup_from_map(&map)).is_err());
}

#[test]
fn rate_limit_can_be_disabled() {
    let mut map = HashMap::new();
    map.insert("MEDORCH_RATE_LIMIT_PER_MINUTE", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.rate_limit_per_minute, 0);
}
