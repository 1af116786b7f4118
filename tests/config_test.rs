//! Tests for config loading

use std::io::Write;

use serial_test::serial;
use tempfile::NamedTempFile;

use impfwatch::config::{Config, DEFAULT_BASE_URL, DEFAULT_REGION};

const ENV_KEYS: [&str; 9] = [
    "IMPFWATCH_BASE_URL",
    "IMPFWATCH_REGION",
    "IMPFWATCH_REQUEST_TIMEOUT",
    "IMPFWATCH_USER_AGENT",
    "IMPFWATCH_MAX_CONCURRENT_FETCHES",
    "IMPFWATCH_FANOUT_DEADLINE",
    "IMPFWATCH_BIND_ADDRESS",
    "IMPFWATCH_LOG_LEVEL",
    "IMPFWATCH_LOG_FORMAT",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_from_file() {
    let file = write_config(
        r#"
[upstream]
base_url = "http://localhost:8080"
region = "ciz-hamburg-hamburg"
request_timeout_secs = 3

[collection]
max_concurrent_fetches = 2
fanout_deadline_secs = 8

[server]
bind_address = "127.0.0.1:9000"

[logging]
level = "debug"
format = "json"
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.upstream.base_url, "http://localhost:8080");
    assert_eq!(config.upstream.region, "ciz-hamburg-hamburg");
    assert_eq!(config.upstream.request_timeout().as_secs(), 3);
    assert_eq!(config.collection.max_concurrent_fetches, 2);
    assert_eq!(config.collection.fanout_deadline().as_secs(), 8);
    assert_eq!(config.server.bind_address.port(), 9000);
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_from_file_partial_uses_defaults() {
    let file = write_config("[upstream]\nregion = \"ciz-koeln-koeln\"\n");

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.upstream.region, "ciz-koeln-koeln");
    assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.collection.max_concurrent_fetches, 16);
}

#[test]
fn test_from_file_missing() {
    let result = Config::from_file(std::path::Path::new("/nonexistent/impfwatch.toml"));
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Failed to read config file"));
}

#[test]
fn test_from_file_malformed() {
    let file = write_config("[upstream\nregion = ");
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_file_round_trips_through_check_config_output() {
    let rendered = toml::to_string_pretty(&Config::default()).unwrap();
    let file = write_config(&rendered);
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.upstream.region, DEFAULT_REGION);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();

    let config = Config::from_env().unwrap();
    assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.upstream.region, DEFAULT_REGION);
    assert_eq!(config.server.bind_address.port(), 2112);
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    std::env::set_var("IMPFWATCH_REGION", "ciz-muenchen-muenchen");
    std::env::set_var("IMPFWATCH_MAX_CONCURRENT_FETCHES", "4");
    std::env::set_var("IMPFWATCH_BIND_ADDRESS", "127.0.0.1:9999");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.upstream.region, "ciz-muenchen-muenchen");
    assert_eq!(config.collection.max_concurrent_fetches, 4);
    assert_eq!(config.server.bind_address.port(), 9999);
}

#[test]
#[serial]
fn test_from_env_unparsable_falls_back() {
    clear_env();
    std::env::set_var("IMPFWATCH_FANOUT_DEADLINE", "soon");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.collection.fanout_deadline_secs, 25);
}
