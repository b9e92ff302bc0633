use std::time::Duration;

use agentbay::config::{Config, ENV_API_KEY, ENV_ENDPOINT, ENV_TIMEOUT_MS};
use serial_test::serial;

fn clear_env() {
    std::env::remove_var(ENV_API_KEY);
    std::env::remove_var(ENV_ENDPOINT);
    std::env::remove_var(ENV_TIMEOUT_MS);
}

#[test]
fn rejects_empty_api_key() {
    let result = Config::new("", "example.com", Duration::from_secs(60));
    assert!(result.is_err());
}

#[test]
fn rejects_malformed_endpoint() {
    let result = Config::new("key", "host with spaces", Duration::from_secs(60));
    let err = result.err().expect("error");
    assert!(err.to_string().contains("malformed endpoint"));
}

#[test]
fn base_url_adds_https_scheme() {
    let config = Config::new("key", "sandbox.example.com:8443", Duration::from_secs(60))
        .expect("config");
    assert_eq!(config.base_url(), "https://sandbox.example.com:8443");
}

#[test]
fn base_url_keeps_explicit_scheme() {
    let config =
        Config::new("key", "http://127.0.0.1:9000/", Duration::from_secs(60)).expect("config");
    assert_eq!(config.base_url(), "http://127.0.0.1:9000");
}

#[test]
#[serial]
fn load_requires_some_credential() {
    clear_env();
    let result = Config::load(None);
    let err = result.err().expect("error");
    assert!(err.to_string().contains(ENV_API_KEY));
}

#[test]
#[serial]
fn load_prefers_explicit_key_over_env() {
    clear_env();
    std::env::set_var(ENV_API_KEY, "from-env");
    let config = Config::load(Some("explicit")).expect("config");
    assert_eq!(config.api_key, "explicit");
    clear_env();
}

#[test]
#[serial]
fn load_reads_endpoint_and_timeout_from_env() {
    clear_env();
    std::env::set_var(ENV_API_KEY, "key");
    std::env::set_var(ENV_ENDPOINT, "alt.example.com");
    std::env::set_var(ENV_TIMEOUT_MS, "1500");
    let config = Config::load(None).expect("config");
    assert_eq!(config.endpoint, "alt.example.com");
    assert_eq!(config.timeout, Duration::from_millis(1500));
    clear_env();
}

#[test]
#[serial]
fn load_rejects_unparseable_timeout() {
    clear_env();
    std::env::set_var(ENV_API_KEY, "key");
    std::env::set_var(ENV_TIMEOUT_MS, "soon");
    let err = Config::load(None).err().expect("error");
    assert!(err.to_string().contains(ENV_TIMEOUT_MS));
    clear_env();
}

#[test]
#[serial]
fn env_file_fills_missing_vars_without_overriding() {
    clear_env();
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        temp.path().join(".env"),
        format!("{ENV_API_KEY}=dotenv-key\n{ENV_ENDPOINT}=dotenv.example.com\n"),
    )
    .expect("write .env");
    std::env::set_var(ENV_ENDPOINT, "already-set.example.com");

    let original = std::env::current_dir().expect("cwd");
    std::env::set_current_dir(temp.path()).expect("chdir");
    let config = Config::load(None);
    std::env::set_current_dir(original).expect("chdir back");

    let config = config.expect("config");
    assert_eq!(config.api_key, "dotenv-key");
    assert_eq!(
        config.endpoint, "already-set.example.com",
        "set env vars win over .env"
    );
    clear_env();
}
