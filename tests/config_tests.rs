//! Configuration layering against real files.

use std::time::Duration;

use switchboard::config::AgentConfig;
use switchboard::storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, API_KEY_KEY};
use tempfile::TempDir;

#[test]
fn full_file_round_trips_through_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let config = AgentConfig::default()
        .with_base_url("http://localhost:8080/v1")
        .with_model("meta-llama/llama-3-70b")
        .with_temperature(0.1)
        .with_max_tokens(256)
        .with_title("Demo")
        .with_request_timeout(Duration::from_secs(5));
    std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

    let loaded = AgentConfig::from_file(&path).unwrap();

    assert_eq!(loaded, config);
    assert_eq!(loaded.request_timeout(), Some(Duration::from_secs(5)));
}

#[test]
fn malformed_file_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "max_tokens = \"many\"").unwrap();

    let err = AgentConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, switchboard::error::SwitchboardError::Configuration(_)));
}

#[test]
fn stored_credential_is_found_in_the_store() {
    let dir = TempDir::new().unwrap();
    let store = FileKeyValueStore::in_dir(dir.path());
    store.set(API_KEY_KEY, "sk-or-v1-from-store").unwrap();

    let resolved = AgentConfig::resolve_credential(&store).unwrap();

    // The environment wins when set; otherwise the stored key is used.
    match std::env::var(switchboard::config::API_KEY_ENV) {
        Ok(env_key) if !env_key.trim().is_empty() => assert_eq!(resolved, Some(env_key)),
        _ => assert_eq!(resolved.as_deref(), Some("sk-or-v1-from-store")),
    }
}

#[test]
fn credential_lookup_without_any_source_is_none() {
    if std::env::var(switchboard::config::API_KEY_ENV).is_ok() {
        return;
    }
    let store = MemoryKeyValueStore::new();
    assert_eq!(AgentConfig::resolve_credential(&store).unwrap(), None);
}
