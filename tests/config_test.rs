//! Tests for configuration loading.

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use strictly_arena::ArenaConfig;
use tempfile::NamedTempFile;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = ArenaConfig::default();
    assert_eq!(config.bind_host(), "0.0.0.0");
    assert_eq!(*config.game_port(), 8080);
    assert_eq!(*config.match_port(), 8081);
    assert_eq!(config.game_host_url(), "ws://127.0.0.1:8080/ws");
    assert_eq!(*config.match_log_url(), None);
    assert_eq!(config.cleanup_interval(), Duration::from_secs(300));
    assert_eq!(config.link_backoff(), Duration::from_secs(3));
    assert_eq!(*config.matchmaking().base_tolerance(), 50);
    assert_eq!(*config.matchmaking().default_max_diff(), 300);
    assert_eq!(config.matchmaking().sweep_interval(), Duration::from_secs(1));
}

#[test]
fn test_load_partial_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
game_port = 9000
match_log_url = "http://logs.local/matches"

[matchmaking]
tolerance_step = 40
"#
    )
    .unwrap();

    let config = ArenaConfig::from_file(file.path()).unwrap();
    assert_eq!(*config.game_port(), 9000);
    assert_eq!(*config.match_port(), 8081);
    assert_eq!(
        config.match_log_url().as_deref(),
        Some("http://logs.local/matches")
    );
    assert_eq!(*config.matchmaking().tolerance_step(), 40);
    assert_eq!(*config.matchmaking().base_tolerance(), 50);
}

#[test]
fn test_missing_and_malformed_files() {
    assert!(ArenaConfig::from_file("/nonexistent/arena.toml").is_err());

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "game_port = \"not a number\"").unwrap();
    let err = ArenaConfig::from_file(file.path()).unwrap_err();
    assert!(err.message.contains("Failed to parse config"));
}

#[test]
fn test_environment_overrides() {
    let config = ArenaConfig::default()
        .apply_env_from(env(&[
            ("PORT_GAME", "7000"),
            ("PORT_MATCH", " 7001 "),
            ("GAME_HOST_URL", "ws://host:7000/ws"),
            ("MATCH_LOG_URL", ""),
        ]))
        .unwrap();

    assert_eq!(*config.game_port(), 7000);
    assert_eq!(*config.match_port(), 7001);
    assert_eq!(config.game_host_url(), "ws://host:7000/ws");
    assert_eq!(*config.match_log_url(), None);
}

#[test]
fn test_bad_port_rejected() {
    let err = ArenaConfig::default()
        .apply_env_from(env(&[("PORT_MATCH", "eighty")]))
        .unwrap_err();
    assert!(err.message.contains("PORT_MATCH"));
}

#[test]
fn test_setters_override() {
    let config = ArenaConfig::default()
        .with_game_port(1234)
        .with_match_log_url("http://logs".to_string());
    assert_eq!(*config.game_port(), 1234);
    assert_eq!(config.match_log_url().as_deref(), Some("http://logs"));
}
