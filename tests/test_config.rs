use std::time::Duration;

use pageserve::config::{Config, ConfigError, SERVER_NAME};

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.server.server_name, SERVER_NAME);
    assert_eq!(cfg.session.ttl(), Duration::from_millis(600_000));
    assert_eq!(cfg.session.sweep_interval(), Duration::from_millis(300_000));
}

#[test]
fn test_config_from_yaml() {
    let yaml = r#"
server:
  listen_addr: "0.0.0.0:3000"
  server_name: "Test Server"
session:
  ttl_ms: 1000
  sweep_interval_ms: 100
"#;
    let cfg = Config::from_yaml(yaml).unwrap();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.server.server_name, "Test Server");
    assert_eq!(cfg.session.ttl(), Duration::from_secs(1));
    assert_eq!(cfg.session.sweep_interval(), Duration::from_millis(100));
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let cfg = Config::from_yaml("session:\n  ttl_ms: 2000\n").unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.session.sweep_interval(), Duration::from_millis(1000));
}

#[test]
fn test_config_rejects_zero_ttl() {
    let result = Config::from_yaml("session:\n  ttl_ms: 0\n");
    assert!(matches!(result, Err(ConfigError::Zero("session.ttl_ms"))));

    let result = Config::from_yaml("session:\n  sweep_interval_ms: 0\n");
    assert!(matches!(
        result,
        Err(ConfigError::Zero("session.sweep_interval_ms"))
    ));
}

#[test]
fn test_config_rejects_bad_yaml() {
    let result = Config::from_yaml("session: [not, a, map]");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_config_missing_file() {
    let result = Config::from_file("/definitely/not/here.yaml");
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_config_load_from_env() {
    // Single test touching the environment to avoid races between tests
    let path = std::env::temp_dir().join(format!("pageserve-{}.yaml", std::process::id()));
    std::fs::write(&path, "server:\n  server_name: from-file\n").unwrap();

    unsafe {
        std::env::set_var("PAGESERVE_CONFIG", &path);
        std::env::set_var("LISTEN", "0.0.0.0:5000");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.server_name, "from-file");
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:5000");

    unsafe {
        std::env::remove_var("PAGESERVE_CONFIG");
        std::env::remove_var("LISTEN");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.server_name, SERVER_NAME);
    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");

    std::fs::remove_file(&path).unwrap();
}
