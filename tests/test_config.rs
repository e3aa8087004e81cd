//! Configuration loader and path resolver unit tests

use stationd::config::{general_settings, ConfigLoader, PathResolver};

#[tokio::test]
async fn test_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let loader = ConfigLoader::new(dir.path().join("missing.json"));
    assert!(loader.load().await.is_err());
}

#[tokio::test]
async fn test_top_level_must_be_an_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();
    assert!(ConfigLoader::new(&path).load().await.is_err());

    std::fs::write(&path, "{not json").unwrap();
    assert!(ConfigLoader::new(&path).load().await.is_err());
}

#[tokio::test]
async fn test_general_settings_defaults_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    std::fs::write(&path, "{}").unwrap();
    let config = ConfigLoader::new(&path).load().await.unwrap();
    let settings = general_settings(&config).unwrap();
    assert!(!settings.auto_reconnect);
    assert_eq!(settings.scanner.baudrate, 9600);
    assert_eq!(settings.scanner.port, None);

    std::fs::write(
        &path,
        r#"{
            "logLevel": "debug",
            "autoReconnect": true,
            "scanner": {"port": "/dev/ttyUSB0", "baudrate": 115200}
        }"#,
    )
    .unwrap();
    let config = ConfigLoader::new(&path).load().await.unwrap();
    let settings = general_settings(&config).unwrap();
    assert!(settings.auto_reconnect);
    assert_eq!(settings.scanner.port.as_deref(), Some("/dev/ttyUSB0"));
    assert_eq!(settings.scanner.baudrate, 115200);
    assert_eq!(settings.log_level.to_filter_string(), "debug");
}

#[tokio::test]
async fn test_path_resolver_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let config = serde_json::json!({
        "paths": {"captures": "captures", "results": "out/results"}
    });
    let config = config.as_object().unwrap();

    let resolver = PathResolver::from_config(config, Some(dir.path())).await.unwrap();
    let captures = resolver.get("captures").unwrap();
    assert_eq!(captures.path(), dir.path().join("captures"));
    assert!(captures.path().is_dir());
    assert!(dir.path().join("out/results").is_dir());
    assert!(resolver.get("nope").is_none());
}

#[tokio::test]
async fn test_paths_section_must_be_an_object_of_strings() {
    let config = serde_json::json!({"paths": ["captures"]});
    let config = config.as_object().unwrap();
    assert!(PathResolver::from_config(config, None).await.is_err());
}

#[tokio::test]
async fn test_missing_paths_section_yields_empty_resolver() {
    let dir = tempfile::tempdir().unwrap();
    let config = serde_json::Map::new();
    let resolver = PathResolver::from_config(&config, None).await.unwrap();
    assert!(resolver.as_map().is_empty());

    // get_or falls back to a default directory, created on demand.
    let fallback = resolver
        .get_or("captures", dir.path().join("captures"))
        .await
        .unwrap();
    assert!(fallback.path().is_dir());
}
