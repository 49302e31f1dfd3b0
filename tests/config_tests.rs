// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use camera_capture::Config;
use camera_capture::config::{DEFAULT_VIDEO_SOURCE, TEST_AUDIO_SOURCE, TEST_VIDEO_SOURCE};
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.server_url, "http://127.0.0.1:8000");
    assert_eq!(config.video_source, DEFAULT_VIDEO_SOURCE);
    assert!(config.record_audio, "Audio should be recorded by default");
    assert!(config.open_browser);
    assert_eq!(config.request_timeout(), Duration::from_secs(30));
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    // Parent directories are created on save
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.server_url = "https://media.example.org".into();
    config.record_audio = false;
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Config::load_from(&path).is_err());
}

#[test]
fn test_test_sources() {
    let mut config = Config::default();
    config.use_test_sources();
    assert_eq!(config.video_source, TEST_VIDEO_SOURCE);
    assert_eq!(config.audio_source, TEST_AUDIO_SOURCE);
}

#[test]
fn test_resolve_upload_route() {
    let config = Config::default();
    assert_eq!(
        config.resolve("/upload-media").unwrap(),
        "http://127.0.0.1:8000/upload-media"
    );
}
