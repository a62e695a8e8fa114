use medaka_core::{MedakaConfig, MedakaError};
use serial_test::serial;
use std::path::PathBuf;

const KEYS: &[&str] = &[
    "HOST",
    "PORT",
    "STATIC_DIR",
    "INDEX_PATH",
    "MAX_CONCURRENT_REQUESTS",
    "GEMINI_API_KEY",
    "GEMINI_MODEL",
    "GEMINI_BASE_URL",
    "GEMINI_TIMEOUT_MS",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "TTS_MODEL",
    "TTS_VOICE",
    "TTS_SPEED",
    "TTS_TIMEOUT_MS",
    "TTS_TEMP_DIR",
];

fn clear_env() {
    for k in KEYS {
        std::env::remove_var(k);
    }
}

#[test]
#[serial]
fn config_loads_from_defaults() {
    clear_env();

    let cfg = MedakaConfig::default();
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 8000);
    assert_eq!(cfg.server.addr(), "0.0.0.0:8000");
    assert_eq!(cfg.server.static_dir, PathBuf::from("static"));
    assert_eq!(cfg.server.index_path, PathBuf::from("index.html"));
    assert_eq!(cfg.server.max_concurrent_requests, None);
    assert_eq!(cfg.llm.model, "gemini-2.0-flash-exp");
    assert_eq!(cfg.llm.api_key, None);
    assert_eq!(cfg.llm.request_timeout_ms, 30_000);
    assert_eq!(cfg.tts.api_key, None);
    assert_eq!(cfg.tts.model, "tts-1");
    assert_eq!(cfg.tts.voice, "nova");
    assert_eq!(cfg.tts.speed, 0.9);
    assert_eq!(cfg.tts.temp_dir, std::env::temp_dir());
}

#[test]
#[serial]
fn config_loads_from_env() {
    clear_env();
    std::env::set_var("PORT", "9100");
    std::env::set_var("GEMINI_API_KEY", "g-key");
    std::env::set_var("OPENAI_API_KEY", "o-key");
    std::env::set_var("TTS_VOICE", "shimmer");
    std::env::set_var("MAX_CONCURRENT_REQUESTS", "4");

    let cfg = MedakaConfig::default();
    assert_eq!(cfg.server.port, 9100);
    assert_eq!(cfg.llm.api_key.as_deref(), Some("g-key"));
    assert_eq!(cfg.tts.api_key.as_deref(), Some("o-key"));
    assert_eq!(cfg.tts.voice, "shimmer");
    assert_eq!(cfg.server.max_concurrent_requests, Some(4));

    clear_env();
}

#[test]
#[serial]
fn empty_credentials_count_as_missing() {
    clear_env();
    std::env::set_var("GEMINI_API_KEY", "");
    std::env::set_var("MAX_CONCURRENT_REQUESTS", "0");

    let cfg = MedakaConfig::default();
    assert_eq!(cfg.llm.api_key, None);
    assert_eq!(cfg.server.max_concurrent_requests, None);

    clear_env();
}

#[test]
#[serial]
fn toml_overlay_wins_over_env() {
    clear_env();
    std::env::set_var("PORT", "9100");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("medaka.toml");
    std::fs::write(
        &path,
        r#"
[server]
port = 8123
max_concurrent_requests = 2

[llm]
model = "gemini-1.5-flash"

[tts]
speed = 1.1
voice = "alloy"
"#,
    )
    .unwrap();

    let cfg = MedakaConfig::load_from(&path);
    assert_eq!(cfg.server.port, 8123);
    assert_eq!(cfg.server.max_concurrent_requests, Some(2));
    assert_eq!(cfg.llm.model, "gemini-1.5-flash");
    assert_eq!(cfg.tts.voice, "alloy");
    assert_eq!(cfg.tts.speed, 1.1);
    // untouched keys keep their defaults
    assert_eq!(cfg.tts.model, "tts-1");

    clear_env();
}

#[test]
#[serial]
fn missing_or_broken_toml_falls_back_to_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();

    let cfg = MedakaConfig::load_from(&dir.path().join("nope.toml"));
    assert_eq!(cfg.server.port, 8000);

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "[server\nport = ").unwrap();
    let cfg = MedakaConfig::load_from(&broken);
    assert_eq!(cfg.server.port, 8000);
}

#[test]
fn overlay_reports_parse_errors() {
    let err = MedakaConfig::overlay_toml("port = [", MedakaConfig::default()).unwrap_err();
    assert!(matches!(err, MedakaError::ConfigError(_)));
}
