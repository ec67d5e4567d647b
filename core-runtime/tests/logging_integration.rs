//! Global subscriber installation. One subscriber per process, so the
//! install-once checks live in a single test.

use bridge_traits::log::LogLevel;
use core_runtime::logging::{init_logging, redact_url, LogFormat, LoggingConfig};

#[test]
fn test_logging_initializes_once() {
    let bad = LoggingConfig::default().with_filter("core_playback=notalevel");
    assert!(init_logging(bad).is_err());

    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);
    init_logging(config.clone()).expect("first init succeeds");

    let second = init_logging(config);
    assert!(second
        .unwrap_err()
        .to_string()
        .contains("Failed to initialize logging"));

    tracing::info!(url = %redact_url("https://youtu.be/abc?t=1"), "logging initialized");
}

#[test]
fn test_signed_stream_urls_lose_their_signature() {
    assert_eq!(
        redact_url("https://media.example/ep1.m4a?X-Amz-Signature=deadbeef"),
        "https://media.example/ep1.m4a"
    );
    assert_eq!(
        redact_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
        "https://www.youtube.com/watch"
    );
    assert_eq!(redact_url(""), "");
}
