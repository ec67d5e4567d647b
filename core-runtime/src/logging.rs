//! # Logging
//!
//! `tracing-subscriber` setup for the player core, plus the privacy helpers
//! every crate uses when a source URL or an imported file name ends up in a
//! log field.
//!
//! Workspace crates log at the configured level; `reqwest`, `hyper` and
//! `sqlx` are held at `warn` so a cache install does not flood the output.
//! A host [`LoggerSink`] sees the same events, with `url` fields redacted
//! and `file`/`path` fields reduced to a basename.
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! init_logging(LoggingConfig::default().with_format(LogFormat::Compact))?;
//! tracing::info!(url = %redact_url(raw), "Added source");
//! ```

use std::sync::Arc;

use bridge_traits::log::{LogLevel, LoggerSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl Default for LogFormat {
    /// Pretty in debug builds, JSON in release builds.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level for the workspace crates.
    pub level: LogLevel,
    /// Full `EnvFilter` directive string, replacing the defaults.
    pub filter: Option<String>,
    pub sink: Option<Arc<dyn LoggerSink>>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            sink: None,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.sink = Some(sink);
        self
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::init_logging;

/// The host console is the only output on `wasm32`; nothing is installed.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(_config: LoggingConfig) -> crate::error::Result<()> {
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::collections::BTreeMap;
    use std::fmt;
    use std::io;
    use std::sync::Arc;

    use bridge_traits::log::{LogEntry, LogLevel, LoggerSink};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::{
        filter::EnvFilter,
        layer::{Context, SubscriberExt},
        registry::LookupSpan,
        util::SubscriberInitExt,
        Layer,
    };

    use super::{redact_url, strip_path, LogFormat, LoggingConfig};
    use crate::error::{Error, Result};

    const WORKSPACE_TARGETS: &[&str] = &[
        "onetap_workspace",
        "core_runtime",
        "core_library",
        "core_playback",
        "core_offline",
        "core_service",
        "bridge_desktop",
    ];

    const QUIET_DEPENDENCIES: &[&str] = &["h2", "hyper", "reqwest", "sqlx"];

    /// Install the global subscriber.
    ///
    /// # Errors
    ///
    /// `Config` for an unparseable filter or when a subscriber is already
    /// installed in this process.
    pub fn init_logging(config: LoggingConfig) -> Result<()> {
        let filter = build_filter(&config)?;

        let output = match config.format {
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(io::stdout)
                .boxed(),
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_writer(io::stdout)
                .boxed(),
            LogFormat::Compact => tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stdout)
                .boxed(),
        };

        tracing_subscriber::registry()
            .with(output)
            .with(filter)
            .with(config.sink.map(SinkLayer))
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
    }

    pub(super) fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
        let directives = match &config.filter {
            Some(custom) => custom.clone(),
            None => {
                let level = config.level.as_str();
                WORKSPACE_TARGETS
                    .iter()
                    .map(|target| format!("{target}={level}"))
                    .chain(QUIET_DEPENDENCIES.iter().map(|dep| format!("{dep}=warn")))
                    .collect::<Vec<_>>()
                    .join(",")
            }
        };

        EnvFilter::try_new(directives)
            .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
    }

    /// Mirrors events into the host's [`LoggerSink`].
    pub(super) struct SinkLayer(pub(super) Arc<dyn LoggerSink>);

    impl<S> Layer<S> for SinkLayer
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
            let metadata = event.metadata();
            let level = level_of(*metadata.level());
            if level < self.0.min_level() {
                return;
            }

            let mut fields = Fields::default();
            event.record(&mut fields);

            let mut entry = LogEntry::new(
                level,
                metadata.target(),
                fields.message.unwrap_or_else(|| metadata.name().to_string()),
            );
            entry.fields = fields.values;
            entry.span = ctx.lookup_current().map(|span| span.name().to_string());

            let sink = Arc::clone(&self.0);
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = sink.log(entry).await {
                            eprintln!("log sink: {}", e);
                        }
                    });
                }
                Err(_) => {
                    if let Err(e) = futures::executor::block_on(sink.log(entry)) {
                        eprintln!("log sink: {}", e);
                    }
                }
            }
        }
    }

    #[derive(Default)]
    struct Fields {
        message: Option<String>,
        values: BTreeMap<String, String>,
    }

    impl Fields {
        fn insert(&mut self, field: &Field, value: String) {
            let name = field.name();
            if name == "message" {
                self.message = Some(value);
                return;
            }
            let value = if name == "url" || name.ends_with("_url") {
                redact_url(&value).to_string()
            } else if name == "file" || name == "path" {
                strip_path(&value).to_string()
            } else {
                value
            };
            self.values.insert(name.to_string(), value);
        }
    }

    impl Visit for Fields {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.insert(field, value.to_string());
        }

        fn record_i64(&mut self, field: &Field, value: i64) {
            self.insert(field, value.to_string());
        }

        fn record_u64(&mut self, field: &Field, value: u64) {
            self.insert(field, value.to_string());
        }

        fn record_bool(&mut self, field: &Field, value: bool) {
            self.insert(field, value.to_string());
        }

        fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
            self.insert(field, value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.insert(field, format!("{:?}", value));
        }
    }

    fn level_of(level: tracing::Level) -> LogLevel {
        match level {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

/// Drop the query string and fragment of a source URL.
///
/// Signed CDN links and `?v=` video ids stay out of the logs.
pub fn redact_url(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Reduce a Unix or Windows path to its file name.
pub fn strip_path(path: &str) -> &str {
    let start = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    &path[start..]
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::native::{build_filter, SinkLayer};
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as SinkResult;
    use bridge_traits::log::LogEntry;
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct Recorder {
        entries: Mutex<Vec<LogEntry>>,
        warn_only: bool,
    }

    #[async_trait]
    impl LoggerSink for Recorder {
        async fn log(&self, entry: LogEntry) -> SinkResult<()> {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }

        fn min_level(&self) -> LogLevel {
            if self.warn_only {
                LogLevel::Warn
            } else {
                LogLevel::Trace
            }
        }
    }

    fn with_recorder(recorder: Arc<Recorder>, body: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(SinkLayer(recorder));
        tracing::subscriber::with_default(subscriber, body);
    }

    #[test]
    fn test_default_filter_covers_workspace_and_quiets_dependencies() {
        let config = LoggingConfig::default().with_level(LogLevel::Debug);
        let filter = build_filter(&config).unwrap().to_string();
        assert!(filter.contains("core_playback=debug"));
        assert!(filter.contains("core_offline=debug"));
        assert!(filter.contains("sqlx=warn"));
    }

    #[test]
    fn test_custom_filter_replaces_defaults() {
        let config = LoggingConfig::default().with_filter("core_library=trace");
        let filter = build_filter(&config).unwrap().to_string();
        assert!(filter.contains("core_library=trace"));
        assert!(!filter.contains("core_playback"));
    }

    #[test]
    fn test_sink_receives_redacted_fields_and_span() {
        let recorder = Arc::new(Recorder::default());
        with_recorder(recorder.clone(), || {
            let span = tracing::info_span!("add_url");
            let _enter = span.enter();
            tracing::info!(
                target: "core_service",
                url = "https://cdn.example/a.mp3?sig=secret",
                file = "/home/sam/Music/a.mp3",
                "Added source"
            );
        });

        let entries = recorder.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.target, "core_service");
        assert_eq!(entry.message, "Added source");
        assert_eq!(entry.span.as_deref(), Some("add_url"));
        assert_eq!(entry.fields["url"], "https://cdn.example/a.mp3");
        assert_eq!(entry.fields["file"], "a.mp3");
    }

    #[test]
    fn test_sink_min_level_is_honored() {
        let recorder = Arc::new(Recorder {
            warn_only: true,
            ..Default::default()
        });
        with_recorder(recorder.clone(), || {
            tracing::info!("Playback started");
            tracing::warn!("Embedded player stop failed");
        });

        let entries = recorder.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Warn);
    }

    #[test]
    fn test_strip_path_handles_both_separators() {
        assert_eq!(strip_path("/home/user/music/song.mp3"), "song.mp3");
        assert_eq!(strip_path("C:\\Users\\Sam\\Music\\song.mp3"), "song.mp3");
        assert_eq!(strip_path("song.mp3"), "song.mp3");
        assert_eq!(strip_path("/var/log/"), "");
    }

    #[test]
    fn test_redact_url_keeps_path() {
        assert_eq!(
            redact_url("https://youtu.be/dQw4w9WgXcQ#t=42"),
            "https://youtu.be/dQw4w9WgXcQ"
        );
        assert_eq!(redact_url("./assets/sample.mp3"), "./assets/sample.mp3");
    }
}
