//! Embedded video-platform backend.
//!
//! The vendor script is loaded lazily, once, the first time it is needed, and
//! the player instance is created right after it. Both happen inside a
//! single-flight initializer so concurrent callers share one load. Player
//! callbacks are forwarded into this backend's own status channel, which
//! exists before the player does.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::{
    embed::{EmbedHost, EmbedPlayer, EmbedPlayerEvent, EmbedPlayerOptions},
    EMBED_STATE_ENDED, EMBED_STATE_PAUSED, EMBED_STATE_PLAYING,
};
use core_library::{extract_embedded_id, Locator, SourceKind, SourceRecord};
use futures::stream;
use tokio::sync::{broadcast, OnceCell};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::traits::{BackendStatus, PlaybackBackend, Prepared, StatusStream};

const STATUS_CHANNEL_CAPACITY: usize = 32;

pub struct EmbeddedBackend {
    host: Arc<dyn EmbedHost>,
    script_url: String,
    options: EmbedPlayerOptions,
    ready_timeout: Duration,
    poll_interval: Duration,
    player: OnceCell<Arc<dyn EmbedPlayer>>,
    status_tx: broadcast::Sender<BackendStatus>,
    /// Bumped by every `stop`; a start that waited across a stop gives up.
    stop_epoch: AtomicU64,
}

impl EmbeddedBackend {
    pub fn new(host: Arc<dyn EmbedHost>, config: &PlaybackConfig) -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            host,
            script_url: config.embed_script_url.clone(),
            options: config.embed_player.clone(),
            ready_timeout: config.ready_timeout(),
            poll_interval: config.ready_poll_interval(),
            player: OnceCell::new(),
            status_tx,
            stop_epoch: AtomicU64::new(0),
        }
    }

    /// Load the vendor script and create the player if not done yet.
    /// A failed attempt leaves the cell empty so the next call retries.
    pub async fn preload(&self) -> Result<()> {
        self.ensure_player().await.map(|_| ())
    }

    /// Whether the player instance exists.
    pub fn is_initialized(&self) -> bool {
        self.player.initialized()
    }

    async fn ensure_player(&self) -> Result<Arc<dyn EmbedPlayer>> {
        let player = self
            .player
            .get_or_try_init(|| async {
                info!(script = %self.script_url, "Loading embedded player API");
                self.host
                    .load_api(&self.script_url)
                    .await
                    .map_err(|e| PlaybackError::LoadError {
                        kind: SourceKind::Embedded,
                        message: e.to_string(),
                    })?;

                let player = self.host.create_player(&self.options).map_err(|e| {
                    PlaybackError::LoadError {
                        kind: SourceKind::Embedded,
                        message: e.to_string(),
                    }
                })?;
                spawn_forwarder(player.subscribe(), self.status_tx.clone());
                debug!(element = %self.options.element_id, "Embedded player created");
                Ok::<_, PlaybackError>(player)
            })
            .await?;
        Ok(player.clone())
    }

    /// Script load, player creation and readiness share one deadline.
    /// An init cut short by the deadline leaves the cell empty.
    async fn ready_player(&self) -> Result<Arc<dyn EmbedPlayer>> {
        let deadline = Instant::now() + self.ready_timeout;
        let player = tokio::time::timeout_at(deadline, self.ensure_player())
            .await
            .map_err(|_| self.not_ready())??;
        loop {
            if player.is_ready() {
                return Ok(player);
            }
            if Instant::now() >= deadline {
                return Err(self.not_ready());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn not_ready(&self) -> PlaybackError {
        PlaybackError::NotReady {
            waited_ms: self.ready_timeout.as_millis() as u64,
        }
    }
}

fn translate(event: EmbedPlayerEvent) -> Option<BackendStatus> {
    match event {
        EmbedPlayerEvent::StateChange(EMBED_STATE_PLAYING) => Some(BackendStatus::Playing),
        EmbedPlayerEvent::StateChange(EMBED_STATE_PAUSED) => Some(BackendStatus::Paused),
        EmbedPlayerEvent::StateChange(EMBED_STATE_ENDED) => Some(BackendStatus::Ended),
        EmbedPlayerEvent::Error(code) => Some(BackendStatus::Error {
            message: format!("embedded player error {code}"),
        }),
        EmbedPlayerEvent::StateChange(_) | EmbedPlayerEvent::Ready => None,
    }
}

fn spawn_forwarder(
    mut rx: broadcast::Receiver<EmbedPlayerEvent>,
    tx: broadcast::Sender<BackendStatus>,
) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(status) = translate(event) {
                        // No subscribers is fine.
                        let _ = tx.send(status);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Embedded player events lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[async_trait]
impl PlaybackBackend for EmbeddedBackend {
    fn name(&self) -> &'static str {
        "embedded"
    }

    fn handles(&self, kind: SourceKind) -> bool {
        kind == SourceKind::Embedded
    }

    #[instrument(skip(self, record), fields(id = %record.id()))]
    async fn prepare(&self, record: &SourceRecord) -> Result<Prepared> {
        let Locator::Embedded { url, content_id } = record.locator() else {
            return Err(PlaybackError::NoBackend {
                kind: record.kind(),
            });
        };

        let content_id = content_id
            .clone()
            .or_else(|| extract_embedded_id(url))
            .ok_or_else(|| PlaybackError::LoadError {
                kind: SourceKind::Embedded,
                message: "no content id in URL".to_string(),
            })?;

        Ok(Prepared::Embedded { content_id })
    }

    async fn start(&self, prepared: &Prepared) -> Result<()> {
        let Prepared::Embedded { content_id } = prepared else {
            return Err(PlaybackError::Internal(
                "embedded player cannot start media element content".to_string(),
            ));
        };

        let epoch = self.stop_epoch.load(Ordering::SeqCst);
        let player = self.ready_player().await?;
        if self.stop_epoch.load(Ordering::SeqCst) != epoch {
            debug!("Stopped while waiting for readiness");
            return Err(PlaybackError::Superseded);
        }

        let play_error = |e: bridge_traits::BridgeError| PlaybackError::PlayError {
            kind: SourceKind::Embedded,
            message: e.to_string(),
        };
        player.load_by_id(content_id).map_err(play_error)?;
        player.start().map_err(play_error)?;
        debug!(content_id = %content_id, "Embedded playback started");
        Ok(())
    }

    fn stop(&self) {
        self.stop_epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(player) = self.player.get() {
            if player.is_ready() {
                if let Err(e) = player.stop() {
                    warn!(error = %e, "Embedded player stop failed");
                }
            }
        }
    }

    fn status_events(&self) -> StatusStream {
        let rx = self.status_tx.subscribe();
        Box::pin(stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(status) => return Some((status, rx)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEmbedHost;
    use futures::StreamExt;

    fn backend(host: &Arc<FakeEmbedHost>) -> EmbeddedBackend {
        let config = PlaybackConfig {
            ready_timeout_ms: 200,
            ready_poll_interval_ms: 10,
            ..PlaybackConfig::default()
        };
        EmbeddedBackend::new(host.clone(), &config)
    }

    #[tokio::test]
    async fn test_concurrent_preloads_load_script_once() {
        let host = Arc::new(FakeEmbedHost::new(true));
        host.set_load_delay(Duration::from_millis(20));
        let backend = backend(&host);

        let (a, b, c) = tokio::join!(backend.preload(), backend.preload(), backend.preload());
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(host.api_loads(), 1);
        assert_eq!(host.players_created(), 1);

        backend.preload().await.unwrap();
        assert_eq!(host.api_loads(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let host = Arc::new(FakeEmbedHost::new(true));
        host.fail_load(true);
        let backend = backend(&host);

        assert!(matches!(
            backend.preload().await,
            Err(PlaybackError::LoadError { kind: SourceKind::Embedded, .. })
        ));
        assert!(!backend.is_initialized());

        host.fail_load(false);
        backend.preload().await.unwrap();
        assert_eq!(host.api_loads(), 2);
        assert!(backend.is_initialized());
    }

    #[tokio::test]
    async fn test_player_options_are_forwarded() {
        let host = Arc::new(FakeEmbedHost::new(true));
        let backend = backend(&host);
        backend.preload().await.unwrap();

        let options = host.last_options().unwrap();
        assert_eq!(options.element_id, "ytPlayer");
        assert!(options.plays_inline);
        assert!(!options.keyboard);
    }

    #[tokio::test]
    async fn test_start_loads_content_id() {
        let host = Arc::new(FakeEmbedHost::new(true));
        let backend = backend(&host);
        let record = SourceRecord::embedded("", "https://youtu.be/dQw4w9WgXcQ", "dQw4w9WgXcQ", 0);

        let prepared = backend.prepare(&record).await.unwrap();
        backend.start(&prepared).await.unwrap();

        let player = host.player();
        assert_eq!(player.loaded(), vec!["dQw4w9WgXcQ".to_string()]);
        assert!(player.is_playing());
    }

    #[tokio::test]
    async fn test_missing_content_id_is_reextracted() {
        let host = Arc::new(FakeEmbedHost::new(true));
        let backend = backend(&host);
        let json = r#"{"id":"yt_1","tag":"t","sourceType":"youtube","url":"https://www.youtube.com/watch?v=abc123","createdAt":1}"#;
        let record: SourceRecord = serde_json::from_str(json).unwrap();

        let prepared = backend.prepare(&record).await.unwrap();
        assert!(matches!(prepared, Prepared::Embedded { ref content_id } if content_id == "abc123"));

        let broken = r#"{"id":"yt_2","tag":"t","sourceType":"youtube","url":"https://www.youtube.com/feed","createdAt":1}"#;
        let record: SourceRecord = serde_json::from_str(broken).unwrap();
        assert!(matches!(
            backend.prepare(&record).await,
            Err(PlaybackError::LoadError { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_times_out_when_player_never_ready() {
        let host = Arc::new(FakeEmbedHost::new(false));
        let backend = backend(&host);
        let record = SourceRecord::embedded("", "https://youtu.be/abc", "abc", 0);

        let prepared = backend.prepare(&record).await.unwrap();
        let started = Instant::now();
        assert!(matches!(
            backend.start(&prepared).await,
            Err(PlaybackError::NotReady { waited_ms: 200 })
        ));
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(host.player().loaded().is_empty());
    }

    #[tokio::test]
    async fn test_slow_script_load_counts_against_ready_timeout() {
        let host = Arc::new(FakeEmbedHost::new(true));
        host.set_load_delay(Duration::from_secs(5));
        let backend = backend(&host);
        let record = SourceRecord::embedded("", "https://youtu.be/abc", "abc", 0);
        let prepared = backend.prepare(&record).await.unwrap();

        let started = Instant::now();
        assert!(matches!(
            backend.start(&prepared).await,
            Err(PlaybackError::NotReady { waited_ms: 200 })
        ));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!backend.is_initialized());

        host.set_load_delay(Duration::ZERO);
        backend.start(&prepared).await.unwrap();
        assert_eq!(host.player().loaded(), vec!["abc".to_string()]);
    }

    #[tokio::test]
    async fn test_prepare_does_not_load_script() {
        let host = Arc::new(FakeEmbedHost::new(true));
        let backend = backend(&host);
        let record = SourceRecord::embedded("", "https://youtu.be/abc", "abc", 0);

        backend.prepare(&record).await.unwrap();
        assert_eq!(host.api_loads(), 0);
    }

    #[tokio::test]
    async fn test_start_waits_for_late_readiness() {
        let host = Arc::new(FakeEmbedHost::new(false));
        let backend = backend(&host);
        let record = SourceRecord::embedded("", "https://youtu.be/abc", "abc", 0);
        let prepared = backend.prepare(&record).await.unwrap();
        backend.preload().await.unwrap();

        let player = host.player();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            player.set_ready();
        });

        backend.start(&prepared).await.unwrap();
        assert!(host.player().is_playing());
    }

    #[tokio::test]
    async fn test_vendor_codes_are_translated() {
        let host = Arc::new(FakeEmbedHost::new(true));
        let backend = backend(&host);
        let mut events = backend.status_events();
        let record = SourceRecord::embedded("", "https://youtu.be/abc", "abc", 0);

        let prepared = backend.prepare(&record).await.unwrap();
        backend.start(&prepared).await.unwrap();
        host.player().finish();
        host.player().raise_error(150);

        assert_eq!(events.next().await, Some(BackendStatus::Playing));
        assert_eq!(events.next().await, Some(BackendStatus::Ended));
        assert!(matches!(events.next().await, Some(BackendStatus::Error { .. })));
    }

    #[tokio::test]
    async fn test_stop_before_init_is_noop() {
        let host = Arc::new(FakeEmbedHost::new(true));
        let backend = backend(&host);
        backend.stop();
        assert_eq!(host.api_loads(), 0);
    }
}
