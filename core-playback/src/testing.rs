//! In-memory fakes of the host playback primitives.
//!
//! Each fake records the commands it received and lets a test inject the
//! events a real host would raise.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::{
    embed::{EmbedHost, EmbedPlayer, EmbedPlayerEvent, EmbedPlayerOptions},
    error::{BridgeError, Result},
    media::{MediaElement, MediaElementOptions, MediaEvent, ObjectUrlRegistry},
    EMBED_STATE_ENDED, EMBED_STATE_PAUSED, EMBED_STATE_PLAYING,
};
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::broadcast;

// ============================================================================
// Media element
// ============================================================================

/// Media element that "plays" instantly unless told to reject.
pub struct FakeMediaElement {
    options: Mutex<Option<MediaElementOptions>>,
    source: Mutex<Option<String>>,
    loads: AtomicUsize,
    playing: AtomicBool,
    reject_with: Mutex<Option<String>>,
    play_delay: Mutex<Option<Duration>>,
    events: broadcast::Sender<MediaEvent>,
}

impl FakeMediaElement {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            options: Mutex::new(None),
            source: Mutex::new(None),
            loads: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            reject_with: Mutex::new(None),
            play_delay: Mutex::new(None),
            events,
        }
    }

    /// Make every following `play` fail with `message`.
    pub fn reject_play(&self, message: impl Into<String>) {
        *self.reject_with.lock() = Some(message.into());
    }

    pub fn accept_play(&self) {
        *self.reject_with.lock() = None;
    }

    /// Delay `play` resolution, to overlap requests.
    pub fn set_play_delay(&self, delay: Duration) {
        *self.play_delay.lock() = Some(delay);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn source(&self) -> Option<String> {
        self.source.lock().clone()
    }

    pub fn options(&self) -> Option<MediaElementOptions> {
        self.options.lock().clone()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Simulate the source reaching its end.
    pub fn finish(&self) {
        if self.playing.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(MediaEvent::Ended);
        }
    }

    /// Simulate a host-initiated pause (interruption, unplugged headphones).
    pub fn interrupt(&self) {
        if self.playing.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(MediaEvent::Paused);
        }
    }

    /// Simulate a decode or network failure mid-stream.
    pub fn fail(&self, message: impl Into<String>) {
        self.playing.store(false, Ordering::SeqCst);
        let _ = self.events.send(MediaEvent::Error {
            message: message.into(),
        });
    }
}

impl Default for FakeMediaElement {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaElement for FakeMediaElement {
    fn configure(&self, options: &MediaElementOptions) {
        *self.options.lock() = Some(options.clone());
    }

    fn set_source(&self, src: &str) {
        *self.source.lock() = Some(src.to_string());
    }

    fn load(&self) {
        self.playing.store(false, Ordering::SeqCst);
        self.loads.fetch_add(1, Ordering::SeqCst);
    }

    async fn play(&self) -> Result<()> {
        let delay = *self.play_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.reject_with.lock().clone() {
            return Err(BridgeError::Rejected(message));
        }
        if self.source.lock().is_none() {
            return Err(BridgeError::Rejected("no source".to_string()));
        }
        self.playing.store(true, Ordering::SeqCst);
        let _ = self.events.send(MediaEvent::Playing);
        Ok(())
    }

    fn pause(&self) {
        if self.playing.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(MediaEvent::Paused);
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }
}

// ============================================================================
// Object URLs
// ============================================================================

/// Object URL registry that tracks outstanding references.
pub struct FakeObjectUrls {
    next: AtomicU64,
    live: Mutex<HashMap<String, Bytes>>,
    created: AtomicUsize,
}

impl FakeObjectUrls {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            live: Mutex::new(HashMap::new()),
            created: AtomicUsize::new(0),
        }
    }

    /// References created but not yet revoked.
    pub fn outstanding(&self) -> usize {
        self.live.lock().len()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Bytes behind a live reference.
    pub fn bytes(&self, url: &str) -> Option<Bytes> {
        self.live.lock().get(url).cloned()
    }
}

impl Default for FakeObjectUrls {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectUrlRegistry for FakeObjectUrls {
    fn create(&self, data: Bytes) -> Result<String> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let url = format!("blob:fake/{}-{}", n, data.len());
        self.live.lock().insert(url.clone(), data);
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(url)
    }

    fn revoke(&self, url: &str) {
        self.live.lock().remove(url);
    }
}

// ============================================================================
// Embedded player
// ============================================================================

/// Embedded player instance driven by the test.
pub struct FakeEmbedPlayer {
    ready: AtomicBool,
    playing: AtomicBool,
    loaded: Mutex<Vec<String>>,
    fail_start: AtomicBool,
    events: broadcast::Sender<EmbedPlayerEvent>,
}

impl FakeEmbedPlayer {
    pub fn new(ready: bool) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            ready: AtomicBool::new(ready),
            playing: AtomicBool::new(false),
            loaded: Mutex::new(Vec::new()),
            fail_start: AtomicBool::new(false),
            events,
        }
    }

    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
        let _ = self.events.send(EmbedPlayerEvent::Ready);
    }

    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().clone()
    }

    pub fn finish(&self) {
        self.playing.store(false, Ordering::SeqCst);
        let _ = self.events.send(EmbedPlayerEvent::StateChange(EMBED_STATE_ENDED));
    }

    pub fn raise_error(&self, code: i32) {
        self.playing.store(false, Ordering::SeqCst);
        let _ = self.events.send(EmbedPlayerEvent::Error(code));
    }
}

impl EmbedPlayer for FakeEmbedPlayer {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn load_by_id(&self, content_id: &str) -> Result<()> {
        self.loaded.lock().push(content_id.to_string());
        Ok(())
    }

    fn start(&self) -> Result<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("playVideo failed".to_string()));
        }
        self.playing.store(true, Ordering::SeqCst);
        let _ = self.events.send(EmbedPlayerEvent::StateChange(EMBED_STATE_PLAYING));
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if self.playing.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(EmbedPlayerEvent::StateChange(EMBED_STATE_PAUSED));
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EmbedPlayerEvent> {
        self.events.subscribe()
    }
}

/// Host that hands out a single shared [`FakeEmbedPlayer`].
pub struct FakeEmbedHost {
    player: Arc<FakeEmbedPlayer>,
    api_loads: AtomicUsize,
    players_created: AtomicUsize,
    load_delay: Mutex<Option<Duration>>,
    fail_load: AtomicBool,
    last_options: Mutex<Option<EmbedPlayerOptions>>,
}

impl FakeEmbedHost {
    /// `ready` controls whether the player reports readiness immediately.
    pub fn new(ready: bool) -> Self {
        Self {
            player: Arc::new(FakeEmbedPlayer::new(ready)),
            api_loads: AtomicUsize::new(0),
            players_created: AtomicUsize::new(0),
            load_delay: Mutex::new(None),
            fail_load: AtomicBool::new(false),
            last_options: Mutex::new(None),
        }
    }

    pub fn player(&self) -> Arc<FakeEmbedPlayer> {
        self.player.clone()
    }

    pub fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.lock() = Some(delay);
    }

    pub fn fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn api_loads(&self) -> usize {
        self.api_loads.load(Ordering::SeqCst)
    }

    pub fn players_created(&self) -> usize {
        self.players_created.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<EmbedPlayerOptions> {
        self.last_options.lock().clone()
    }
}

#[async_trait]
impl EmbedHost for FakeEmbedHost {
    async fn load_api(&self, _script_src: &str) -> Result<()> {
        self.api_loads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.load_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(BridgeError::NotAvailable("script blocked".to_string()));
        }
        Ok(())
    }

    fn create_player(&self, options: &EmbedPlayerOptions) -> Result<Arc<dyn EmbedPlayer>> {
        self.players_created.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock() = Some(options.clone());
        Ok(self.player.clone())
    }
}
