//! End-to-end behavior of the player service against in-memory hosts.

use std::sync::Arc;
use std::time::Duration;

use bridge_desktop::{DesktopNetworkMonitor, MemoryBlobStore, MemorySettingsStore};
use bridge_traits::{NetworkStatus, SettingsStore};
use bytes::Bytes;
use core_library::{LibraryError, SourceId, SourceKind, BUILTIN_ID};
use core_playback::testing::{FakeEmbedHost, FakeMediaElement, FakeObjectUrls};
use core_playback::{PlaybackError, PlaybackState};
use core_runtime::config::{CoreConfig, CoreConfigBuilder};
use core_runtime::events::{CoreEvent, LibraryEvent, NetworkEvent};
use core_service::{CoreError, Notice, PlaybackConfig, PlayerService, Severity};

const STATE_KEY: &str = "otp_state_v1";

struct Host {
    element: Arc<FakeMediaElement>,
    urls: Arc<FakeObjectUrls>,
    embed: Arc<FakeEmbedHost>,
    blobs: Arc<MemoryBlobStore>,
    settings: Arc<MemorySettingsStore>,
    network: Arc<DesktopNetworkMonitor>,
}

impl Host {
    fn new() -> Self {
        Self::with_blobs(MemoryBlobStore::new())
    }

    fn with_blobs(blobs: MemoryBlobStore) -> Self {
        Self {
            element: Arc::new(FakeMediaElement::new()),
            urls: Arc::new(FakeObjectUrls::new()),
            embed: Arc::new(FakeEmbedHost::new(true)),
            blobs: Arc::new(blobs),
            settings: Arc::new(MemorySettingsStore::new()),
            network: Arc::new(DesktopNetworkMonitor::with_status(NetworkStatus::Connected)),
        }
    }

    fn builder(&self) -> CoreConfigBuilder {
        CoreConfig::builder()
            .settings_store(self.settings.clone())
            .blob_store(self.blobs.clone())
            .network_monitor(self.network.clone())
            .media_element(self.element.clone())
            .object_urls(self.urls.clone())
            .embed_host(self.embed.clone())
    }

    async fn start(&self) -> PlayerService {
        self.start_with(self.builder()).await
    }

    async fn start_with(&self, builder: CoreConfigBuilder) -> PlayerService {
        core_service::bootstrap(builder, PlaybackConfig::default())
            .await
            .unwrap()
    }

    async fn stored_state(&self) -> String {
        self.settings.get_string(STATE_KEY).await.unwrap().unwrap()
    }
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

#[tokio::test]
async fn boot_replaces_corrupted_state_and_persists_it() {
    let host = Host::new();
    host.settings
        .set_string(STATE_KEY, "{\"items\": [{\"id\": 7}]")
        .await
        .unwrap();

    let service = host.start().await;

    let sources = service.sources().await;
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id().as_str(), BUILTIN_ID);
    assert!(host.stored_state().await.contains("\"selectedId\":\"sample\""));
}

#[tokio::test]
async fn toggle_plays_and_stops_the_sample() {
    let host = Host::new();
    let service = host.start().await;

    assert_eq!(service.toggle().await.unwrap(), Notice::ok("Playing."));
    assert_eq!(host.element.source().as_deref(), Some("./assets/sample.mp3"));
    assert!(service.is_playing());

    assert_eq!(service.toggle().await.unwrap(), Notice::ok("Stopped."));
    assert!(!host.element.is_playing());
    assert_eq!(service.playback_state(), PlaybackState::Idle);
}

#[tokio::test]
async fn embedded_source_is_gated_by_reachability() {
    let host = Host::new();
    let service = host.start().await;

    let notice = service
        .add_url("Rick", "https://youtu.be/dQw4w9WgXcQ")
        .await
        .unwrap();
    assert_eq!(notice.severity, Severity::Ok);
    assert_eq!(service.selected().await.kind(), SourceKind::Embedded);

    host.network.set_status(NetworkStatus::Disconnected);
    let err = service.toggle().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Playback(PlaybackError::OfflinePolicyViolation { .. })
    ));
    assert_eq!(Notice::from(&err).severity, Severity::Warn);
    assert_eq!(service.playback_state(), PlaybackState::Idle);
    assert_eq!(host.embed.api_loads(), 0);

    host.network.set_status(NetworkStatus::Connected);
    let notice = service.toggle().await.unwrap();
    assert_eq!(notice, Notice::ok("Playing YouTube (online only)."));
    assert_eq!(host.embed.player().loaded(), vec!["dQw4w9WgXcQ".to_string()]);
    assert_eq!(
        service.playback_state(),
        PlaybackState::Playing(SourceKind::Embedded)
    );
}

#[tokio::test]
async fn local_sources_play_offline() {
    let host = Host::new();
    host.network.set_status(NetworkStatus::Disconnected);
    let service = host.start().await;

    service.toggle().await.unwrap();
    assert_eq!(service.playback_state(), PlaybackState::Playing(SourceKind::Local));
}

#[tokio::test]
async fn rejected_urls_leave_collection_unchanged() {
    let host = Host::new();
    let service = host.start().await;

    let err = service
        .add_url("page", "https://example.com/page.html")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Library(LibraryError::ClassificationRejected { .. })
    ));
    assert_eq!(Notice::from(&err).severity, Severity::Bad);

    let err = service.add_url("blank", "   ").await.unwrap_err();
    assert_eq!(Notice::from(&err), Notice::warn("Enter a URL."));

    assert_eq!(service.sources().await.len(), 1);
}

#[tokio::test]
async fn imported_file_round_trip() {
    let host = Host::new();
    let service = host.start().await;

    service
        .import_file("", "song.mp3", Bytes::from_static(b"ID3\x03"))
        .await
        .unwrap();
    let record = service.selected().await;
    assert_eq!(record.tag(), "song.mp3");
    assert_eq!(host.blobs.len().await, 1);

    service.toggle().await.unwrap();
    assert_eq!(host.urls.outstanding(), 1);
    assert!(host.element.source().unwrap().starts_with("blob:"));

    service.remove(record.id()).await.unwrap();
    assert!(!service.is_playing());
    assert_eq!(host.urls.outstanding(), 0);
    assert_eq!(host.blobs.len().await, 0);
    assert_eq!(service.selected().await.id().as_str(), BUILTIN_ID);
}

#[tokio::test]
async fn imported_audio_plays_the_same_bytes_after_restart() {
    let host = Host::new();
    let audio = Bytes::from_static(b"ID3\x04\x00fake-frames");

    let (id, key) = {
        let service = host.start().await;
        service
            .import_file("tune", "tune.mp3", audio.clone())
            .await
            .unwrap();
        service.toggle().await.unwrap();
        let url = host.element.source().unwrap();
        assert_eq!(host.urls.bytes(&url), Some(audio.clone()));

        let record = service.selected().await;
        let key = record.locator().blob_key().unwrap().to_string();
        (record.id().clone(), key)
    };

    let service = host.start().await;
    let record = service.selected().await;
    assert_eq!(record.id(), &id);
    assert_eq!(record.locator().blob_key(), Some(key.as_str()));

    service.toggle().await.unwrap();
    assert_eq!(service.playback_state(), PlaybackState::Playing(SourceKind::Local));
    let url = host.element.source().unwrap();
    assert_eq!(host.urls.bytes(&url), Some(audio));
}

#[tokio::test]
async fn import_aborts_when_store_unavailable() {
    let host = Host::with_blobs(MemoryBlobStore::unavailable());
    let service = host.start().await;
    let before = host.stored_state().await;

    let err = service
        .import_file("tune", "tune.mp3", Bytes::from_static(b"RIFF"))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::StoreUnavailable(_)));
    assert_eq!(service.sources().await.len(), 1);
    assert_eq!(host.stored_state().await, before);
}

#[tokio::test]
async fn missing_blob_is_reported_distinctly() {
    let host = Host::new();
    let service = host.start().await;
    service
        .import_file("tune", "tune.mp3", Bytes::from_static(b"RIFF"))
        .await
        .unwrap();

    let key = service
        .selected()
        .await
        .locator()
        .blob_key()
        .unwrap()
        .to_string();
    bridge_traits::BlobStore::delete(host.blobs.as_ref(), &key)
        .await
        .unwrap();

    let err = service.toggle().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Playback(PlaybackError::MissingBlob { .. })
    ));
    assert!(!service.is_playing());
}

#[tokio::test]
async fn builtin_cannot_be_removed() {
    let host = Host::new();
    let service = host.start().await;

    let err = service.remove(&SourceId::builtin()).await.unwrap_err();
    assert_eq!(Notice::from(&err), Notice::warn("The sample cannot be removed."));

    let err = service.remove(&SourceId::new("url_missing")).await.unwrap_err();
    assert!(matches!(err, CoreError::Library(LibraryError::NotFound { .. })));
}

#[tokio::test]
async fn reset_stops_playback_and_keeps_blobs() {
    let host = Host::new();
    let service = host.start().await;
    service
        .import_file("tune", "tune.mp3", Bytes::from_static(b"RIFF"))
        .await
        .unwrap();
    service.toggle().await.unwrap();

    service.reset().await.unwrap();

    assert!(!service.is_playing());
    assert_eq!(service.sources().await.len(), 1);
    assert_eq!(host.blobs.len().await, 1);
}

#[tokio::test]
async fn selection_does_not_interrupt_playback() {
    let host = Host::new();
    let service = host.start().await;
    service
        .add_url("radio", "https://radio.example/live.mp3")
        .await
        .unwrap();

    service.toggle().await.unwrap();
    let notice = service.select(&SourceId::builtin()).await.unwrap();

    assert_eq!(notice.text, "Selected \"Sample (works offline)\".");
    assert_eq!(service.playback_state(), PlaybackState::Playing(SourceKind::Direct));
}

#[tokio::test]
async fn collection_survives_restart() {
    let host = Host::new();
    let id = {
        let service = host.start().await;
        service
            .add_url("radio", "https://radio.example/live.mp3")
            .await
            .unwrap();
        service.selected().await.id().clone()
    };

    let service = host.start().await;
    assert_eq!(service.sources().await.len(), 2);
    assert_eq!(service.selected().await.id(), &id);
}

#[tokio::test]
async fn library_changes_are_published() {
    let host = Host::new();
    let service = host.start().await;
    let mut events = service.subscribe();

    service
        .add_url("radio", "https://radio.example/live.mp3")
        .await
        .unwrap();
    let id = service.selected().await.id().to_string();

    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Library(LibraryEvent::SourceAdded {
            source_id: id.clone(),
            kind: SourceKind::Direct.as_str().to_string(),
            tag: "radio".into(),
        })
    );
    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Library(LibraryEvent::SelectionChanged { source_id: id })
    );
}

#[tokio::test]
async fn reachability_changes_are_forwarded() {
    let host = Host::new();
    let service = host.start().await;
    let mut events = service.subscribe();
    tokio::time::sleep(Duration::from_millis(20)).await;

    host.network.set_status(NetworkStatus::Disconnected);

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        event,
        CoreEvent::Network(NetworkEvent::StatusChanged { online: false })
    );
}

#[tokio::test]
async fn embed_api_preloads_on_start_when_enabled() {
    let host = Host::new();
    let service = host
        .start_with(host.builder().preload_embed_on_start(true))
        .await;

    assert!(eventually(|| host.embed.api_loads() == 1).await);
    drop(service);
}
