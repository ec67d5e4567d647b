//! # Player Service
//!
//! Wires the injected host capabilities to the source collection and the
//! playback controller, and turns every user action into a [`Notice`].

use std::sync::Arc;

use bridge_traits::{BlobStore, CacheStorage, HttpClient, NetworkMonitor};
use bytes::Bytes;
use core_library::{
    new_blob_key, CollectionState, LibraryError, SourceCollection, SourceId, SourceKind,
    SourceRecord,
};
use core_playback::{
    EmbeddedBackend, MediaElementBackend, PlaybackBackend, PlaybackConfig, PlaybackController,
    PlaybackState,
};
use core_runtime::config::{CoreConfig, FeatureFlags};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, NetworkEvent};
use core_runtime::logging::{redact_url, strip_path};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{CoreError, Result};
use crate::notice::Notice;

pub struct PlayerService {
    collection: Mutex<SourceCollection>,
    controller: PlaybackController,
    embedded: Arc<EmbeddedBackend>,
    blobs: Arc<dyn BlobStore>,
    events: EventBus,
    features: FeatureFlags,
    http_client: Option<Arc<dyn HttpClient>>,
    cache_storage: Option<Arc<dyn CacheStorage>>,
    tasks: Vec<JoinHandle<()>>,
}

impl PlayerService {
    /// Build the service and restore the persisted collection.
    ///
    /// Must run inside a Tokio runtime. The normalized collection is written
    /// back immediately; a failed write is logged, not fatal.
    #[instrument(skip_all, fields(state_key = %config.state_key))]
    pub async fn start(config: CoreConfig, playback: PlaybackConfig) -> Result<Self> {
        playback
            .validate()
            .map_err(|e| CoreError::InitializationFailed(format!("playback config: {}", e)))?;

        let media: Arc<dyn PlaybackBackend> = Arc::new(MediaElementBackend::new(
            config.media_element.clone(),
            config.object_urls.clone(),
            config.blob_store.clone(),
            &playback.media,
            playback.builtin_path.clone(),
        ));
        let embedded = Arc::new(EmbeddedBackend::new(config.embed_host.clone(), &playback));
        let controller = PlaybackController::new(
            vec![media, embedded.clone()],
            config.network_monitor.clone(),
            Some(config.event_bus.clone()),
        );

        let collection = SourceCollection::load(
            config.settings_store.clone(),
            config.clock.clone(),
            config.state_key.clone(),
        )
        .await;
        if let Err(e) = collection.save().await {
            warn!(error = %e, "Failed to persist normalized collection");
        }

        let mut tasks = vec![spawn_network_forwarder(
            config.network_monitor.clone(),
            config.event_bus.clone(),
        )];
        if config.features.preload_embed_on_start {
            tasks.push(spawn_preload(embedded.clone()));
        }

        info!(sources = collection.len(), "Player service ready");

        Ok(Self {
            collection: Mutex::new(collection),
            controller,
            embedded,
            blobs: config.blob_store,
            events: config.event_bus,
            features: config.features,
            http_client: config.http_client,
            cache_storage: config.cache_storage,
            tasks,
        })
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn is_playing(&self) -> bool {
        self.controller.is_playing()
    }

    /// Records in creation order.
    pub async fn sources(&self) -> Vec<SourceRecord> {
        self.collection
            .lock()
            .await
            .sorted()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn selected(&self) -> SourceRecord {
        self.collection.lock().await.selected().clone()
    }

    /// Copy of the persisted state.
    pub async fn snapshot(&self) -> CollectionState {
        self.collection.lock().await.state().clone()
    }

    /// Make `id` current. Playback is not interrupted.
    pub async fn select(&self, id: &SourceId) -> Result<Notice> {
        let tag = {
            let mut collection = self.collection.lock().await;
            collection.select(id)?;
            collection.save().await?;
            collection.selected().tag().to_string()
        };
        self.emit(LibraryEvent::SelectionChanged {
            source_id: id.to_string(),
        });
        Ok(Notice::ok(format!("Selected \"{}\".", tag)))
    }

    /// Play the selected record.
    ///
    /// A play overtaken by a newer play or stop returns an error whose
    /// [`CoreError::is_user_facing`] is `false`.
    pub async fn play_selected(&self) -> Result<Notice> {
        let record = self.selected().await;
        self.controller.play(&record).await?;
        Ok(match record.kind() {
            SourceKind::Embedded => Notice::ok("Playing YouTube (online only)."),
            _ => Notice::ok("Playing."),
        })
    }

    pub fn stop(&self) -> Notice {
        self.controller.stop();
        Notice::ok("Stopped.")
    }

    /// The one-tap control: stop when playing, play the selection otherwise.
    pub async fn toggle(&self) -> Result<Notice> {
        if self.controller.is_playing() {
            Ok(self.stop())
        } else {
            self.play_selected().await
        }
    }

    /// Classify `raw_url` and add it as the selected record.
    #[instrument(skip_all, fields(url = %redact_url(raw_url)))]
    pub async fn add_url(&self, tag: &str, raw_url: &str) -> Result<Notice> {
        let record = {
            let mut collection = self.collection.lock().await;
            let record = collection.add_url(tag, raw_url)?.clone();
            collection.save().await?;
            record
        };
        self.emit_added(&record);

        if record.kind() == SourceKind::Embedded {
            if self.features.preload_embed_on_add {
                spawn_preload(self.embedded.clone());
            }
            Ok(Notice::ok("Added YouTube source (online only)."))
        } else {
            Ok(Notice::ok("Added URL source."))
        }
    }

    /// Store `data` in the blob store and add it as the selected record.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` when the blob cannot be written. The collection is
    /// left untouched in that case.
    #[instrument(skip_all, fields(file = %strip_path(file_name), bytes = data.len()))]
    pub async fn import_file(&self, tag: &str, file_name: &str, data: Bytes) -> Result<Notice> {
        let blob_key = new_blob_key();
        self.blobs.put(&blob_key, data).await.map_err(|e| {
            warn!(error = %e, "Import aborted, blob store rejected the file");
            CoreError::StoreUnavailable(e.to_string())
        })?;

        let record = {
            let mut collection = self.collection.lock().await;
            let record = collection.add_imported(tag, file_name, &blob_key).clone();
            collection.save().await?;
            record
        };
        self.emit_added(&record);
        Ok(Notice::ok("Added local source (works offline)."))
    }

    /// Remove a record, stopping playback first when it is selected or
    /// currently playing. Its blob is deleted on a best-effort basis.
    pub async fn remove(&self, id: &SourceId) -> Result<Notice> {
        let mut collection = self.collection.lock().await;
        if id.is_builtin() {
            return Err(LibraryError::BuiltinProtected.into());
        }
        if collection.get(id).is_none() {
            return Err(LibraryError::NotFound { id: id.to_string() }.into());
        }

        let active = self.controller.active_source();
        if collection.selected_id() == id || active.as_ref() == Some(id) {
            self.controller.stop();
        }

        let removed = collection.remove(id)?;
        if let Some(key) = removed.locator().blob_key() {
            if let Err(e) = self.blobs.delete(key).await {
                warn!(error = %e, key, "Failed to delete imported audio");
            }
        }
        collection.save().await?;
        drop(collection);

        self.emit(LibraryEvent::SourceRemoved {
            source_id: id.to_string(),
        });
        Ok(Notice::ok("Removed."))
    }

    /// Stop playback and restore the collection to the built-in record only.
    /// Imported blobs stay in the store.
    pub async fn reset(&self) -> Result<Notice> {
        self.controller.stop();
        {
            let mut collection = self.collection.lock().await;
            collection.reset();
            collection.save().await?;
        }
        self.emit(LibraryEvent::CollectionReset);
        Ok(Notice::ok("Reset."))
    }

    /// Router for the offline shell, sharing this service's HTTP client,
    /// cache storage and event bus.
    #[cfg(feature = "offline-shell")]
    pub fn shell_router(
        &self,
        shell: core_offline::ShellCacheConfig,
    ) -> Result<core_offline::CacheRouter> {
        let http = self.http_client.clone().ok_or_else(|| {
            CoreError::InitializationFailed("offline shell needs an HttpClient".to_string())
        })?;
        let cache = self.cache_storage.clone().ok_or_else(|| {
            CoreError::InitializationFailed("offline shell needs a CacheStorage".to_string())
        })?;
        Ok(core_offline::CacheRouter::new(shell, http, cache)?.with_event_bus(self.events.clone()))
    }

    /// Whether an HTTP client and cache storage were provided.
    pub fn has_shell_capabilities(&self) -> bool {
        self.http_client.is_some() && self.cache_storage.is_some()
    }

    fn emit_added(&self, record: &SourceRecord) {
        self.emit(LibraryEvent::SourceAdded {
            source_id: record.id().to_string(),
            kind: record.kind().as_str().to_string(),
            tag: record.tag().to_string(),
        });
        self.emit(LibraryEvent::SelectionChanged {
            source_id: record.id().to_string(),
        });
    }

    fn emit(&self, event: LibraryEvent) {
        let _ = self.events.emit(CoreEvent::Library(event));
    }
}

impl Drop for PlayerService {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn spawn_network_forwarder(network: Arc<dyn NetworkMonitor>, events: EventBus) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut changes = match network.subscribe_changes().await {
            Ok(changes) => changes,
            Err(e) => {
                debug!(error = %e, "Reachability changes not available");
                return;
            }
        };
        while let Some(status) = changes.next().await {
            let online = status.is_online();
            debug!(online, "Reachability changed");
            let _ = events.emit(CoreEvent::Network(NetworkEvent::StatusChanged { online }));
        }
    })
}

fn spawn_preload(embedded: Arc<EmbeddedBackend>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = embedded.preload().await {
            warn!(error = %e, "Embedded player preload failed");
        }
    })
}
