//! Media element backend.
//!
//! Local and Direct sources share one host media element. Imported files are
//! read from the blob store and wrapped in a transient reference; bundled
//! paths and direct URLs are handed to the element as-is.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::{
    media::{MediaElement, MediaElementOptions, MediaEvent, ObjectUrlRegistry},
    storage::BlobStore,
};
use core_library::{Locator, SourceKind, SourceRecord};
use futures::stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, instrument, warn};

use crate::error::{PlaybackError, Result};
use crate::handle::TransientHandle;
use crate::traits::{BackendStatus, PlaybackBackend, Prepared, StatusStream};

pub struct MediaElementBackend {
    element: Arc<dyn MediaElement>,
    object_urls: Arc<dyn ObjectUrlRegistry>,
    blobs: Arc<dyn BlobStore>,
    builtin_path: String,
}

impl MediaElementBackend {
    /// Wrap `element`, applying `options` once.
    pub fn new(
        element: Arc<dyn MediaElement>,
        object_urls: Arc<dyn ObjectUrlRegistry>,
        blobs: Arc<dyn BlobStore>,
        options: &MediaElementOptions,
        builtin_path: impl Into<String>,
    ) -> Self {
        element.configure(options);
        Self {
            element,
            object_urls,
            blobs,
            builtin_path: builtin_path.into(),
        }
    }

    async fn resolve_imported(&self, blob_key: &str) -> Result<Prepared> {
        let data = match self.blobs.get(blob_key).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                return Err(PlaybackError::MissingBlob {
                    key: blob_key.to_string(),
                })
            }
            Err(e) if e.is_unavailable() => return Err(PlaybackError::StoreUnavailable(e.to_string())),
            Err(e) => {
                return Err(PlaybackError::LoadError {
                    kind: SourceKind::Local,
                    message: e.to_string(),
                })
            }
        };

        let url = self
            .object_urls
            .create(data)
            .map_err(|e| PlaybackError::LoadError {
                kind: SourceKind::Local,
                message: e.to_string(),
            })?;
        debug!(blob_key, "Created transient reference");

        Ok(Prepared::Media {
            kind: SourceKind::Local,
            src: url.clone(),
            handle: Some(TransientHandle::new(url, self.object_urls.clone())),
        })
    }
}

fn translate(event: MediaEvent) -> BackendStatus {
    match event {
        MediaEvent::Playing => BackendStatus::Playing,
        MediaEvent::Paused => BackendStatus::Paused,
        MediaEvent::Ended => BackendStatus::Ended,
        MediaEvent::Error { message } => BackendStatus::Error { message },
    }
}

#[async_trait]
impl PlaybackBackend for MediaElementBackend {
    fn name(&self) -> &'static str {
        "media-element"
    }

    fn handles(&self, kind: SourceKind) -> bool {
        matches!(kind, SourceKind::Local | SourceKind::Direct)
    }

    #[instrument(skip(self, record), fields(id = %record.id()))]
    async fn prepare(&self, record: &SourceRecord) -> Result<Prepared> {
        match record.locator() {
            Locator::Imported { blob_key, .. } => self.resolve_imported(blob_key).await,
            Locator::Bundled { path } => {
                let src = if path.is_empty() {
                    self.builtin_path.clone()
                } else {
                    path.clone()
                };
                Ok(Prepared::Media {
                    kind: SourceKind::Local,
                    src,
                    handle: None,
                })
            }
            Locator::Direct { url } => Ok(Prepared::Media {
                kind: SourceKind::Direct,
                src: url.clone(),
                handle: None,
            }),
            Locator::Embedded { .. } => Err(PlaybackError::NoBackend {
                kind: SourceKind::Embedded,
            }),
        }
    }

    async fn start(&self, prepared: &Prepared) -> Result<()> {
        let Prepared::Media { kind, src, .. } = prepared else {
            return Err(PlaybackError::Internal(
                "media element cannot start embedded content".to_string(),
            ));
        };
        let kind = *kind;

        self.element.set_source(src);
        self.element.load();
        self.element.play().await.map_err(|e| {
            warn!(error = %e, "Media element refused to play");
            PlaybackError::PlayError {
                kind,
                message: e.to_string(),
            }
        })
    }

    fn stop(&self) {
        self.element.pause();
    }

    fn status_events(&self) -> StatusStream {
        let rx = self.element.subscribe();
        Box::pin(stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((translate(event), rx)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Media status stream lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeMediaElement, FakeObjectUrls};
    use bridge_desktop::MemoryBlobStore;
    use bytes::Bytes;
    use futures::StreamExt;

    struct Fixture {
        element: Arc<FakeMediaElement>,
        urls: Arc<FakeObjectUrls>,
        blobs: Arc<MemoryBlobStore>,
        backend: MediaElementBackend,
    }

    fn fixture() -> Fixture {
        let element = Arc::new(FakeMediaElement::new());
        let urls = Arc::new(FakeObjectUrls::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let backend = MediaElementBackend::new(
            element.clone(),
            urls.clone(),
            blobs.clone(),
            &MediaElementOptions::default(),
            core_library::BUILTIN_PATH,
        );
        Fixture {
            element,
            urls,
            blobs,
            backend,
        }
    }

    #[tokio::test]
    async fn test_configures_element_once() {
        let f = fixture();
        assert_eq!(f.element.options(), Some(MediaElementOptions::default()));
    }

    #[tokio::test]
    async fn test_builtin_and_direct_use_url_as_is() {
        let f = fixture();
        let prepared = f.backend.prepare(&SourceRecord::builtin(0)).await.unwrap();
        assert!(matches!(&prepared, Prepared::Media { src, handle: None, .. } if src == "./assets/sample.mp3"));

        let direct = SourceRecord::direct("r", "https://radio.example/a.mp3", 0);
        let prepared = f.backend.prepare(&direct).await.unwrap();
        f.backend.start(&prepared).await.unwrap();
        assert_eq!(f.element.source().as_deref(), Some("https://radio.example/a.mp3"));
        assert!(f.element.is_playing());
        assert_eq!(f.urls.created(), 0);
    }

    #[tokio::test]
    async fn test_imported_blob_becomes_transient_reference() {
        let f = fixture();
        f.blobs.put("file_1", Bytes::from_static(b"ID3")).await.unwrap();
        let record = SourceRecord::imported("", "a.mp3", "file_1", 0);

        let mut prepared = f.backend.prepare(&record).await.unwrap();
        assert_eq!(f.urls.outstanding(), 1);

        let handle = prepared.take_handle().unwrap();
        f.backend.start(&prepared).await.unwrap();
        assert_eq!(f.element.source().as_deref(), Some(handle.url()));

        drop(handle);
        assert_eq!(f.urls.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_missing_blob_and_unavailable_store() {
        let f = fixture();
        let record = SourceRecord::imported("", "a.mp3", "file_gone", 0);
        assert!(matches!(
            f.backend.prepare(&record).await,
            Err(PlaybackError::MissingBlob { key }) if key == "file_gone"
        ));

        f.blobs.set_available(false);
        assert!(matches!(
            f.backend.prepare(&record).await,
            Err(PlaybackError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_play_maps_to_play_error_by_kind() {
        let f = fixture();
        f.element.reject_play("NotAllowedError");

        let direct = SourceRecord::direct("r", "https://radio.example/a.mp3", 0);
        let prepared = f.backend.prepare(&direct).await.unwrap();
        assert!(matches!(
            f.backend.start(&prepared).await,
            Err(PlaybackError::PlayError { kind: SourceKind::Direct, .. })
        ));

        let prepared = f.backend.prepare(&SourceRecord::builtin(0)).await.unwrap();
        assert!(matches!(
            f.backend.start(&prepared).await,
            Err(PlaybackError::PlayError { kind: SourceKind::Local, .. })
        ));
    }

    #[tokio::test]
    async fn test_status_events_translate() {
        let f = fixture();
        let mut events = f.backend.status_events();

        let prepared = f.backend.prepare(&SourceRecord::builtin(0)).await.unwrap();
        f.backend.start(&prepared).await.unwrap();
        f.element.finish();

        assert_eq!(events.next().await, Some(BackendStatus::Playing));
        assert_eq!(events.next().await, Some(BackendStatus::Ended));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let f = fixture();
        f.backend.stop();
        f.backend.stop();
        assert!(!f.element.is_playing());
    }
}
