//! # Backend Adapter Contract
//!
//! Every playback primitive (the host media element, the embedded video
//! player) is driven through [`PlaybackBackend`]:
//!
//! - `prepare` resolves a record into something the backend can start
//! - `start` begins audible playback
//! - `stop` halts it, and is safe to call at any time
//! - `status_events` is a stream of uniform [`BackendStatus`] updates
//!
//! The controller depends only on this trait and subscribes to each
//! backend's status stream once, for the backend's lifetime.

use crate::error::Result;
use crate::handle::TransientHandle;
use async_trait::async_trait;
use core_library::{SourceKind, SourceRecord};

#[cfg(not(target_arch = "wasm32"))]
pub type StatusStream = futures::stream::BoxStream<'static, BackendStatus>;
#[cfg(target_arch = "wasm32")]
pub type StatusStream = futures::stream::LocalBoxStream<'static, BackendStatus>;

/// Uniform status reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Playing,
    Paused,
    Ended,
    Error { message: String },
}

/// Output of [`PlaybackBackend::prepare`].
#[derive(Debug)]
pub enum Prepared {
    /// A URL for the media element, plus the transient reference backing it
    /// when the audio came from the blob store.
    Media {
        kind: SourceKind,
        src: String,
        handle: Option<TransientHandle>,
    },
    /// A content id for the embedded player.
    Embedded { content_id: String },
}

impl Prepared {
    /// Take the transient reference out, leaving the rest startable.
    pub fn take_handle(&mut self) -> Option<TransientHandle> {
        match self {
            Prepared::Media { handle, .. } => handle.take(),
            Prepared::Embedded { .. } => None,
        }
    }
}

/// A playback driver for one or more source kinds.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PlaybackBackend: bridge_traits::PlatformSendSync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this backend plays records of `kind`.
    fn handles(&self, kind: SourceKind) -> bool;

    /// Resolve `record` into a startable form.
    ///
    /// # Errors
    ///
    /// `LoadError`, `MissingBlob` or `StoreUnavailable`.
    async fn prepare(&self, record: &SourceRecord) -> Result<Prepared>;

    /// Start playback of a prepared source.
    ///
    /// # Errors
    ///
    /// `PlayError` when the host refuses, `NotReady` when the backend did not
    /// initialize in time.
    async fn start(&self, prepared: &Prepared) -> Result<()>;

    /// Stop playback. Idempotent, including before `prepare` or `start`.
    fn stop(&self);

    /// Stream of status updates for this backend's lifetime.
    fn status_events(&self) -> StatusStream;
}
