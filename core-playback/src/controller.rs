//! # Playback Controller
//!
//! Owns the single playback session and drives the backends through
//! `Idle`, `Loading(kind)`, `Playing(kind)` and `StoppedWithError`.
//!
//! ## Rules
//!
//! - Entering `Loading` first stops whichever backend is active, so at most
//!   one backend ever produces audio.
//! - Direct and Embedded sources are refused while offline, before any
//!   backend is touched. Local sources always proceed.
//! - Each play bumps a generation counter. A play overtaken by a newer play
//!   or a stop finishes with [`PlaybackError::Superseded`] and changes
//!   nothing.
//! - Status events are honored only from the active backend. `Paused` and
//!   `Ended` count only after the backend confirmed the current session with
//!   `Playing`; anything earlier belongs to the session that was just torn
//!   down.
//! - The transient reference of an imported file lives in the session and is
//!   released on every transition away from it.
//!
//! Selection is not tracked here: callers pass the record to play.

use std::sync::{Arc, Weak};

use bridge_traits::network::NetworkMonitor;
use core_library::{SourceId, SourceKind, SourceRecord};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::{PlaybackError, Result};
use crate::handle::TransientHandle;
use crate::traits::{BackendStatus, PlaybackBackend, StatusStream};

/// Externally visible controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading(SourceKind),
    Playing(SourceKind),
    StoppedWithError { message: String },
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing(_))
    }

    /// Kind currently loading or playing.
    pub fn kind(&self) -> Option<SourceKind> {
        match self {
            PlaybackState::Loading(kind) | PlaybackState::Playing(kind) => Some(*kind),
            _ => None,
        }
    }
}

struct Session {
    state: PlaybackState,
    generation: u64,
    active: Option<usize>,
    source_id: Option<SourceId>,
    handle: Option<TransientHandle>,
    confirmed: bool,
}

impl Session {
    fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            generation: 0,
            active: None,
            source_id: None,
            handle: None,
            confirmed: false,
        }
    }
}

struct Inner {
    backends: Vec<Arc<dyn PlaybackBackend>>,
    network: Arc<dyn NetworkMonitor>,
    events: Option<EventBus>,
    session: Mutex<Session>,
}

impl Inner {
    fn backend_for(&self, kind: SourceKind) -> Result<usize> {
        self.backends
            .iter()
            .position(|b| b.handles(kind))
            .ok_or(PlaybackError::NoBackend { kind })
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.events {
            // No subscribers is fine.
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }

    /// Stop the active backend, release the transient reference and
    /// invalidate any in-flight play.
    fn halt(&self, session: &mut Session) {
        if let Some(index) = session.active.take() {
            trace!(backend = self.backends[index].name(), "Stopping active backend");
            self.backends[index].stop();
        }
        if let Some(handle) = session.handle.take() {
            handle.release();
        }
        session.generation += 1;
        session.confirmed = false;
    }

    /// Move to `StoppedWithError` unless `generation` was overtaken.
    fn fail(&self, generation: u64, err: PlaybackError) -> PlaybackError {
        let mut session = self.session.lock();
        if session.generation != generation {
            return PlaybackError::Superseded;
        }
        let source_id = session.source_id.take();
        self.halt(&mut session);
        let message = err.user_message();
        session.state = PlaybackState::StoppedWithError {
            message: message.clone(),
        };
        drop(session);

        error!(error = %err, "Playback failed");
        self.emit(PlaybackEvent::Failed {
            source_id: source_id.map(|id| id.to_string()),
            message,
        });
        err
    }

    fn on_status(&self, index: usize, status: BackendStatus) {
        let mut session = self.session.lock();
        if session.active != Some(index) {
            trace!(backend = self.backends[index].name(), ?status, "Ignoring status from inactive backend");
            return;
        }

        let event = match status {
            BackendStatus::Playing => {
                session.confirmed = true;
                return;
            }
            BackendStatus::Paused | BackendStatus::Ended => {
                if !session.confirmed || !session.state.is_playing() {
                    trace!(?status, "Ignoring status from a superseded session");
                    return;
                }
                let source_id = session.source_id.take();
                session.active = None;
                if let Some(handle) = session.handle.take() {
                    handle.release();
                }
                session.generation += 1;
                session.confirmed = false;
                session.state = PlaybackState::Idle;
                debug!(?status, "Active backend stopped on its own");

                match (status, source_id) {
                    (BackendStatus::Ended, Some(id)) => PlaybackEvent::Ended {
                        source_id: id.to_string(),
                    },
                    (_, source_id) => PlaybackEvent::Stopped {
                        source_id: source_id.map(|id| id.to_string()),
                    },
                }
            }
            BackendStatus::Error { message } => {
                // While loading, the result of `start` decides.
                if !session.state.is_playing() {
                    return;
                }
                let source_id = session.source_id.take();
                self.halt(&mut session);
                let message = format!("Playback error: {message}");
                session.state = PlaybackState::StoppedWithError {
                    message: message.clone(),
                };
                warn!(%message, "Backend failed mid-stream");
                PlaybackEvent::Failed {
                    source_id: source_id.map(|id| id.to_string()),
                    message,
                }
            }
        };
        drop(session);
        self.emit(event);
    }
}

/// The single owner of playback state.
///
/// Construct inside a Tokio runtime: one task per backend forwards its
/// status stream into the controller.
pub struct PlaybackController {
    inner: Arc<Inner>,
    pumps: Vec<JoinHandle<()>>,
}

impl PlaybackController {
    pub fn new(
        backends: Vec<Arc<dyn PlaybackBackend>>,
        network: Arc<dyn NetworkMonitor>,
        events: Option<EventBus>,
    ) -> Self {
        let inner = Arc::new(Inner {
            backends,
            network,
            events,
            session: Mutex::new(Session::new()),
        });

        let pumps = inner
            .backends
            .iter()
            .enumerate()
            .map(|(index, backend)| {
                spawn_pump(Arc::downgrade(&inner), index, backend.status_events())
            })
            .collect();

        Self { inner, pumps }
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.session.lock().state.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.session.lock().state.is_playing()
    }

    /// Kind of the source currently loading or playing.
    pub fn active_kind(&self) -> Option<SourceKind> {
        self.inner.session.lock().state.kind()
    }

    /// Id of the source currently loading or playing.
    pub fn active_source(&self) -> Option<SourceId> {
        self.inner.session.lock().source_id.clone()
    }

    /// Play `record`, stopping whatever is active first.
    ///
    /// # Errors
    ///
    /// `OfflinePolicyViolation` leaves the state untouched. Load and play
    /// failures leave the controller in `StoppedWithError`. `Superseded`
    /// means a newer play or stop took over.
    #[instrument(skip(self, record), fields(id = %record.id(), kind = %record.kind()))]
    pub async fn play(&self, record: &SourceRecord) -> Result<()> {
        let kind = record.kind();
        let source_id = record.id().clone();

        if kind.requires_network() && !self.inner.network.is_online() {
            let err = PlaybackError::OfflinePolicyViolation { kind };
            warn!("Refusing network-dependent source while offline");
            self.inner.emit(PlaybackEvent::Refused {
                source_id: source_id.to_string(),
                message: err.user_message(),
            });
            return Err(err);
        }

        let index = self.inner.backend_for(kind)?;
        let backend = self.inner.backends[index].clone();

        let generation = {
            let mut session = self.inner.session.lock();
            self.inner.halt(&mut session);
            session.state = PlaybackState::Loading(kind);
            session.active = Some(index);
            session.source_id = Some(source_id.clone());
            session.generation
        };
        self.inner.emit(PlaybackEvent::Loading {
            source_id: source_id.to_string(),
            kind: kind.as_str().to_string(),
        });

        let mut prepared = match backend.prepare(record).await {
            Ok(prepared) => prepared,
            Err(e) => return Err(self.inner.fail(generation, e)),
        };

        {
            let mut session = self.inner.session.lock();
            if session.generation != generation {
                debug!("Play superseded while preparing");
                return Err(PlaybackError::Superseded);
            }
            session.handle = prepared.take_handle();
        }

        if let Err(e) = backend.start(&prepared).await {
            return Err(self.inner.fail(generation, e));
        }

        let mut session = self.inner.session.lock();
        if session.generation != generation {
            // Someone else owns the backends now. Silence ours unless it
            // was handed to the newer session.
            if session.active != Some(index) {
                backend.stop();
            }
            debug!("Play superseded while starting");
            return Err(PlaybackError::Superseded);
        }
        session.state = PlaybackState::Playing(kind);
        drop(session);

        info!(backend = backend.name(), "Playback started");
        self.inner.emit(PlaybackEvent::Started {
            source_id: source_id.to_string(),
            kind: kind.as_str().to_string(),
        });
        Ok(())
    }

    /// Stop playback. A no-op when idle.
    pub fn stop(&self) {
        let mut session = self.inner.session.lock();
        match session.state {
            PlaybackState::Idle => {}
            PlaybackState::StoppedWithError { .. } => {
                session.state = PlaybackState::Idle;
            }
            PlaybackState::Loading(_) | PlaybackState::Playing(_) => {
                let source_id = session.source_id.take();
                self.inner.halt(&mut session);
                session.state = PlaybackState::Idle;
                drop(session);

                info!("Playback stopped");
                self.inner.emit(PlaybackEvent::Stopped {
                    source_id: source_id.map(|id| id.to_string()),
                });
            }
        }
    }

    #[cfg(test)]
    fn handle_status(&self, index: usize, status: BackendStatus) {
        self.inner.on_status(index, status);
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        for pump in &self.pumps {
            pump.abort();
        }
    }
}

fn spawn_pump(inner: Weak<Inner>, index: usize, mut events: StatusStream) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(status) = events.next().await {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            inner.on_status(index, status);
        }
    })
}
