//! # Playback Module
//!
//! Drives exclusive single-stream playback across heterogeneous backends.
//!
//! ## Overview
//!
//! This module handles:
//! - The uniform backend contract (`prepare`, `start`, `stop`, status events)
//! - The media element backend for Local and Direct sources
//! - The embedded player backend with lazy single-flight initialization
//! - The playback controller state machine with the offline gate

pub mod adapters;
pub mod config;
pub mod controller;
pub mod error;
pub mod handle;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use adapters::{EmbeddedBackend, MediaElementBackend};
pub use config::PlaybackConfig;
pub use controller::{PlaybackController, PlaybackState};
pub use error::{PlaybackError, Result};
pub use handle::TransientHandle;
pub use traits::{BackendStatus, PlaybackBackend, Prepared, StatusStream};
