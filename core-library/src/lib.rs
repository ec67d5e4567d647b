//! # Source Library Module
//!
//! Owns the user's collection of audio sources and the current selection.
//!
//! ## Overview
//!
//! This module manages:
//! - The source record model (Local, Direct and Embedded kinds)
//! - URL classification into source kinds
//! - The persisted collection with corruption fallback
//! - Display helpers for list rendering

pub mod classifier;
pub mod collection;
pub mod display;
pub mod error;
pub mod models;

pub use classifier::{classify, extract_embedded_id, Classification};
pub use collection::SourceCollection;
pub use error::{LibraryError, Result};
pub use models::{
    new_blob_key, CollectionState, Locator, SourceId, SourceKind, SourceRecord, BUILTIN_ID,
    BUILTIN_PATH, DEFAULT_TAG, STATE_VERSION,
};
