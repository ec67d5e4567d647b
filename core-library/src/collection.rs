//! Persisted source collection
//!
//! Holds the records and the current selection, and round-trips them through
//! a [`SettingsStore`] as a single JSON document. Mutations are in-memory;
//! callers persist with [`SourceCollection::save`].
//!
//! Loading never fails: a missing key yields the default state, and a
//! corrupted document (non-array `items`, missing fields, unknown kinds) is
//! discarded in favor of the default state holding only the built-in record.

use std::sync::Arc;

use bridge_traits::{storage::SettingsStore, time::Clock};
use tracing::{debug, info, warn};

use crate::{
    classifier::{classify, Classification},
    error::{LibraryError, Result},
    models::{CollectionState, SourceId, SourceRecord},
};

pub struct SourceCollection {
    settings: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    state_key: String,
    state: CollectionState,
    last_created_at: i64,
}

impl SourceCollection {
    /// Load the collection stored under `state_key`, normalizing it.
    pub async fn load(
        settings: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
        state_key: impl Into<String>,
    ) -> Self {
        let state_key = state_key.into();
        let now = clock.now_millis();

        let mut state = match settings.get_string(&state_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<CollectionState>(&raw) {
                Ok(state) => state,
                Err(e) => {
                    warn!(key = %state_key, error = %e, "Discarding corrupted collection state");
                    CollectionState::with_builtin(now)
                }
            },
            Ok(None) => {
                debug!(key = %state_key, "No stored collection, starting fresh");
                CollectionState::with_builtin(now)
            }
            Err(e) => {
                warn!(key = %state_key, error = %e, "Failed to read collection state");
                CollectionState::with_builtin(now)
            }
        };

        if state.normalize(now) {
            info!(key = %state_key, "Normalized collection state");
        }

        let last_created_at = state.items.iter().map(SourceRecord::created_at).max().unwrap_or(now);

        Self {
            settings,
            clock,
            state_key,
            state,
            last_created_at,
        }
    }

    /// Write the current state back to the settings store.
    pub async fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.state)?;
        self.settings.set_string(&self.state_key, &json).await?;
        debug!(key = %self.state_key, items = self.state.items.len(), "Saved collection state");
        Ok(())
    }

    pub fn state(&self) -> &CollectionState {
        &self.state
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.state.items
    }

    pub fn len(&self) -> usize {
        self.state.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.items.is_empty()
    }

    pub fn get(&self, id: &SourceId) -> Option<&SourceRecord> {
        self.state.find(id)
    }

    pub fn selected_id(&self) -> &SourceId {
        &self.state.selected_id
    }

    /// The selected record. Normalization keeps the selection valid, so this
    /// only falls back to the first record if the state was mutated around it.
    pub fn selected(&self) -> &SourceRecord {
        match self.state.find(&self.state.selected_id) {
            Some(record) => record,
            None => &self.state.items[0],
        }
    }

    /// Records in creation order. Ties keep insertion order.
    pub fn sorted(&self) -> Vec<&SourceRecord> {
        let mut records: Vec<&SourceRecord> = self.state.items.iter().collect();
        records.sort_by_key(|r| r.created_at());
        records
    }

    /// Change the selection. Never touches playback.
    pub fn select(&mut self, id: &SourceId) -> Result<()> {
        if self.state.find(id).is_none() {
            return Err(LibraryError::NotFound { id: id.to_string() });
        }
        self.state.selected_id = id.clone();
        Ok(())
    }

    /// Classify `raw_url` and add the matching record, selecting it.
    pub fn add_url(&mut self, tag: &str, raw_url: &str) -> Result<&SourceRecord> {
        let url = raw_url.trim();
        if url.is_empty() {
            return Err(LibraryError::EmptyUrl);
        }

        let created_at = self.next_created_at();
        let record = match classify(url) {
            Classification::Embedded { content_id } => {
                SourceRecord::embedded(tag, url, content_id, created_at)
            }
            Classification::Direct => SourceRecord::direct(tag, url, created_at),
            Classification::NotRecognized => {
                return Err(LibraryError::ClassificationRejected {
                    url: url.to_string(),
                })
            }
        };

        info!(id = %record.id(), kind = %record.kind(), "Added source");
        Ok(self.push_selected(record))
    }

    /// Add a record for a file already stored under `blob_key`, selecting it.
    pub fn add_imported(&mut self, tag: &str, file_name: &str, blob_key: &str) -> &SourceRecord {
        let created_at = self.next_created_at();
        let record = SourceRecord::imported(tag, file_name, blob_key, created_at);
        info!(id = %record.id(), "Added imported source");
        self.push_selected(record)
    }

    /// Remove a record. Returns it so the caller can release its blob.
    pub fn remove(&mut self, id: &SourceId) -> Result<SourceRecord> {
        if id.is_builtin() {
            return Err(LibraryError::BuiltinProtected);
        }
        let index = self
            .state
            .items
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| LibraryError::NotFound { id: id.to_string() })?;

        let removed = self.state.items.remove(index);
        if &self.state.selected_id == id {
            self.state.selected_id = SourceId::builtin();
        }
        info!(id = %id, "Removed source");
        Ok(removed)
    }

    /// Replace everything with the default state. Stored blobs are left alone.
    pub fn reset(&mut self) {
        let now = self.clock.now_millis();
        self.state = CollectionState::with_builtin(now);
        self.last_created_at = now;
        info!("Collection reset");
    }

    fn push_selected(&mut self, record: SourceRecord) -> &SourceRecord {
        self.state.selected_id = record.id().clone();
        self.state.items.push(record);
        let last = self.state.items.len() - 1;
        &self.state.items[last]
    }

    fn next_created_at(&mut self) -> i64 {
        let now = self.clock.now_millis();
        let ts = now.max(self.last_created_at + 1);
        self.last_created_at = ts;
        ts
    }
}
