//! Domain models for the source collection
//!
//! A [`SourceRecord`] pairs a user-facing tag with a kind-specific
//! [`Locator`]. The kind is derived from the locator, so it can never drift
//! after creation. Records persist in a camelCase JSON shape shared with the
//! web build (`sourceType`, `videoId`, `fileKey`, `fileName`, `createdAt`).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Id of the distinguished built-in record.
pub const BUILTIN_ID: &str = "sample";
/// Bundled resource played by the built-in record.
pub const BUILTIN_PATH: &str = "./assets/sample.mp3";
/// Tag of the built-in record.
pub const BUILTIN_TAG: &str = "Sample (works offline)";
/// Placeholder used when a tag is left empty.
pub const DEFAULT_TAG: &str = "Untitled";
/// Version string written into persisted state.
pub const STATE_VERSION: &str = "1.0.0";

// =============================================================================
// ID Types
// =============================================================================

/// Opaque, immutable identifier of a source record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The built-in record's id.
    pub fn builtin() -> Self {
        Self(BUILTIN_ID.to_string())
    }

    /// Fresh id of the form `<prefix>_<random hex>`.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}_{}", prefix, Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_builtin(&self) -> bool {
        self.0 == BUILTIN_ID
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Generate a fresh blob store key for an imported file.
pub fn new_blob_key() -> String {
    format!("file_{}", Uuid::new_v4().simple())
}

// =============================================================================
// Kind and locator
// =============================================================================

/// Source kind. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Device-resident audio: the bundled sample or an imported file.
    Local,
    /// Remote audio streamed from an absolute URL.
    Direct,
    /// Audio of a third-party video-platform embed.
    Embedded,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Local => "Local",
            SourceKind::Direct => "Direct",
            SourceKind::Embedded => "Embedded",
        }
    }

    /// Kinds that cannot play without the network.
    pub fn requires_network(&self) -> bool {
        !matches!(self, SourceKind::Local)
    }

    fn wire_name(&self) -> &'static str {
        match self {
            SourceKind::Local => "local",
            SourceKind::Direct => "direct",
            SourceKind::Embedded => "youtube",
        }
    }

    fn from_wire(name: &str) -> Option<Self> {
        match name {
            "local" => Some(SourceKind::Local),
            "direct" => Some(SourceKind::Direct),
            "youtube" => Some(SourceKind::Embedded),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a record's audio comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A resource bundled with the application.
    Bundled { path: String },
    /// An imported file held in the blob store.
    Imported {
        blob_key: String,
        file_name: Option<String>,
    },
    /// An absolute URL to remote audio.
    Direct { url: String },
    /// A video-platform URL and the content id extracted from it.
    Embedded {
        url: String,
        content_id: Option<String>,
    },
}

impl Locator {
    pub fn kind(&self) -> SourceKind {
        match self {
            Locator::Bundled { .. } | Locator::Imported { .. } => SourceKind::Local,
            Locator::Direct { .. } => SourceKind::Direct,
            Locator::Embedded { .. } => SourceKind::Embedded,
        }
    }

    /// Blob key of an imported file.
    pub fn blob_key(&self) -> Option<&str> {
        match self {
            Locator::Imported { blob_key, .. } => Some(blob_key),
            _ => None,
        }
    }

    /// Remote URL for Direct and Embedded locators.
    pub fn url(&self) -> Option<&str> {
        match self {
            Locator::Direct { url } | Locator::Embedded { url, .. } => Some(url),
            _ => None,
        }
    }
}

// =============================================================================
// Source record
// =============================================================================

/// A user-added playable audio origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordWire", into = "RecordWire")]
pub struct SourceRecord {
    id: SourceId,
    tag: String,
    locator: Locator,
    created_at: i64,
}

impl SourceRecord {
    /// The distinguished built-in record.
    pub fn builtin(created_at: i64) -> Self {
        Self {
            id: SourceId::builtin(),
            tag: BUILTIN_TAG.to_string(),
            locator: Locator::Bundled {
                path: BUILTIN_PATH.to_string(),
            },
            created_at,
        }
    }

    pub fn direct(tag: &str, url: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: SourceId::generate("url"),
            tag: normalize_tag(tag, None),
            locator: Locator::Direct { url: url.into() },
            created_at,
        }
    }

    pub fn embedded(
        tag: &str,
        url: impl Into<String>,
        content_id: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: SourceId::generate("yt"),
            tag: normalize_tag(tag, None),
            locator: Locator::Embedded {
                url: url.into(),
                content_id: Some(content_id.into()),
            },
            created_at,
        }
    }

    /// Record for a file already written to the blob store under `blob_key`.
    /// An empty tag falls back to the file name.
    pub fn imported(tag: &str, file_name: &str, blob_key: impl Into<String>, created_at: i64) -> Self {
        let file_name = file_name.trim();
        let file_name = (!file_name.is_empty()).then(|| file_name.to_string());
        Self {
            id: SourceId::generate("local"),
            tag: normalize_tag(tag, file_name.as_deref()),
            locator: Locator::Imported {
                blob_key: blob_key.into(),
                file_name,
            },
            created_at,
        }
    }

    pub fn id(&self) -> &SourceId {
        &self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> SourceKind {
        self.locator.kind()
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Milliseconds since the Unix epoch. Only used for ordering.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn is_builtin(&self) -> bool {
        self.id.is_builtin()
    }
}

/// Trim a tag, falling back to `fallback` and then to [`DEFAULT_TAG`].
pub fn normalize_tag(tag: &str, fallback: Option<&str>) -> String {
    let tag = tag.trim();
    if !tag.is_empty() {
        return tag.to_string();
    }
    match fallback.map(str::trim).filter(|f| !f.is_empty()) {
        Some(f) => f.to_string(),
        None => DEFAULT_TAG.to_string(),
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordWire {
    id: String,
    tag: String,
    source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
    created_at: i64,
}

impl TryFrom<RecordWire> for SourceRecord {
    type Error = String;

    fn try_from(wire: RecordWire) -> Result<Self, Self::Error> {
        if wire.id.trim().is_empty() {
            return Err("record id cannot be empty".to_string());
        }
        let kind = SourceKind::from_wire(&wire.source_type)
            .ok_or_else(|| format!("unknown source type '{}'", wire.source_type))?;

        let locator = match kind {
            SourceKind::Local => match wire.file_key {
                Some(blob_key) => Locator::Imported {
                    blob_key,
                    file_name: wire.file_name,
                },
                None => Locator::Bundled {
                    path: wire.url.unwrap_or_else(|| BUILTIN_PATH.to_string()),
                },
            },
            SourceKind::Direct => Locator::Direct {
                url: wire
                    .url
                    .ok_or_else(|| format!("direct record {} has no url", wire.id))?,
            },
            SourceKind::Embedded => Locator::Embedded {
                url: wire
                    .url
                    .ok_or_else(|| format!("embedded record {} has no url", wire.id))?,
                content_id: wire.video_id.filter(|v| !v.is_empty()),
            },
        };

        Ok(Self {
            id: SourceId::new(wire.id),
            tag: wire.tag,
            locator,
            created_at: wire.created_at,
        })
    }
}

impl From<SourceRecord> for RecordWire {
    fn from(record: SourceRecord) -> Self {
        let source_type = record.kind().wire_name().to_string();
        let mut wire = RecordWire {
            id: record.id.0,
            tag: record.tag,
            source_type,
            url: None,
            video_id: None,
            file_key: None,
            file_name: None,
            created_at: record.created_at,
        };
        match record.locator {
            Locator::Bundled { path } => wire.url = Some(path),
            Locator::Imported {
                blob_key,
                file_name,
            } => {
                wire.file_key = Some(blob_key);
                wire.file_name = file_name;
            }
            Locator::Direct { url } => wire.url = Some(url),
            Locator::Embedded { url, content_id } => {
                wire.url = Some(url);
                wire.video_id = content_id;
            }
        }
        wire
    }
}

// =============================================================================
// Collection state
// =============================================================================

/// Persisted collection: `{ version, selectedId, items }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionState {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub selected_id: SourceId,
    pub items: Vec<SourceRecord>,
}

fn default_version() -> String {
    STATE_VERSION.to_string()
}

impl CollectionState {
    /// Fresh state holding only the built-in record, selected.
    pub fn with_builtin(created_at: i64) -> Self {
        Self {
            version: default_version(),
            selected_id: SourceId::builtin(),
            items: vec![SourceRecord::builtin(created_at)],
        }
    }

    pub fn find(&self, id: &SourceId) -> Option<&SourceRecord> {
        self.items.iter().find(|r| &r.id == id)
    }

    /// Re-insert the built-in record at the front if missing and point a
    /// dangling selection back at it. Returns whether anything changed.
    pub fn normalize(&mut self, created_at: i64) -> bool {
        let mut changed = false;
        if !self.items.iter().any(SourceRecord::is_builtin) {
            self.items.insert(0, SourceRecord::builtin(created_at));
            changed = true;
        }
        if self.find(&self.selected_id).is_none() {
            self.selected_id = SourceId::builtin();
            changed = true;
        }
        changed
    }
}
