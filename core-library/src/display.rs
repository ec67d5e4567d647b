//! Text helpers for rendering records in a list or "now playing" panel.

use crate::models::{Locator, SourceKind, SourceRecord};

const SHORT_URL_MAX: usize = 46;
const SHORT_URL_HEAD: usize = 26;
const SHORT_URL_TAIL: usize = 16;

/// Shorten long strings to head + `…` + tail. Counts characters, not bytes.
pub fn short_url(s: &str) -> String {
    let count = s.chars().count();
    if count <= SHORT_URL_MAX {
        return s.to_string();
    }
    let head: String = s.chars().take(SHORT_URL_HEAD).collect();
    let tail: String = s.chars().skip(count - SHORT_URL_TAIL).collect();
    format!("{head}…{tail}")
}

/// Compact badge text for a kind.
pub fn kind_label(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Local => "LOCAL",
        SourceKind::Direct => "URL",
        SourceKind::Embedded => "YT",
    }
}

/// One-line description of where a record's audio comes from.
pub fn locator_summary(record: &SourceRecord) -> String {
    match record.locator() {
        Locator::Bundled { path } => path.clone(),
        Locator::Imported {
            file_name: Some(name),
            ..
        } => format!("Local: {name}"),
        Locator::Imported { blob_key, .. } => format!("Local: {blob_key}"),
        Locator::Direct { url } => short_url(url),
        Locator::Embedded { content_id, .. } => {
            format!("YouTube: {}", content_id.as_deref().unwrap_or("?"))
        }
    }
}

/// Text placed on the clipboard for a record.
pub fn copy_text(record: &SourceRecord) -> String {
    match record.locator().url() {
        Some(url) => url.to_string(),
        None => locator_summary(record),
    }
}

/// Offline-availability hint shown next to the selected record.
pub fn kind_note(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Local => {
            "Local sources play even in airplane mode. Streaming sources need a connection."
        }
        SourceKind::Direct => {
            "Direct links need a connection and may be blocked by the remote server or CORS."
        }
        SourceKind::Embedded => {
            "YouTube needs a connection and may stop when the app goes to the background."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_url_keeps_short_strings() {
        let s = "https://example.com/a.mp3";
        assert_eq!(short_url(s), s);
        let exact = "x".repeat(46);
        assert_eq!(short_url(&exact), exact);
    }

    #[test]
    fn test_short_url_truncates_middle() {
        let s = format!("{}{}{}", "a".repeat(26), "b".repeat(10), "c".repeat(16));
        let short = short_url(&s);
        assert_eq!(short, format!("{}…{}", "a".repeat(26), "c".repeat(16)));
        assert_eq!(short.chars().count(), 43);
    }

    #[test]
    fn test_labels() {
        assert_eq!(kind_label(SourceKind::Local), "LOCAL");
        assert_eq!(kind_label(SourceKind::Direct), "URL");
        assert_eq!(kind_label(SourceKind::Embedded), "YT");
    }

    #[test]
    fn test_summary_and_copy_text() {
        let imported = SourceRecord::imported("", "take.wav", "file_1", 0);
        assert_eq!(locator_summary(&imported), "Local: take.wav");
        assert_eq!(copy_text(&imported), "Local: take.wav");

        let embedded = SourceRecord::embedded("", "https://youtu.be/abc", "abc", 0);
        assert_eq!(locator_summary(&embedded), "YouTube: abc");
        assert_eq!(copy_text(&embedded), "https://youtu.be/abc");

        let builtin = SourceRecord::builtin(0);
        assert_eq!(locator_summary(&builtin), "./assets/sample.mp3");
    }
}
