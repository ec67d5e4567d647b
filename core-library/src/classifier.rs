//! Source classifier
//!
//! Maps a raw user-supplied URL to a source kind using only the hostname and
//! path. No network access happens here, so adding a source stays
//! synchronous. Classification is total: malformed input is
//! [`Classification::NotRecognized`], never an error.

use url::Url;

/// Extensions accepted as direct audio, compared against the lowercased path.
pub const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".m4a", ".wav", ".ogg", ".aac"];

const SHORT_LINK_HOST: &str = "youtu.be";
const CANONICAL_HOSTS: &[&str] = &["youtube.com", "m.youtube.com"];

/// Result of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Embedded { content_id: String },
    Direct,
    NotRecognized,
}

/// Classify `raw`. Embedded patterns win over extension matching.
pub fn classify(raw: &str) -> Classification {
    let Ok(url) = Url::parse(raw.trim()) else {
        return Classification::NotRecognized;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return Classification::NotRecognized;
    }

    if let Some(content_id) = embedded_id(&url) {
        return Classification::Embedded { content_id };
    }
    if has_audio_extension(&url) {
        return Classification::Direct;
    }
    Classification::NotRecognized
}

/// Extract the embedded-video content id from `raw`, if it is one.
pub fn extract_embedded_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    embedded_id(&url)
}

/// Whether `raw` points at an allow-listed audio file.
pub fn is_direct_audio_url(raw: &str) -> bool {
    matches!(classify(raw), Classification::Direct)
}

fn embedded_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let id = if host == SHORT_LINK_HOST {
        segments.next().map(str::to_string)
    } else if CANONICAL_HOSTS.contains(&host) {
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("shorts") | Some("embed") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };

    id.filter(|id| !id.is_empty())
}

fn has_audio_extension(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    AUDIO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded(id: &str) -> Classification {
        Classification::Embedded {
            content_id: id.to_string(),
        }
    }

    #[test]
    fn test_four_embedded_shapes_yield_same_id() {
        for raw in [
            "https://youtu.be/abc123",
            "https://youtube.com/watch?v=abc123",
            "https://www.youtube.com/shorts/abc123",
            "https://m.youtube.com/embed/abc123",
        ] {
            assert_eq!(classify(raw), embedded("abc123"), "{raw}");
        }
    }

    #[test]
    fn test_embedded_tolerates_query_and_trailing_segments() {
        assert_eq!(classify("https://youtu.be/abc123?t=42"), embedded("abc123"));
        assert_eq!(
            classify("https://www.youtube.com/watch?list=PL1&v=abc123&t=3s"),
            embedded("abc123")
        );
        assert_eq!(
            classify("https://youtube.com/shorts/abc123/extra?feature=share"),
            embedded("abc123")
        );
        assert_eq!(classify("HTTPS://WWW.YOUTUBE.COM/embed/abc123"), embedded("abc123"));
    }

    #[test]
    fn test_embedded_host_without_id_is_not_recognized() {
        assert_eq!(classify("https://youtube.com/watch"), Classification::NotRecognized);
        assert_eq!(classify("https://youtu.be/"), Classification::NotRecognized);
        assert_eq!(classify("https://youtube.com/channel/xyz"), Classification::NotRecognized);
    }

    #[test]
    fn test_direct_audio_extensions() {
        assert_eq!(classify("https://cdn.example.com/a/song.mp3"), Classification::Direct);
        assert_eq!(classify("https://cdn.example.com/SONG.M4A?sig=1"), Classification::Direct);
        assert_eq!(classify("http://radio.example/live.aac#frag"), Classification::Direct);
        assert!(is_direct_audio_url("https://x.example/clip.ogg"));
        assert!(is_direct_audio_url("https://x.example/take.wav"));
    }

    #[test]
    fn test_extension_in_query_only_is_rejected() {
        assert_eq!(
            classify("https://example.com/stream?file=song.mp3"),
            Classification::NotRecognized
        );
    }

    #[test]
    fn test_malformed_and_unsupported_inputs() {
        for raw in ["", "not a url", "ftp://files.example/a.mp3", "https://example.com/page.html"] {
            assert_eq!(classify(raw), Classification::NotRecognized, "{raw}");
        }
    }

    #[test]
    fn test_extract_embedded_id() {
        assert_eq!(
            extract_embedded_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(extract_embedded_id("https://example.com/a.mp3"), None);
    }
}
