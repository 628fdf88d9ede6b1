//! Platform identifier extraction from media URLs.
//!
//! YouTube is the only platform with a recognized canonical identifier; every
//! other link (Spotify, JioSaavn, ...) is treated as opaque and falls back to
//! URL-hash fingerprints downstream.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Ordered URL patterns, first capturing group wins.
    static ref YOUTUBE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"youtube\.com/watch\?v=([^&\s?#]+)").unwrap(),
        Regex::new(r"youtu\.be/([^&\s?#]+)").unwrap(),
        Regex::new(r"youtube\.com/embed/([^&\s?#]+)").unwrap(),
        Regex::new(r"youtube\.com/v/([^&\s?#]+)").unwrap(),
        Regex::new(r"youtube\.com/shorts/([^&\s?#]+)").unwrap(),
        Regex::new(r"music\.youtube\.com/watch\?v=([^&\s?#]+)").unwrap(),
    ];
}

/// Supported platforms for canonical identifier extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Youtube,
}

/// A platform-specific canonical media identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformId {
    pub platform: Platform,
    pub id: String,
}

impl PlatformId {
    pub fn youtube(id: impl Into<String>) -> Self {
        Self {
            platform: Platform::Youtube,
            id: id.into(),
        }
    }
}

/// Extract a canonical video identifier from a URL.
///
/// Returns `None` for empty input and for any URL that doesn't match a known
/// platform pattern. Pure and synchronous, no I/O.
pub fn extract_platform_id(url: &str) -> Option<PlatformId> {
    if url.is_empty() {
        return None;
    }

    for pattern in YOUTUBE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(url) {
            if let Some(id) = captures.get(1) {
                return Some(PlatformId::youtube(id.as_str()));
            }
        }
    }

    None
}

/// Whether a URL belongs to the known video platform at all.
///
/// The not-a-music-video pre-filter only applies to such URLs.
pub fn is_video_platform_url(url: &str) -> bool {
    extract_platform_id(url).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_watch_url() {
        let id = extract_platform_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id, PlatformId::youtube("dQw4w9WgXcQ"));
    }

    #[test]
    fn extracts_short_link() {
        let id = extract_platform_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.id, "dQw4w9WgXcQ");
    }

    #[test]
    fn extracts_shorts_and_embed() {
        assert_eq!(
            extract_platform_id("https://youtube.com/shorts/abc123XYZ_-").unwrap().id,
            "abc123XYZ_-"
        );
        assert_eq!(
            extract_platform_id("https://www.youtube.com/embed/abc123XYZ_-").unwrap().id,
            "abc123XYZ_-"
        );
    }

    #[test]
    fn extracts_music_subdomain() {
        let id = extract_platform_id("https://music.youtube.com/watch?v=zzz999").unwrap();
        assert_eq!(id.id, "zzz999");
    }

    #[test]
    fn stops_at_query_separators() {
        let id = extract_platform_id("https://www.youtube.com/watch?v=ABC123&t=42s").unwrap();
        assert_eq!(id.id, "ABC123");
    }

    #[test]
    fn same_video_different_url_forms() {
        let a = extract_platform_id("https://youtube.com/watch?v=ABC123").unwrap();
        let b = extract_platform_id("https://youtu.be/ABC123").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_platforms_yield_none() {
        assert!(extract_platform_id("https://open.spotify.com/track/xyz").is_none());
        assert!(extract_platform_id("https://www.jiosaavn.com/song/abc").is_none());
        assert!(extract_platform_id("").is_none());
    }
}
