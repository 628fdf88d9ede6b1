//! Song metadata model, extraction heuristics, and the metadata comparator.
//!
//! Metadata comes from two places: a fast title-only lookup and a slower
//! full-detail fetch (title, description, tags). Either way the interesting
//! output is `extracted_songs`: normalized song-name candidates pulled out of
//! the title, the description label patterns, and the tags.

use super::normalize::{normalize_song_name, song_names_similar};
use super::MatchingConfig;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Description is truncated to this many characters before storage.
pub const MAX_DESCRIPTION_LEN: usize = 500;
/// At most this many tags are kept per song.
pub const MAX_TAGS: usize = 20;

const MIN_CANDIDATE_LEN: usize = 3;
const MAX_CANDIDATE_LEN: usize = 50;

lazy_static! {
    // "Song Name - Artist", "Song Name | xyz", "Song Name (Official Video)"
    static ref TITLE_BEFORE_SEPARATOR: Regex = Regex::new(r"^(.+?)\s*[-|•]\s*").unwrap();
    static ref TITLE_BEFORE_PAREN: Regex = Regex::new(r"^(.+?)\s*\(").unwrap();
    static ref AFTER_NOTE_EMOJI: Regex = Regex::new(r"[🎵🎶]\s*([^\n\r,]+)").unwrap();

    // Label patterns common in video descriptions: "Song: xyz", "Track - xyz"...
    static ref LABELED_SONG: Regex = Regex::new(r"(?i)song[:\-\s]+([^\n\r,]+)").unwrap();
    static ref LABELED_TRACK: Regex = Regex::new(r"(?i)track[:\-\s]+([^\n\r,]+)").unwrap();
    static ref LABELED_MUSIC: Regex = Regex::new(r"(?i)music[:\-\s]+([^\n\r,]+)").unwrap();
    static ref LABELED_ORIGINAL: Regex = Regex::new(r"(?i)original[:\-\s]+([^\n\r,]+)").unwrap();
    static ref HASHTAG: Regex = Regex::new(r"#([a-zA-Z0-9\u{0900}-\u{097F}]+)").unwrap();
}

/// Metadata describing a song reference, produced by the resolver.
///
/// Immutable once produced; absence of the whole record means "no opinion",
/// never "not a duplicate".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub extracted_songs: Vec<String>,
    pub normalized_title: String,
}

impl SongMetadata {
    /// Build metadata from a fast-path title alone.
    ///
    /// Splits the title on common separator patterns to populate the
    /// extracted song candidates in addition to the normalized full title.
    pub fn from_title(title: &str) -> Self {
        let normalized_title = normalize_song_name(title);
        let mut songs = BTreeSet::new();

        for pattern in [&*TITLE_BEFORE_SEPARATOR, &*TITLE_BEFORE_PAREN, &*AFTER_NOTE_EMOJI] {
            if let Some(captures) = pattern.captures(title) {
                if let Some(m) = captures.get(1) {
                    let normalized = normalize_song_name(m.as_str());
                    if normalized.len() >= MIN_CANDIDATE_LEN {
                        songs.insert(normalized);
                    }
                }
            }
        }

        if normalized_title.len() >= MIN_CANDIDATE_LEN {
            songs.insert(normalized_title.clone());
        }

        Self {
            title: title.to_string(),
            description: String::new(),
            tags: Vec::new(),
            extracted_songs: songs.into_iter().collect(),
            normalized_title,
        }
    }

    /// Build metadata from full video details (slow path).
    ///
    /// Song-name candidates come from label patterns and hashtags in the
    /// combined title + description text, plus the tags themselves.
    pub fn from_details(title: &str, description: &str, tags: &[String]) -> Self {
        let text = format!("{} {}", title, description).to_lowercase();
        let mut songs = BTreeSet::new();

        for pattern in [
            &*HASHTAG,
            &*LABELED_SONG,
            &*AFTER_NOTE_EMOJI,
            &*LABELED_TRACK,
            &*LABELED_MUSIC,
            &*LABELED_ORIGINAL,
        ] {
            for captures in pattern.captures_iter(&text) {
                if let Some(m) = captures.get(1) {
                    let candidate = m.as_str().trim();
                    if candidate.len() > MIN_CANDIDATE_LEN - 1 && candidate.len() < MAX_CANDIDATE_LEN
                    {
                        songs.insert(candidate.to_lowercase());
                    }
                }
            }
        }

        for tag in tags {
            if tag.len() > MIN_CANDIDATE_LEN - 1 && tag.len() < MAX_CANDIDATE_LEN {
                songs.insert(tag.to_lowercase());
            }
        }

        Self {
            title: title.to_string(),
            description: truncate_chars(description, MAX_DESCRIPTION_LEN),
            tags: tags.iter().take(MAX_TAGS).cloned().collect(),
            extracted_songs: songs.into_iter().collect(),
            normalized_title: normalize_song_name(title),
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Aggregate same-song verdict between two metadata records.
///
/// Any positive signal wins: title vs title, extracted-song cross product,
/// extracted songs vs the other title (both directions), or tag overlap.
pub fn metadata_matches(a: &SongMetadata, b: &SongMetadata, config: &MatchingConfig) -> bool {
    if !a.normalized_title.is_empty()
        && !b.normalized_title.is_empty()
        && song_names_similar(&a.normalized_title, &b.normalized_title, config)
    {
        return true;
    }

    for song_a in &a.extracted_songs {
        for song_b in &b.extracted_songs {
            if song_names_similar(song_a, song_b, config) {
                return true;
            }
        }
    }

    for song_a in &a.extracted_songs {
        if song_names_similar(song_a, &b.normalized_title, config) {
            return true;
        }
    }
    for song_b in &b.extracted_songs {
        if song_names_similar(song_b, &a.normalized_title, config) {
            return true;
        }
    }

    shared_tag_count(a, b, config) >= config.min_shared_tags
}

/// Number of case-folded tags present in both records, counting only tags
/// longer than the configured minimum length.
fn shared_tag_count(a: &SongMetadata, b: &SongMetadata, config: &MatchingConfig) -> usize {
    let tags_b: BTreeSet<String> = b.tags.iter().map(|t| t.to_lowercase()).collect();
    a.tags
        .iter()
        .map(|t| t.to_lowercase())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|t| t.len() > config.min_shared_tag_len && tags_b.contains(t))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> MatchingConfig {
        MatchingConfig::default()
    }

    #[test]
    fn title_fast_path_extracts_prefix() {
        let meta = SongMetadata::from_title("Tum Hi Ho - Arijit Singh (Official Video)");
        assert_eq!(meta.normalized_title, "tum hi ho arijit singh");
        assert!(meta.extracted_songs.contains(&"tum hi ho".to_string()));
        assert!(meta.description.is_empty());
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn details_path_extracts_labels_and_hashtags() {
        let meta = SongMetadata::from_details(
            "Dance Cover Short",
            "My new video!\nSong: Kala Chashma\n#kalachashma #bollywood",
            &["kala chashma".to_string(), "dance".to_string()],
        );
        assert!(meta
            .extracted_songs
            .iter()
            .any(|s| s.contains("kala chashma")));
        assert!(meta.extracted_songs.contains(&"kalachashma".to_string()));
        assert!(meta.extracted_songs.contains(&"dance".to_string()));
    }

    #[test]
    fn details_path_bounds_description_and_tags() {
        let long_description = "x".repeat(2000);
        let many_tags: Vec<String> = (0..40).map(|i| format!("tag-number-{}", i)).collect();
        let meta = SongMetadata::from_details("Title", &long_description, &many_tags);
        assert_eq!(meta.description.len(), MAX_DESCRIPTION_LEN);
        assert_eq!(meta.tags.len(), MAX_TAGS);
    }

    #[test]
    fn titles_matching_after_normalization() {
        let a = SongMetadata::from_title("tum hi ho");
        let b = SongMetadata::from_title("Tum Hi Ho (Official Video)");
        assert!(metadata_matches(&a, &b, &cfg()));
    }

    #[test]
    fn extracted_song_matches_other_title() {
        let a = SongMetadata::from_details(
            "Wedding Short",
            "Song: Tum Hi Ho",
            &[],
        );
        let b = SongMetadata::from_title("Tum Hi Ho - Aashiqui 2");
        assert!(metadata_matches(&a, &b, &cfg()));
        assert!(metadata_matches(&b, &a, &cfg()));
    }

    fn tags_only(title: &str, tags: &[&str]) -> SongMetadata {
        SongMetadata {
            title: title.to_string(),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            extracted_songs: Vec::new(),
            normalized_title: normalize_song_name(title),
        }
    }

    #[test]
    fn tag_overlap_requires_three_long_shared_tags() {
        let tags = ["arijit singh", "aashiqui", "romantic"];
        let a = tags_only("Totally Unrelated A", &tags);
        let b = tags_only("Zzz Qqq Xxx", &tags);
        assert!(metadata_matches(&a, &b, &cfg()));

        // two shared tags is not enough
        let fewer = ["arijit singh", "aashiqui"];
        let c = tags_only("Totally Unrelated A", &fewer);
        let d = tags_only("Zzz Qqq Xxx", &fewer);
        assert!(!metadata_matches(&c, &d, &cfg()));
    }

    #[test]
    fn short_shared_tags_do_not_count() {
        let tags = ["pop", "mix", "dj"];
        let a = tags_only("Aaa Bbb", &tags);
        let b = tags_only("Ccc Ddd", &tags);
        assert!(!metadata_matches(&a, &b, &cfg()));
    }
}
