//! Duplicate song detection.
//!
//! Everything needed to decide whether a new song reference duplicates an
//! existing one: platform id extraction, name normalization, metadata
//! resolution and comparison, audio fingerprinting, and the decision cascade
//! that ties them together.

pub mod audio;
pub mod checker;
pub mod fingerprint;
pub mod metadata;
pub mod normalize;
pub mod resolver;
pub mod tools;
pub mod video_id;

pub use audio::AudioFingerprinter;
pub use checker::{
    AcceptedSong, Candidate, CandidateVerdict, CheckError, ComparisonOutcome, DuplicateChecker,
    MatchReason, UploadedFile,
};
pub use fingerprint::{fingerprints_match, Fingerprint, FingerprintKind};
pub use metadata::{metadata_matches, SongMetadata};
pub use normalize::{normalize_song_name, song_names_similar};
pub use resolver::{ContentClass, MetadataResolver};
pub use tools::{
    DisabledMediaTools, MediaTools, SystemMediaTools, ToolAvailability, ToolError, ToolTimeouts,
    VideoDetails,
};
pub use video_id::{extract_platform_id, is_video_platform_url, Platform, PlatformId};

/// Tunable thresholds for the similarity rules.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Minimum ratio of shared significant words for two song names to be
    /// considered the same.
    pub word_overlap_threshold: f64,
    /// How many tags two records must share before tag overlap alone counts
    /// as a match.
    pub min_shared_tags: usize,
    /// Tags at or below this length are ignored by the tag overlap rule.
    pub min_shared_tag_len: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            word_overlap_threshold: 0.5,
            min_shared_tags: 3,
            min_shared_tag_len: 3,
        }
    }
}
