//! The duplicate decision cascade.
//!
//! One check call runs the detection stages in increasing cost order against
//! the accepted-songs snapshot and the caller's in-batch pending links,
//! short-circuiting on the first positive match. Metadata and audio stages
//! abstain on any failure; only input validation and a broken pre-filter
//! produce hard errors.

use super::audio::AudioFingerprinter;
use super::fingerprint::{fingerprints_match, Fingerprint};
use super::metadata::{metadata_matches, SongMetadata};
use super::resolver::{ContentClass, MetadataResolver};
use super::tools::ToolError;
use super::video_id::{extract_platform_id, is_video_platform_url};
use super::MatchingConfig;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Why a candidate was flagged as a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    ExactUrl,
    SamePlatformId,
    SameFingerprint,
    MetadataMatch,
    AudioMatch,
}

impl MatchReason {
    pub fn code(&self) -> &'static str {
        match self {
            MatchReason::ExactUrl => "exact_url",
            MatchReason::SamePlatformId => "same_platform_id",
            MatchReason::SameFingerprint => "same_fingerprint",
            MatchReason::MetadataMatch => "metadata_match",
            MatchReason::AudioMatch => "audio_match",
        }
    }
}

/// A song from the accepted-songs comparison set.
///
/// The record store's shape adapter flattens both the legacy single-song
/// records and multi-song records into one of these per song.
#[derive(Debug, Clone, Default)]
pub struct AcceptedSong {
    pub song_name: String,
    pub url: Option<String>,
    pub fingerprint: Option<String>,
    pub metadata: Option<SongMetadata>,
}

/// An uploaded audio file accompanying a candidate.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The new song reference being checked.
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    pub url: Option<String>,
    pub file: Option<UploadedFile>,
}

/// Outcome of a `check_candidate` call.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateVerdict {
    /// No stage matched; the caller may persist the song along with the
    /// returned fingerprint.
    Accepted { fingerprint: Option<String> },
    /// The pre-filter classified the reference as non-music content.
    NotMusic { message: String },
    /// A cascade stage matched an existing song.
    Duplicate {
        reason: MatchReason,
        message: String,
        matched_song: Option<String>,
    },
}

/// Outcome of the ad-hoc two-song comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOutcome {
    pub is_same: bool,
    /// Display-only similarity percentage, not used for further logic.
    pub similarity: u8,
    pub reason: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("content pre-filter failed: {0}")]
    PreFilter(#[source] ToolError),
}

pub struct DuplicateChecker {
    resolver: Arc<MetadataResolver>,
    audio: Arc<AudioFingerprinter>,
    config: MatchingConfig,
}

impl DuplicateChecker {
    pub fn new(
        resolver: Arc<MetadataResolver>,
        audio: Arc<AudioFingerprinter>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            resolver,
            audio,
            config,
        }
    }

    /// Run the full cascade for a candidate against the accepted songs and
    /// the caller's pending in-batch links.
    pub async fn check_candidate(
        &self,
        candidate: &Candidate,
        accepted: &[AcceptedSong],
        pending_links: &[String],
    ) -> Result<CandidateVerdict, CheckError> {
        if candidate.url.is_none() && candidate.file.is_none() {
            return Err(CheckError::InvalidInput(
                "Please provide a song link or upload a file".to_string(),
            ));
        }

        let url = candidate.url.as_deref().unwrap_or("");
        let platform_id = extract_platform_id(url);

        // Stage 1: not-a-music-video screen. Only meaningful for URLs on the
        // known video platform; a broken pre-filter aborts the whole check.
        if is_video_platform_url(url) {
            match self
                .resolver
                .classify_content(url)
                .await
                .map_err(CheckError::PreFilter)?
            {
                ContentClass::NotMusic { reason } => {
                    info!("Rejecting non-music content: {}", reason);
                    return Ok(CandidateVerdict::NotMusic {
                        message: format!(
                            "This doesn't appear to be a song. {}. Please add a music video link.",
                            reason
                        ),
                    });
                }
                ContentClass::Music | ContentClass::Unknown => {}
            }
        }

        // Stage 2: exact URL match.
        if !url.is_empty() {
            for song in accepted {
                if song.url.as_deref() == Some(url) {
                    return Ok(duplicate(
                        MatchReason::ExactUrl,
                        "This exact link is already used. Please choose a different song.",
                        song,
                    ));
                }
            }
        }

        // Stage 3: platform identifier match.
        if let Some(ref new_id) = platform_id {
            for song in accepted {
                let existing_id = song.url.as_deref().and_then(extract_platform_id);
                if existing_id.as_ref() == Some(new_id) {
                    return Ok(duplicate(
                        MatchReason::SamePlatformId,
                        "This video is already selected. Please choose a different song.",
                        song,
                    ));
                }
            }
        }

        // Stage 4: stored fingerprint match on the cheap id-derived print.
        if let Some(ref new_id) = platform_id {
            let quick = Fingerprint::from_platform_id(new_id).to_string();
            for song in accepted {
                if let Some(ref stored) = song.fingerprint {
                    if fingerprints_match(stored, &quick) {
                        return Ok(duplicate(
                            MatchReason::SameFingerprint,
                            "This video is already submitted. Please choose a different song.",
                            song,
                        ));
                    }
                }
            }
        }

        // Stage 5: metadata match against accepted songs. Resolution failure
        // means the stage abstains, never that the check fails.
        let new_metadata = if url.is_empty() {
            None
        } else {
            self.resolver.resolve(url).await
        };

        if let Some(ref new_meta) = new_metadata {
            for song in accepted {
                if let Some(ref existing_meta) = song.metadata {
                    if metadata_matches(new_meta, existing_meta, &self.config) {
                        return Ok(duplicate(
                            MatchReason::MetadataMatch,
                            &format!(
                                "Same song detected: \"{}\" is already submitted.",
                                new_meta.normalized_title
                            ),
                            song,
                        ));
                    }
                }
            }
        }

        // Stage 6: platform identifier match against the caller's own
        // pending links; same rule as stage 3, different message.
        if let Some(ref new_id) = platform_id {
            for pending in pending_links {
                if extract_platform_id(pending).as_ref() == Some(new_id) {
                    return Ok(CandidateVerdict::Duplicate {
                        reason: MatchReason::SamePlatformId,
                        message: "This is the same video as one already in your list."
                            .to_string(),
                        matched_song: None,
                    });
                }
            }
        }

        // Stage 7: metadata match against pending links, pairwise.
        if let Some(ref new_meta) = new_metadata {
            for pending in pending_links {
                if let Some(pending_meta) = self.resolver.resolve(pending).await {
                    if metadata_matches(new_meta, &pending_meta, &self.config) {
                        return Ok(CandidateVerdict::Duplicate {
                            reason: MatchReason::MetadataMatch,
                            message: format!(
                                "Same song detected: \"{}\" is already in your list.",
                                new_meta.normalized_title
                            ),
                            matched_song: None,
                        });
                    }
                }
            }
        }

        // Stage 8: accept, returning the cheapest fingerprint available for
        // the caller to persist.
        let fingerprint = self.cheapest_fingerprint(candidate, platform_id.as_ref()).await;
        debug!("Candidate accepted with fingerprint {:?}", fingerprint);
        Ok(CandidateVerdict::Accepted { fingerprint })
    }

    /// Platform-id fingerprint when an identifier exists; for file-only
    /// candidates, an audio fingerprint if fpcalc is present, else a content
    /// hash of the uploaded bytes.
    async fn cheapest_fingerprint(
        &self,
        candidate: &Candidate,
        platform_id: Option<&super::video_id::PlatformId>,
    ) -> Option<String> {
        if let Some(id) = platform_id {
            return Some(Fingerprint::from_platform_id(id).to_string());
        }

        if let Some(ref file) = candidate.file {
            debug!("Fingerprinting uploaded file {}", file.file_name);
            let temp_path = std::env::temp_dir().join(format!("songdrop-upload-{}", uuid::Uuid::new_v4()));
            if tokio::fs::write(&temp_path, &file.bytes).await.is_ok() {
                let audio_fp = self.audio.fingerprint_file(&temp_path).await;
                let _ = tokio::fs::remove_file(&temp_path).await;
                if let Some(fp) = audio_fp {
                    return Some(fp.to_string());
                }
            }
            return Some(Fingerprint::from_file_bytes(&file.bytes).to_string());
        }

        None
    }

    /// Ad-hoc "are these the same song" comparison between two references.
    pub async fn compare_references(
        &self,
        link_a: &str,
        link_b: &str,
    ) -> Result<ComparisonOutcome, CheckError> {
        if link_a.is_empty() || link_b.is_empty() {
            return Err(CheckError::InvalidInput(
                "Please provide both song links".to_string(),
            ));
        }

        if link_a == link_b {
            return Ok(ComparisonOutcome {
                is_same: true,
                similarity: 100,
                reason: "exact_url",
                message: "These are the exact same link.".to_string(),
            });
        }

        let id_a = extract_platform_id(link_a);
        let id_b = extract_platform_id(link_b);
        if let (Some(a), Some(b)) = (&id_a, &id_b) {
            if a == b {
                return Ok(ComparisonOutcome {
                    is_same: true,
                    similarity: 100,
                    reason: "same_video",
                    message: "These links point to the same video.".to_string(),
                });
            }
        }

        let meta_a = self.resolver.resolve(link_a).await;
        let meta_b = self.resolver.resolve(link_b).await;
        if let (Some(a), Some(b)) = (&meta_a, &meta_b) {
            if metadata_matches(a, b, &self.config) {
                return Ok(ComparisonOutcome {
                    is_same: true,
                    similarity: 90,
                    reason: "metadata_match",
                    message:
                        "These appear to be the same song based on the video title and tags."
                            .to_string(),
                });
            }
        }

        if self.audio.available() {
            let fp_a = self.audio.fingerprint_url(link_a).await;
            let fp_b = self.audio.fingerprint_url(link_b).await;
            if let (Some(a), Some(b)) = (fp_a, fp_b) {
                if a.matches(&b) {
                    return Ok(ComparisonOutcome {
                        is_same: true,
                        similarity: 85,
                        reason: "audio_match",
                        message: "These songs have matching audio fingerprints.".to_string(),
                    });
                }
            }
        }

        Ok(ComparisonOutcome {
            is_same: false,
            similarity: 0,
            reason: "different",
            message: "These appear to be different songs.".to_string(),
        })
    }
}

fn duplicate(reason: MatchReason, message: &str, song: &AcceptedSong) -> CandidateVerdict {
    CandidateVerdict::Duplicate {
        reason,
        message: message.to_string(),
        matched_song: if song.song_name.is_empty() {
            None
        } else {
            Some(song.song_name.clone())
        },
    }
}
