//! Metadata resolution for song URLs.
//!
//! Two paths, in cost order:
//! 1. unauthenticated oEmbed title lookup (instant, no external tools)
//! 2. full detail fetch via the downloader tool (slow, tool-gated)
//!
//! Either path can fail; resolution then yields `None`. Callers must treat
//! `None` as "no opinion", never as a duplicate verdict either way.

use super::metadata::SongMetadata;
use super::tools::{MediaTools, ToolError, VideoDetails};
use super::video_id::{extract_platform_id, PlatformId};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_OEMBED_BASE: &str = "https://www.youtube.com/oembed";

/// Videos longer than this are assumed not to be a single song.
const MAX_SONG_DURATION_SECS: f64 = 15.0 * 60.0;

/// Outcome of the not-a-music-video pre-filter.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentClass {
    Music,
    NotMusic { reason: String },
    /// No signal either way; the pre-filter abstains and the check proceeds.
    Unknown,
}

#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: Option<String>,
}

/// Resolves song metadata for media URLs.
pub struct MetadataResolver {
    http: reqwest::Client,
    oembed_base: String,
    tools: Arc<dyn MediaTools>,
}

impl MetadataResolver {
    pub fn new(tools: Arc<dyn MediaTools>, fast_timeout: Duration) -> Self {
        Self::with_oembed_base(tools, fast_timeout, DEFAULT_OEMBED_BASE.to_string())
    }

    /// Override the oEmbed endpoint, used by tests to avoid network access.
    pub fn with_oembed_base(
        tools: Arc<dyn MediaTools>,
        fast_timeout: Duration,
        oembed_base: String,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(fast_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            oembed_base: oembed_base.trim_end_matches('/').to_string(),
            tools,
        }
    }

    /// Resolve metadata for a URL, or `None` when nothing could be fetched.
    ///
    /// Never returns an error: a failing lookup is an abstaining lookup.
    pub async fn resolve(&self, url: &str) -> Option<SongMetadata> {
        let platform_id = extract_platform_id(url)?;

        if let Some(title) = self.fetch_title_fast(&platform_id).await {
            return Some(SongMetadata::from_title(&title));
        }

        match self.tools.fetch_video_details(url).await {
            Ok(details) => Some(SongMetadata::from_details(
                &details.title,
                &details.description,
                &details.tags,
            )),
            Err(e) => {
                debug!("Metadata resolution failed for {}: {}", url, e);
                None
            }
        }
    }

    /// Title-only lookup via the public oEmbed endpoint.
    async fn fetch_title_fast(&self, platform_id: &PlatformId) -> Option<String> {
        let watch_url = format!("https://www.youtube.com/watch?v={}", platform_id.id);
        let oembed_url = format!(
            "{}?url={}&format=json",
            self.oembed_base,
            urlencoding::encode(&watch_url)
        );

        let response = match self.http.get(&oembed_url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("oEmbed request failed for {}: {}", platform_id.id, e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(
                "oEmbed lookup for {} returned status {}",
                platform_id.id,
                response.status()
            );
            return None;
        }

        match response.json::<OembedResponse>().await {
            Ok(body) => body.title.filter(|t| !t.is_empty()),
            Err(e) => {
                debug!("oEmbed response parse failed: {}", e);
                None
            }
        }
    }

    /// Classify whether a video-platform URL points at music at all.
    ///
    /// A missing or timed-out tool makes the pre-filter abstain; a tool that
    /// is present but breaks outright is surfaced to the caller, since a
    /// broken pre-filter should fail the check loudly rather than wave
    /// everything through.
    pub async fn classify_content(&self, url: &str) -> Result<ContentClass, ToolError> {
        if extract_platform_id(url).is_none() {
            return Ok(ContentClass::Unknown);
        }

        match self.tools.fetch_video_details(url).await {
            Ok(details) => Ok(classify_details(&details)),
            Err(ToolError::NotAvailable(_)) | Err(ToolError::TimedOut(_)) => {
                Ok(ContentClass::Unknown)
            }
            Err(e) => Err(e),
        }
    }
}

/// Duration/category heuristic for the pre-filter.
fn classify_details(details: &VideoDetails) -> ContentClass {
    let categories: Vec<String> = details
        .categories
        .iter()
        .map(|c| c.to_lowercase())
        .collect();

    if categories.iter().any(|c| c.contains("music")) {
        return ContentClass::Music;
    }

    if let Some(duration) = details.duration {
        if duration > MAX_SONG_DURATION_SECS {
            return ContentClass::NotMusic {
                reason: format!(
                    "The video is {} minutes long, much longer than a typical song",
                    (duration / 60.0).round() as u64
                ),
            };
        }
    }

    if !categories.is_empty() {
        return ContentClass::NotMusic {
            reason: format!("The video is categorized as \"{}\"", categories.join(", ")),
        };
    }

    let tags_mention_music = details
        .tags
        .iter()
        .any(|t| t.to_lowercase().contains("music") || t.to_lowercase().contains("song"));
    if tags_mention_music {
        return ContentClass::Music;
    }

    ContentClass::Unknown
}
