//! Content-based audio fingerprinting.
//!
//! Downloads a short audio clip for a video, runs the fingerprint calculator
//! over it, and digests the raw output into a compact `audio:` fingerprint.
//! The clip is cached on disk keyed by video id so repeat checks for the same
//! video skip the download; a periodic sweep bounds disk usage.
//!
//! The whole pipeline is soft: if either external tool is missing or any
//! step fails, it yields `None` and the caller moves on.

use super::fingerprint::Fingerprint;
use super::tools::MediaTools;
use super::video_id::extract_platform_id;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub struct AudioFingerprinter {
    tools: Arc<dyn MediaTools>,
    cache_dir: PathBuf,
}

impl AudioFingerprinter {
    pub fn new(tools: Arc<dyn MediaTools>, cache_dir: PathBuf) -> Self {
        Self { tools, cache_dir }
    }

    /// Whether the pipeline can run at all on this host.
    pub fn available(&self) -> bool {
        self.tools.availability().audio_pipeline_available()
    }

    /// Compute an audio fingerprint for a video URL, or `None`.
    pub async fn fingerprint_url(&self, url: &str) -> Option<Fingerprint> {
        if !self.available() {
            return None;
        }

        let platform_id = extract_platform_id(url)?;
        let clip_path = self.clip_path(&platform_id.id);

        if !clip_path.exists() {
            if let Err(e) = self.tools.download_audio_clip(url, &clip_path).await {
                debug!("Audio clip download failed for {}: {}", url, e);
                return None;
            }
        }

        self.fingerprint_clip(&clip_path).await
    }

    /// Compute an audio fingerprint for a local audio file, or `None`.
    ///
    /// Only needs the fingerprint calculator, not the downloader.
    pub async fn fingerprint_file(&self, path: &Path) -> Option<Fingerprint> {
        if !self.tools.availability().fingerprinter {
            return None;
        }
        self.fingerprint_clip(path).await
    }

    async fn fingerprint_clip(&self, path: &Path) -> Option<Fingerprint> {
        match self.tools.raw_audio_fingerprint(path).await {
            Ok(raw) => Some(Fingerprint::from_raw_audio(&raw)),
            Err(e) => {
                debug!("Fingerprint calculation failed for {:?}: {}", path, e);
                None
            }
        }
    }

    fn clip_path(&self, video_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.mp3", video_id))
    }
}
