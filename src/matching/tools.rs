//! Soft external tool capabilities: media downloader and audio fingerprint
//! calculator (yt-dlp and fpcalc).
//!
//! Both tools are optional on the host. Availability is probed once at
//! process start; every caller takes the capability as an injected
//! `Arc<dyn MediaTools>` so tests can simulate a missing tool
//! deterministically. A missing tool degrades match thoroughness, it never
//! fails a check.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Errors from external tool invocations.
///
/// Call sites convert all of these to "stage abstained"; they only surface
/// in logs.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0} is not available on this host")]
    NotAvailable(&'static str),

    #[error("{tool} failed: {stderr}")]
    Failed { tool: &'static str, stderr: String },

    #[error("{0} timed out")]
    TimedOut(&'static str),

    #[error("invalid tool output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which external tools the host has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolAvailability {
    pub downloader: bool,
    pub fingerprinter: bool,
}

impl ToolAvailability {
    pub fn audio_pipeline_available(&self) -> bool {
        self.downloader && self.fingerprinter
    }
}

/// Full video details from the slow metadata path (`yt-dlp --dump-json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoDetails {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub uploader: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Injected capability seam for the external tools.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Availability snapshot taken at process start.
    fn availability(&self) -> ToolAvailability;

    /// Fetch full video details (title, description, tags). Slow path.
    async fn fetch_video_details(&self, url: &str) -> Result<VideoDetails, ToolError>;

    /// Download a bounded-duration audio clip for a video URL to `dest`.
    async fn download_audio_clip(&self, url: &str, dest: &Path) -> Result<(), ToolError>;

    /// Run the fingerprint calculator over an audio file and return the raw
    /// fingerprint string.
    async fn raw_audio_fingerprint(&self, audio_path: &Path) -> Result<String, ToolError>;
}

/// Timeouts for the external tool invocations.
#[derive(Debug, Clone)]
pub struct ToolTimeouts {
    pub details_fetch: Duration,
    pub clip_download: Duration,
    /// Longer timeout for the fallback full download when section download
    /// is unsupported by the video.
    pub full_download: Duration,
    pub fingerprint: Duration,
}

impl Default for ToolTimeouts {
    fn default() -> Self {
        Self {
            details_fetch: Duration::from_secs(30),
            clip_download: Duration::from_secs(60),
            full_download: Duration::from_secs(120),
            fingerprint: Duration::from_secs(30),
        }
    }
}

/// Real implementation shelling out to yt-dlp and fpcalc.
pub struct SystemMediaTools {
    availability: ToolAvailability,
    timeouts: ToolTimeouts,
    clip_seconds: u32,
}

impl SystemMediaTools {
    /// Probe the host for yt-dlp and fpcalc and build the capability.
    pub async fn probe(timeouts: ToolTimeouts, clip_seconds: u32) -> Self {
        let downloader = probe_tool("yt-dlp", "--version").await;
        let fingerprinter = probe_tool("fpcalc", "-version").await;

        if downloader {
            info!("yt-dlp available, slow metadata path and audio download enabled");
        } else {
            warn!("yt-dlp not found, slow metadata path and audio download disabled");
        }
        if fingerprinter {
            info!("fpcalc available, audio fingerprinting enabled");
        } else {
            warn!("fpcalc not found, audio fingerprinting disabled");
        }

        Self {
            availability: ToolAvailability {
                downloader,
                fingerprinter,
            },
            timeouts,
            clip_seconds,
        }
    }
}

async fn probe_tool(binary: &str, version_arg: &str) -> bool {
    let status = Command::new(binary)
        .arg(version_arg)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    matches!(status, Ok(s) if s.success())
}

async fn run_with_timeout(
    mut command: Command,
    tool: &'static str,
    timeout: Duration,
) -> Result<std::process::Output, ToolError> {
    command.stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| ToolError::TimedOut(tool))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ToolError::Failed { tool, stderr });
    }

    Ok(output)
}

#[async_trait]
impl MediaTools for SystemMediaTools {
    fn availability(&self) -> ToolAvailability {
        self.availability
    }

    async fn fetch_video_details(&self, url: &str) -> Result<VideoDetails, ToolError> {
        if !self.availability.downloader {
            return Err(ToolError::NotAvailable("yt-dlp"));
        }

        let mut command = Command::new("yt-dlp");
        command.args(["--dump-json", "--no-download"]).arg(url);

        let output = run_with_timeout(command, "yt-dlp", self.timeouts.details_fetch).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout)
            .map_err(|e| ToolError::InvalidOutput(format!("JSON parse error: {}", e)))
    }

    async fn download_audio_clip(&self, url: &str, dest: &Path) -> Result<(), ToolError> {
        if !self.availability.downloader {
            return Err(ToolError::NotAvailable("yt-dlp"));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let dest_str = dest.to_str().ok_or_else(|| {
            ToolError::InvalidOutput(format!("non-UTF8 clip path: {:?}", dest))
        })?;
        let section = format!("*0:00-0:{:02}", self.clip_seconds.min(59));

        let mut command = Command::new("yt-dlp");
        command
            .args(["-x", "--audio-format", "mp3", "--audio-quality", "5"])
            .args(["-o", dest_str, "--no-playlist"])
            .args(["--download-sections", &section])
            .arg(url);

        match run_with_timeout(command, "yt-dlp", self.timeouts.clip_download).await {
            Ok(_) if dest.exists() => return Ok(()),
            Ok(_) => {}
            Err(e) => debug!("Section download failed, retrying full download: {}", e),
        }

        // Some videos don't support section downloads; fetch the whole audio.
        let mut command = Command::new("yt-dlp");
        command
            .args(["-x", "--audio-format", "mp3", "--audio-quality", "5"])
            .args(["-o", dest_str, "--no-playlist"])
            .arg(url);

        run_with_timeout(command, "yt-dlp", self.timeouts.full_download).await?;

        if dest.exists() {
            Ok(())
        } else {
            Err(ToolError::InvalidOutput(
                "yt-dlp reported success but produced no file".to_string(),
            ))
        }
    }

    async fn raw_audio_fingerprint(&self, audio_path: &Path) -> Result<String, ToolError> {
        if !self.availability.fingerprinter {
            return Err(ToolError::NotAvailable("fpcalc"));
        }

        let length = self.clip_seconds.to_string();
        let mut command = Command::new("fpcalc");
        command.args(["-raw", "-length", &length]).arg(audio_path);

        let output = run_with_timeout(command, "fpcalc", self.timeouts.fingerprint).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        stdout
            .lines()
            .find_map(|line| line.strip_prefix("FINGERPRINT="))
            .map(|fp| fp.trim().to_string())
            .filter(|fp| !fp.is_empty())
            .ok_or_else(|| {
                ToolError::InvalidOutput("no FINGERPRINT line in fpcalc output".to_string())
            })
    }
}

/// No-op capability used when the host has neither tool, and in tests.
#[derive(Debug, Default)]
pub struct DisabledMediaTools;

#[async_trait]
impl MediaTools for DisabledMediaTools {
    fn availability(&self) -> ToolAvailability {
        ToolAvailability::default()
    }

    async fn fetch_video_details(&self, _url: &str) -> Result<VideoDetails, ToolError> {
        Err(ToolError::NotAvailable("yt-dlp"))
    }

    async fn download_audio_clip(&self, _url: &str, _dest: &Path) -> Result<(), ToolError> {
        Err(ToolError::NotAvailable("yt-dlp"))
    }

    async fn raw_audio_fingerprint(&self, _audio_path: &Path) -> Result<String, ToolError> {
        Err(ToolError::NotAvailable("fpcalc"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_tools_report_nothing_available() {
        let tools = DisabledMediaTools;
        assert!(!tools.availability().downloader);
        assert!(!tools.availability().fingerprinter);
        assert!(!tools.availability().audio_pipeline_available());
    }

    #[tokio::test]
    async fn disabled_tools_return_not_available() {
        let tools = DisabledMediaTools;
        assert!(matches!(
            tools.fetch_video_details("https://youtu.be/abc").await,
            Err(ToolError::NotAvailable(_))
        ));
        assert!(matches!(
            tools.raw_audio_fingerprint(Path::new("/tmp/x.mp3")).await,
            Err(ToolError::NotAvailable(_))
        ));
    }

    #[test]
    fn audio_pipeline_needs_both_tools() {
        let only_downloader = ToolAvailability {
            downloader: true,
            fingerprinter: false,
        };
        assert!(!only_downloader.audio_pipeline_available());

        let both = ToolAvailability {
            downloader: true,
            fingerprinter: true,
        };
        assert!(both.audio_pipeline_available());
    }
}
