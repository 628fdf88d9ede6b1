mod file_config;

pub use file_config::{FileConfig, MatchingFileConfig, ToolsFileConfig};

use crate::matching::{MatchingConfig, ToolTimeouts};
use crate::server::RequestsLoggingLevel;
use anyhow::Result;
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub clip_cache_dir: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            port: 3000,
            logging_level: RequestsLoggingLevel::default(),
            clip_cache_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub clip_cache_dir: PathBuf,

    // Audio pipeline settings
    pub clip_seconds: u32,
    pub clip_cache_ttl: Duration,
    pub sweep_interval: Duration,
    pub oembed_timeout: Duration,
    pub tool_timeouts: ToolTimeouts,

    pub matching: MatchingConfig,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via the CLI or in the config file")
            })?;

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let clip_cache_dir = file
            .clip_cache_dir
            .map(PathBuf::from)
            .or_else(|| cli.clip_cache_dir.clone())
            .unwrap_or_else(|| std::env::temp_dir().join("songdrop-clips"));

        let matching_file = file.matching.unwrap_or_default();
        let matching_defaults = MatchingConfig::default();
        let matching = MatchingConfig {
            word_overlap_threshold: matching_file
                .word_overlap_threshold
                .unwrap_or(matching_defaults.word_overlap_threshold),
            min_shared_tags: matching_file
                .min_shared_tags
                .unwrap_or(matching_defaults.min_shared_tags),
            min_shared_tag_len: matching_file
                .min_shared_tag_len
                .unwrap_or(matching_defaults.min_shared_tag_len),
        };

        let tools = file.tools.unwrap_or_default();
        let timeout_defaults = ToolTimeouts::default();
        let tool_timeouts = ToolTimeouts {
            details_fetch: tools
                .details_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(timeout_defaults.details_fetch),
            clip_download: tools
                .clip_download_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(timeout_defaults.clip_download),
            full_download: tools
                .full_download_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(timeout_defaults.full_download),
            fingerprint: tools
                .fingerprint_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(timeout_defaults.fingerprint),
        };

        Ok(Self {
            db_path,
            port,
            logging_level,
            clip_cache_dir,
            clip_seconds: tools.clip_seconds.unwrap_or(30),
            clip_cache_ttl: Duration::from_secs(tools.clip_cache_ttl_secs.unwrap_or(3600)),
            sweep_interval: Duration::from_secs(tools.sweep_interval_secs.unwrap_or(600)),
            oembed_timeout: Duration::from_secs(tools.oembed_timeout_secs.unwrap_or(5)),
            tool_timeouts,
            matching,
        })
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
