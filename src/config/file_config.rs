use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub clip_cache_dir: Option<String>,

    // Feature configs
    pub matching: Option<MatchingFileConfig>,
    pub tools: Option<ToolsFileConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct MatchingFileConfig {
    pub word_overlap_threshold: Option<f64>,
    pub min_shared_tags: Option<usize>,
    pub min_shared_tag_len: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ToolsFileConfig {
    pub clip_seconds: Option<u32>,
    pub clip_cache_ttl_secs: Option<u64>,
    pub sweep_interval_secs: Option<u64>,
    pub oembed_timeout_secs: Option<u64>,
    pub details_timeout_secs: Option<u64>,
    pub clip_download_timeout_secs: Option<u64>,
    pub full_download_timeout_secs: Option<u64>,
    pub fingerprint_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
