//! Background maintenance tasks.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Delete cached audio clips older than `ttl`. Returns how many were removed.
pub fn sweep_clip_cache(cache_dir: &Path, ttl: Duration) -> Result<usize> {
    if !cache_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(cache_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok());

        match age {
            Some(age) if age >= ttl => match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed expired clip {:?}", path);
                    removed += 1;
                }
                Err(e) => error!("Failed to remove expired clip {:?}: {}", path, e),
            },
            // Unreadable mtime, leave the file for a later sweep.
            _ => {}
        }
    }

    Ok(removed)
}

/// Periodically sweep the clip cache until shutdown is requested.
pub async fn run_clip_cache_sweeper(
    cache_dir: PathBuf,
    ttl: Duration,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);

    // Skip the first immediate tick, wait for the first interval
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Clip cache sweeper shutting down");
                return;
            }
            _ = ticker.tick() => {
                match sweep_clip_cache(&cache_dir, ttl) {
                    Ok(count) if count > 0 => info!("Removed {} expired audio clips", count),
                    Ok(_) => {}
                    Err(e) => error!("Clip cache sweep failed: {}", e),
                }
            }
        }
    }
}
