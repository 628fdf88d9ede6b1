use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
use config::{AppConfig, CliConfig, FileConfig};

mod jobs;

mod matching;
use matching::{AudioFingerprinter, MediaTools, MetadataResolver, SystemMediaTools};

mod server;
use server::{run_server, RequestsLoggingLevel, ServerConfig};

mod submission_store;
use submission_store::SqliteSubmissionStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite submissions database file.
    #[clap(value_parser = parse_path)]
    pub submissions_db: Option<PathBuf>,

    /// Path to a TOML config file. Values in it override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Directory for cached audio clips. Defaults to a temp directory.
    #[clap(long, value_parser = parse_path)]
    pub clip_cache_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_path: cli_args.submissions_db,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        clip_cache_dir: cli_args.clip_cache_dir,
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "Opening SQLite submissions database at {:?}...",
        app_config.db_path
    );
    let store = Arc::new(SqliteSubmissionStore::new(&app_config.db_path)?);

    tokio::fs::create_dir_all(&app_config.clip_cache_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create clip cache directory {:?}",
                app_config.clip_cache_dir
            )
        })?;

    info!("Probing external media tools...");
    let tools: Arc<dyn MediaTools> = Arc::new(
        SystemMediaTools::probe(app_config.tool_timeouts.clone(), app_config.clip_seconds).await,
    );

    let resolver = Arc::new(MetadataResolver::new(
        tools.clone(),
        app_config.oembed_timeout,
    ));
    let audio = Arc::new(AudioFingerprinter::new(
        tools,
        app_config.clip_cache_dir.clone(),
    ));

    let shutdown = CancellationToken::new();

    let sweeper = tokio::spawn(jobs::run_clip_cache_sweeper(
        app_config.clip_cache_dir.clone(),
        app_config.clip_cache_ttl,
        app_config.sweep_interval,
        shutdown.clone(),
    ));

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            ctrl_c_shutdown.cancel();
        }
    });

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
    };

    info!("Ready to serve at port {}!", app_config.port);
    run_server(
        server_config,
        store,
        resolver,
        audio,
        app_config.matching.clone(),
        shutdown.clone(),
    )
    .await?;

    shutdown.cancel();
    let _ = sweeper.await;

    Ok(())
}
