use songdrop_server::matching::{
    AudioFingerprinter, DisabledMediaTools, DuplicateChecker, MatchingConfig, MediaTools,
    MetadataResolver,
};
use songdrop_server::server::{make_app, ServerConfig};
use songdrop_server::submission_store::SqliteSubmissionStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub struct TestServer {
    pub base_url: String,
    shutdown: CancellationToken,
    _temp_dir: TempDir,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(
            SqliteSubmissionStore::new(temp_dir.path().join("submissions.db")).unwrap(),
        );

        let tools: Arc<dyn MediaTools> = Arc::new(DisabledMediaTools);
        // Unroutable oEmbed base so metadata resolution abstains instantly.
        let resolver = Arc::new(MetadataResolver::with_oembed_base(
            tools.clone(),
            Duration::from_millis(200),
            "http://127.0.0.1:1/oembed".to_string(),
        ));
        let audio = Arc::new(AudioFingerprinter::new(
            tools,
            temp_dir.path().join("clips"),
        ));
        let checker = Arc::new(DuplicateChecker::new(
            resolver.clone(),
            audio,
            MatchingConfig::default(),
        ));

        let app = make_app(ServerConfig::default(), store, checker, resolver);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let shutdown = CancellationToken::new();
        let serve_shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(serve_shutdown.cancelled_owned())
                .await
                .unwrap();
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            shutdown,
            _temp_dir: temp_dir,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
