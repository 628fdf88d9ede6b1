use anyhow::Result;
use std::time::{Duration, Instant};

use tracing::info;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::check_routes::make_check_routes;
use super::submission_routes::make_submission_routes;
use super::{log_requests, state::*, ServerConfig};
use crate::matching::{AudioFingerprinter, DuplicateChecker, MetadataResolver};
use std::sync::Arc;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

pub fn make_app(
    config: ServerConfig,
    store: GuardedSubmissionStore,
    checker: Arc<DuplicateChecker>,
    resolver: Arc<MetadataResolver>,
) -> Router {
    let state = ServerState {
        config,
        start_time: Instant::now(),
        store,
        checker,
        resolver,
        hash: env!("GIT_HASH").to_string(),
    };

    let api_routes = make_check_routes(state.clone()).merge(make_submission_routes(state.clone()));

    Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/v1", api_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

#[allow(clippy::too_many_arguments)]
pub async fn run_server(
    config: ServerConfig,
    store: GuardedSubmissionStore,
    resolver: Arc<MetadataResolver>,
    audio: Arc<AudioFingerprinter>,
    matching_config: crate::matching::MatchingConfig,
    shutdown: CancellationToken,
) -> Result<()> {
    let port = config.port;
    let checker = Arc::new(DuplicateChecker::new(
        resolver.clone(),
        audio,
        matching_config,
    ));
    let app = make_app(config, store, checker, resolver);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on port {}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{DisabledMediaTools, MatchingConfig, MediaTools};
    use crate::submission_store::SqliteSubmissionStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app(temp: &TempDir) -> Router {
        let store: GuardedSubmissionStore = Arc::new(SqliteSubmissionStore::in_memory().unwrap());
        let tools: Arc<dyn MediaTools> = Arc::new(DisabledMediaTools);
        // Unroutable oEmbed base so nothing touches the network.
        let resolver = Arc::new(MetadataResolver::with_oembed_base(
            tools.clone(),
            Duration::from_millis(200),
            "http://127.0.0.1:1/oembed".to_string(),
        ));
        let audio = Arc::new(AudioFingerprinter::new(tools, temp.path().to_path_buf()));
        let checker = Arc::new(DuplicateChecker::new(
            resolver.clone(),
            audio,
            MatchingConfig::default(),
        ));
        make_app(ServerConfig::default(), store, checker, resolver)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn home_reports_uptime_and_hash() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert!(body["uptime"].is_string());
        assert!(body["hash"].is_string());
    }

    #[tokio::test]
    async fn check_song_requires_store_code() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let response = app
            .oneshot(post_json(
                "/v1/check-song",
                json!({"store_code": "", "url": "https://youtu.be/a1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn check_song_requires_link_or_file() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let response = app
            .oneshot(post_json("/v1/check-song", json!({"store_code": "MUM01"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn fresh_song_is_accepted_with_fingerprint() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let response = app
            .oneshot(post_json(
                "/v1/check-song",
                json!({"store_code": "MUM01", "url": "https://youtu.be/FRESH42"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["accepted"], json!(true));
        assert_eq!(body["fingerprint"], json!("yt:FRESH42"));
    }

    #[tokio::test]
    async fn submitted_song_is_flagged_on_next_check() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/submissions",
                json!({
                    "store_code": "MUM01",
                    "submitter_name": "Asha",
                    "songs": [{"name": "Tum Hi Ho", "url": "https://youtu.be/ABC123"}]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // Exact same link
        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/check-song",
                json!({"store_code": "MUM01", "url": "https://youtu.be/ABC123"}),
            ))
            .await
            .unwrap();
        let body = response_json(response).await;
        assert_eq!(body["accepted"], json!(false));
        assert_eq!(body["reason"], json!("exact_url"));

        // Same video behind a different URL form
        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/check-song",
                json!({"store_code": "MUM01", "url": "https://www.youtube.com/watch?v=ABC123"}),
            ))
            .await
            .unwrap();
        let body = response_json(response).await;
        assert_eq!(body["accepted"], json!(false));
        assert_eq!(body["reason"], json!("same_platform_id"));

        // A different store is unaffected
        let response = app
            .oneshot(post_json(
                "/v1/check-song",
                json!({"store_code": "DEL02", "url": "https://youtu.be/ABC123"}),
            ))
            .await
            .unwrap();
        let body = response_json(response).await;
        assert_eq!(body["accepted"], json!(true));
    }

    #[tokio::test]
    async fn duplicate_submission_is_a_conflict() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let submit = || {
            post_json(
                "/v1/submissions",
                json!({
                    "store_code": "MUM01",
                    "songs": [{"name": "Kabira", "url": "https://youtu.be/KAB1"}]
                }),
            )
        };

        let response = app.clone().oneshot(submit()).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.oneshot(submit()).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn submission_rejects_in_payload_duplicates() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let response = app
            .oneshot(post_json(
                "/v1/submissions",
                json!({
                    "store_code": "MUM01",
                    "songs": [
                        {"name": "Kabira", "url": "https://youtu.be/KAB1"},
                        {"name": "Kabira again", "url": "https://www.youtube.com/watch?v=KAB1"}
                    ]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn list_submissions_round_trip() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/v1/submissions/MUM01")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await, json!([]));

        app.clone()
            .oneshot(post_json(
                "/v1/submissions",
                json!({
                    "store_code": "MUM01",
                    "songs": [{"name": "Kabira", "url": "https://youtu.be/KAB1"}]
                }),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/submissions/MUM01")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = response_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["songs"][0]["name"], json!("Kabira"));
        assert_eq!(body[0]["songs"][0]["fingerprint"], json!("yt:KAB1"));
    }

    #[tokio::test]
    async fn compare_songs_identical_links() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let response = app
            .oneshot(post_json(
                "/v1/compare-songs",
                json!({"link_a": "https://youtu.be/A1", "link_b": "https://youtu.be/A1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["is_same"], json!(true));
        assert_eq!(body["similarity"], json!(100));
        assert_eq!(body["reason"], json!("exact_url"));
    }

    #[tokio::test]
    async fn compare_songs_requires_both_links() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let response = app
            .oneshot(post_json(
                "/v1/compare-songs",
                json!({"link_a": "https://youtu.be/A1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_base64_file_data_is_rejected() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let response = app
            .oneshot(post_json(
                "/v1/check-song",
                json!({"store_code": "MUM01", "file_name": "x.mp3", "file_data": "%%%"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
