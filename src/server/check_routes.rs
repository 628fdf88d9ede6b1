//! Duplicate check endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::state::{GuardedChecker, GuardedSubmissionStore, ServerState};
use crate::matching::{Candidate, CandidateVerdict, CheckError, UploadedFile};

#[derive(Deserialize, Debug)]
pub struct CheckSongBody {
    pub store_code: String,
    pub url: Option<String>,
    pub file_name: Option<String>,
    /// Base64-encoded audio file content.
    pub file_data: Option<String>,
    #[serde(default)]
    pub pending_links: Vec<String>,
}

#[derive(Serialize)]
pub struct CheckSongResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_song: Option<String>,
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct CompareSongsBody {
    #[serde(default)]
    pub link_a: String,
    #[serde(default)]
    pub link_b: String,
}

#[derive(Serialize)]
pub struct CompareSongsResponse {
    pub is_same: bool,
    pub similarity: u8,
    pub reason: &'static str,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

pub fn check_error_response(err: CheckError) -> Response {
    match err {
        CheckError::InvalidInput(message) => error_response(StatusCode::BAD_REQUEST, message),
        CheckError::PreFilter(e) => {
            error!("Content pre-filter failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to verify the song link, please try again",
            )
        }
    }
}

pub fn decode_file(
    file_name: Option<String>,
    file_data: Option<String>,
) -> Result<Option<UploadedFile>, Response> {
    let Some(data) = file_data else {
        return Ok(None);
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data.as_bytes())
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "file_data is not valid base64"))?;
    Ok(Some(UploadedFile {
        file_name: file_name.unwrap_or_else(|| "upload".to_string()),
        bytes,
    }))
}

async fn check_song(
    State(store): State<GuardedSubmissionStore>,
    State(checker): State<GuardedChecker>,
    Json(body): Json<CheckSongBody>,
) -> Response {
    if body.store_code.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "store_code is required");
    }

    let file = match decode_file(body.file_name, body.file_data) {
        Ok(file) => file,
        Err(response) => return response,
    };
    let candidate = Candidate {
        url: body.url.filter(|u| !u.trim().is_empty()),
        file,
    };

    let accepted_songs = match store.accepted_songs(&body.store_code) {
        Ok(songs) => songs,
        Err(e) => {
            error!("Failed to load accepted songs for {}: {}", body.store_code, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    match checker
        .check_candidate(&candidate, &accepted_songs, &body.pending_links)
        .await
    {
        Ok(CandidateVerdict::Accepted { fingerprint }) => Json(CheckSongResponse {
            accepted: true,
            fingerprint,
            reason: None,
            matched_song: None,
            message: "Song accepted".to_string(),
        })
        .into_response(),
        Ok(CandidateVerdict::NotMusic { message }) => Json(CheckSongResponse {
            accepted: false,
            fingerprint: None,
            reason: Some("not_music"),
            matched_song: None,
            message,
        })
        .into_response(),
        Ok(CandidateVerdict::Duplicate {
            reason,
            message,
            matched_song,
        }) => Json(CheckSongResponse {
            accepted: false,
            fingerprint: None,
            reason: Some(reason.code()),
            matched_song,
            message,
        })
        .into_response(),
        Err(e) => check_error_response(e),
    }
}

async fn compare_songs(
    State(checker): State<GuardedChecker>,
    Json(body): Json<CompareSongsBody>,
) -> Response {
    match checker.compare_references(&body.link_a, &body.link_b).await {
        Ok(outcome) => Json(CompareSongsResponse {
            is_same: outcome.is_same,
            similarity: outcome.similarity,
            reason: outcome.reason,
            message: outcome.message,
        })
        .into_response(),
        Err(e) => check_error_response(e),
    }
}

pub fn make_check_routes(state: ServerState) -> Router {
    Router::new()
        .route("/check-song", post(check_song))
        .route("/compare-songs", post(compare_songs))
        .with_state(state)
}
