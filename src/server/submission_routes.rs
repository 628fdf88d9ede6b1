//! Submission accept and listing endpoints.
//!
//! Accepting a submission re-runs the duplicate cascade for every song in
//! the payload, with the earlier songs of the same payload acting as the
//! pending links. Nothing is persisted unless every song passes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::check_routes::{check_error_response, decode_file, error_response};
use super::state::ServerState;
use crate::matching::{Candidate, CandidateVerdict};
use crate::submission_store::{StoredSong, Submission};

#[derive(Deserialize, Debug)]
pub struct SubmitSongBody {
    pub name: String,
    pub url: Option<String>,
    pub file_name: Option<String>,
    pub file_data: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SubmitBody {
    pub store_code: String,
    pub submitter_name: Option<String>,
    pub songs: Vec<SubmitSongBody>,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub id: String,
    pub accepted_songs: usize,
}

async fn post_submission(
    State(state): State<ServerState>,
    Json(body): Json<SubmitBody>,
) -> Response {
    if body.store_code.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "store_code is required");
    }
    if body.songs.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "At least one song is required");
    }

    let accepted_songs = match state.store.accepted_songs(&body.store_code) {
        Ok(songs) => songs,
        Err(e) => {
            error!("Failed to load accepted songs for {}: {}", body.store_code, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    let mut checked: Vec<StoredSong> = Vec::with_capacity(body.songs.len());
    let mut pending_links: Vec<String> = Vec::new();

    for song in body.songs {
        if song.name.trim().is_empty() {
            return error_response(StatusCode::BAD_REQUEST, "Every song needs a name");
        }

        let file = match decode_file(song.file_name, song.file_data) {
            Ok(file) => file,
            Err(response) => return response,
        };
        let url = song.url.filter(|u| !u.trim().is_empty());
        let candidate = Candidate {
            url: url.clone(),
            file,
        };

        let verdict = match state
            .checker
            .check_candidate(&candidate, &accepted_songs, &pending_links)
            .await
        {
            Ok(verdict) => verdict,
            Err(e) => return check_error_response(e),
        };

        let fingerprint = match verdict {
            CandidateVerdict::Accepted { fingerprint } => fingerprint,
            CandidateVerdict::NotMusic { message } => {
                return error_response(StatusCode::BAD_REQUEST, message)
            }
            CandidateVerdict::Duplicate { message, .. } => {
                return error_response(StatusCode::CONFLICT, message)
            }
        };

        let metadata = match &url {
            Some(u) => state.resolver.resolve(u).await,
            None => None,
        };

        if let Some(u) = &url {
            pending_links.push(u.clone());
        }
        checked.push(StoredSong {
            name: song.name,
            url,
            fingerprint,
            metadata,
        });
    }

    let submission = Submission::new(body.store_code, body.submitter_name, checked);
    if let Err(e) = state.store.insert_submission(&submission) {
        error!("Failed to persist submission: {}", e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    }

    info!(
        "Accepted submission {} for store {} with {} songs",
        submission.id,
        submission.store_code,
        submission.songs.len()
    );

    (
        StatusCode::CREATED,
        Json(SubmitResponse {
            id: submission.id,
            accepted_songs: submission.songs.len(),
        }),
    )
        .into_response()
}

async fn list_submissions(
    State(state): State<ServerState>,
    Path(store_code): Path<String>,
) -> Response {
    match state.store.list_submissions(&store_code) {
        Ok(submissions) => Json(submissions).into_response(),
        Err(e) => {
            error!("Failed to list submissions for {}: {}", store_code, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

pub fn make_submission_routes(state: ServerState) -> Router {
    Router::new()
        .route("/submissions", post(post_submission))
        .route("/submissions/{store_code}", get(list_submissions))
        .with_state(state)
}
