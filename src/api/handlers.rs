//! API request handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::{debug, info, warn};

use super::models::{
    ErrorResponse, FailureResponse, HealthResponse, TranscriptRequest, INVALID_URL_MESSAGE,
    MISSING_URL_MESSAGE,
};
use super::server::AppState;
use crate::extractors::validate_youtube_url;
use crate::TranscriptError;

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse::healthy()))
}

/// Transcript handler. Blocks until the pipeline succeeds or runs out of attempts.
pub async fn transcript_handler(
    State(state): State<AppState>,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected transcript request body: {}", rejection.body_text());
            return bad_request(MISSING_URL_MESSAGE);
        }
    };

    if validate_youtube_url(&request.url).is_err() {
        debug!("Rejected non-YouTube URL: {}", request.url);
        return bad_request(INVALID_URL_MESSAGE);
    }

    info!("Transcript requested for {}", request.url);

    match state.pipeline.fetch_transcript(&request.url).await {
        Ok(transcript) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            transcript.text,
        )
            .into_response(),
        Err(TranscriptError::InvalidUrl(_)) | Err(TranscriptError::MissingUrl) => {
            bad_request(INVALID_URL_MESSAGE)
        }
        Err(e) => {
            warn!("Returning 503 for {}: {}", request.url, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(FailureResponse::extraction_failed()),
            )
                .into_response()
        }
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}
