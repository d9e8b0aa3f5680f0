//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests for interview results.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    models::{ErrorResponse, InterviewResult},
    state::AppState,
};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
        }
    }
}

/// Get the result of a completed interview.
///
/// Only sessions that finished normally have a result; cancelled sessions
/// and interviews still in progress return 404.
#[utoipa::path(
    get,
    path = "/sessions/{id}/result",
    responses(
        (status = 200, description = "Interview result", body = InterviewResult),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 404, description = "No completed interview with this id", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Session ID returned in the `initialized` WebSocket message")
    )
)]
pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<InterviewResult>, ApiError> {
    let session_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("'{}' is not a valid session id", id)))?;

    let result = state
        .results
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("No result for session '{}'", session_id)))?;

    Ok(Json(result))
}
