//! Detection endpoints: fire-and-forget job submission and the job-status
//! poll target.

use axum::{
    extract::{Path, State},
    response::Json,
};
use radx_core::image::ImageSource;
use radx_model::{DetectRequest, DetectResponse, DetectionJob};
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// `POST /detect`: stage the upload and the placeholder, then return
/// immediately; the external detector runs detached. The deterministic
/// output path holds a file by the time this responds.
pub async fn start_detection(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> AppResult<Json<DetectResponse>> {
    info!("Detection requested for timestamp {}", request.timestamp);
    let source = ImageSource::from_request(request.image_url, request.image_data)?;
    let response = state.launcher.launch(source, request.timestamp).await?;
    Ok(Json(response))
}

/// `GET /detect/{timestamp}`: the job-board record for one detection.
pub async fn detection_status(
    State(state): State<AppState>,
    Path(timestamp): Path<i64>,
) -> AppResult<Json<DetectionJob>> {
    state
        .launcher
        .jobs()
        .get(timestamp)
        .await
        .map(Json)
        .ok_or_else(|| {
            AppError::not_found(format!("no detection job for timestamp {timestamp}"))
        })
}
