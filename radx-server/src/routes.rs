use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers::{detect, scans};
use crate::state::AppState;

/// Fixed request payload cap; base64 image bodies are the largest inputs.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub fn create_app(state: AppState) -> Router {
    let assets = &state.assets;
    Router::new()
        .route("/", get(scans::list_scans).post(scans::save_scan))
        .route("/ping", get(scans::ping))
        .route("/rename", post(scans::rename_scan))
        .route("/delete", post(scans::delete_scan))
        .route("/detect", post(detect::start_detection))
        .route("/detect/{timestamp}", get(detect::detection_status))
        .nest_service("/images", ServeDir::new(assets.scans_dir()))
        .nest_service("/processed_images", ServeDir::new(assets.processed_dir()))
        .nest_service("/uploads", ServeDir::new(assets.uploads_dir()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
