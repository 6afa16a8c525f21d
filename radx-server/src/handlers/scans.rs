//! Scan history endpoints: list, save, rename, delete, plus the health
//! probe.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::{extract::State, response::Json};
use radx_core::assets::{IMAGES_MOUNT, basename_for_url};
use radx_core::image::ImageSource;
use radx_model::{Anomaly, DeleteRequest, RenameRequest, SaveScanRequest, ScanRecord};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Distinguishes synthesized names for sources that carry no usable file
/// name (inline `data:` payloads).
static FALLBACK_SEQ: AtomicU64 = AtomicU64::new(0);

pub async fn ping() -> Json<Value> {
    info!("Ping endpoint called");
    Json(json!({
        "status": "ok",
        "message": "radx server is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// `GET /`: the full history as a bare JSON array, most-recent-first.
/// Store read failures degrade to an empty array inside the store.
pub async fn list_scans(State(state): State<AppState>) -> Json<Vec<ScanRecord>> {
    Json(state.store.list().await)
}

/// `POST /`: download/decode the image, persist it under the scans
/// directory, and prepend the record to the history with its `imageUrl`
/// rewritten to the public static mount.
pub async fn save_scan(
    State(state): State<AppState>,
    Json(request): Json<SaveScanRequest>,
) -> AppResult<Json<Value>> {
    let image_url = request
        .image_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Image URL is required"))?;

    let filename = basename_for_url(&image_url).unwrap_or_else(|| {
        format!(
            "scan_{}_{}.jpg",
            chrono::Utc::now().timestamp_millis(),
            FALLBACK_SEQ.fetch_add(1, Ordering::Relaxed)
        )
    });

    let bytes = ImageSource::Url(image_url.clone()).fetch(&state.client).await?;
    let save_path = state.assets.scans_dir().join(&filename);
    tokio::fs::write(&save_path, &bytes)
        .await
        .map_err(|e| AppError::internal(format!("Error saving image: {e}")))?;
    info!("Image saved to {}", save_path.display());

    let constructed_url =
        format!("{}{}/{}", state.public_base_url, IMAGES_MOUNT, filename);
    let anomalies = Anomaly::normalize_list(request.anomalies);
    state
        .store
        .save(ScanRecord::new(constructed_url.clone(), anomalies))
        .await;

    Ok(Json(json!({
        "status": "success",
        "message": "Image saved successfully",
        "imageUrl": constructed_url
    })))
}

/// `POST /rename`: rewrite the stored `imageUrl` of matching records.
/// Metadata only; the file on disk keeps its name.
pub async fn rename_scan(
    State(state): State<AppState>,
    Json(request): Json<RenameRequest>,
) -> Json<Value> {
    let matched = state
        .store
        .rename(&request.image_url, &request.new_image_url)
        .await;
    if matched == 0 {
        warn!("Rename matched no records for {}", request.image_url);
    } else {
        info!(
            "Renamed {} record(s): {} -> {}",
            matched, request.image_url, request.new_image_url
        );
    }
    Json(json!({ "status": "success", "matched": matched }))
}

/// `POST /delete`: drop matching records. Metadata only; the file on disk
/// is left in place.
pub async fn delete_scan(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Json<Value> {
    let matched = state.store.remove(&request.image_url).await;
    if matched == 0 {
        warn!("Delete matched no records for {}", request.image_url);
    } else {
        info!("Deleted {} record(s) for {}", matched, request.image_url);
    }
    Json(json!({ "status": "success", "matched": matched }))
}
