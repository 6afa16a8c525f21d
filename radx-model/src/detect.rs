use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scan::Anomaly;

/// Body of `POST /detect`. Exactly one image source must be present:
/// a remote URL the server downloads, or inline base64 bytes (raw or a
/// `data:` URL). `timestamp` is chosen by the client and keys the job; it
/// also derives the deterministic output name `xray_<timestamp>.jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    pub timestamp: i64,
}

/// Immediate reply to `POST /detect`, sent before the external job finishes.
/// Both paths are URL paths under the static mounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub timestamp: i64,
    pub upload_path: String,
    pub processed_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionStatus {
    Pending,
    Done,
    Failed,
}

impl DetectionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DetectionStatus::Done | DetectionStatus::Failed)
    }
}

/// Job-board record served by `GET /detect/{timestamp}`.
///
/// `anomalies` is populated from the description file the external detector
/// writes; a failed or still-pending job reports an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionJob {
    pub timestamp: i64,
    pub status: DetectionStatus,
    pub upload_path: String,
    pub processed_path: String,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl DetectionJob {
    pub fn pending(timestamp: i64, upload_path: String, processed_path: String) -> Self {
        Self {
            timestamp,
            status: DetectionStatus::Pending,
            upload_path,
            processed_path,
            anomalies: Vec::new(),
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DetectionStatus::Pending).unwrap(),
            r#""pending""#
        );
        assert_eq!(
            serde_json::to_string(&DetectionStatus::Failed).unwrap(),
            r#""failed""#
        );
    }

    #[test]
    fn terminal_states() {
        assert!(!DetectionStatus::Pending.is_terminal());
        assert!(DetectionStatus::Done.is_terminal());
        assert!(DetectionStatus::Failed.is_terminal());
    }

    #[test]
    fn pending_job_has_no_completion() {
        let job = DetectionJob::pending(
            1700000000000,
            "/uploads/xray_1700000000000.jpg".into(),
            "/processed_images/xray_1700000000000.jpg".into(),
        );
        assert_eq!(job.status, DetectionStatus::Pending);
        assert!(job.completed_at.is_none());
        assert!(job.anomalies.is_empty());

        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["uploadPath"], "/uploads/xray_1700000000000.jpg");
        assert!(json.get("completedAt").is_none());
    }

    #[test]
    fn detect_request_accepts_either_source() {
        let by_url: DetectRequest = serde_json::from_str(
            r#"{"imageUrl": "http://x/scan.jpg", "timestamp": 42}"#,
        )
        .unwrap();
        assert_eq!(by_url.image_url.as_deref(), Some("http://x/scan.jpg"));
        assert!(by_url.image_data.is_none());

        let by_data: DetectRequest =
            serde_json::from_str(r#"{"imageData": "/9j/4A==", "timestamp": 42}"#).unwrap();
        assert!(by_data.image_url.is_none());
        assert_eq!(by_data.image_data.as_deref(), Some("/9j/4A=="));
    }
}
