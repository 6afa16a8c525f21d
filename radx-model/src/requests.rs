use serde::{Deserialize, Serialize};

use crate::scan::Anomaly;

/// Body of `POST /`: persist a finished scan into the history.
///
/// `imageUrl` is validated by the handler (the endpoint answers 400 with a
/// message rather than a deserialization error when it is missing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveScanRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomalies: Option<Vec<Anomaly>>,
}

/// Body of `POST /rename`: rewrite the stored `imageUrl` of every matching
/// record. Metadata only; the file on disk keeps its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub image_url: String,
    pub new_image_url: String,
}

/// Body of `POST /delete`: drop every record whose `imageUrl` matches.
/// Metadata only; the file on disk is left in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub image_url: String,
}
