use std::path::PathBuf;

use async_trait::async_trait;
use radx_model::ScanRecord;
use tokio::sync::Mutex;
use tracing::{error, warn};

use super::ScanStore;

/// File-backed history: whole-document read-modify-write of a single
/// pretty-printed JSON array.
///
/// All mutations serialize through one writer lock, so concurrent saves,
/// renames, and deletes cannot drop each other's updates. Reads bypass the
/// lock; writes land in a temp file renamed over the document, so a
/// concurrent read sees either the old or the new contents, never a
/// partial write.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read the full document. Missing or corrupt files degrade to an
    /// empty history rather than failing the caller.
    async fn read_records(&self) -> Vec<ScanRecord> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Error reading {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_slice(&data) {
            Ok(records) => records,
            Err(e) => {
                warn!("Corrupt scan history at {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Write the full document back. Failures are logged and masked; the
    /// mutation still reports success to the caller.
    ///
    /// Writes go to a sibling temp file first and are renamed into place,
    /// an atomic replace on the same filesystem. The temp name is stable
    /// because all writers hold the lock.
    async fn write_records(&self, records: &[ScanRecord]) {
        let json = match serde_json::to_vec_pretty(records) {
            Ok(json) => json,
            Err(e) => {
                error!("Error serializing scan history: {}", e);
                return;
            }
        };
        let tmp = self.path.with_extension("json.tmp");
        if let Err(e) = tokio::fs::write(&tmp, json).await {
            error!("Error writing to {}: {}", tmp.display(), e);
            return;
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            error!("Error replacing {}: {}", self.path.display(), e);
        }
    }
}

#[async_trait]
impl ScanStore for JsonFileStore {
    async fn list(&self) -> Vec<ScanRecord> {
        self.read_records().await
    }

    async fn save(&self, record: ScanRecord) {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_records().await;
        records.insert(0, record);
        self.write_records(&records).await;
    }

    async fn rename(&self, image_url: &str, new_image_url: &str) -> usize {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_records().await;
        let mut matched = 0;
        for record in &mut records {
            if record.image_url == image_url {
                record.image_url = new_image_url.to_string();
                matched += 1;
            }
        }
        if matched > 0 {
            self.write_records(&records).await;
        }
        matched
    }

    async fn remove(&self, image_url: &str) -> usize {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_records().await;
        let before = records.len();
        records.retain(|record| record.image_url != image_url);
        let matched = before - records.len();
        if matched > 0 {
            self.write_records(&records).await;
        }
        matched
    }
}
