use async_trait::async_trait;
use radx_model::ScanRecord;
use tokio::sync::RwLock;

use super::ScanStore;

/// In-memory history with the same contract as the file-backed store.
/// Used by tests and available for injection wherever persistence is not
/// wanted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<ScanRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn list(&self) -> Vec<ScanRecord> {
        self.records.read().await.clone()
    }

    async fn save(&self, record: ScanRecord) {
        self.records.write().await.insert(0, record);
    }

    async fn rename(&self, image_url: &str, new_image_url: &str) -> usize {
        let mut records = self.records.write().await;
        let mut matched = 0;
        for record in records.iter_mut() {
            if record.image_url == image_url {
                record.image_url = new_image_url.to_string();
                matched += 1;
            }
        }
        matched
    }

    async fn remove(&self, image_url: &str) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.image_url != image_url);
        before - records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_contract_as_the_file_store() {
        let store = MemoryStore::new();
        store.save(ScanRecord::new("http://x/a.jpg", vec![])).await;
        store.save(ScanRecord::new("http://x/b.jpg", vec![])).await;

        let records = store.list().await;
        assert_eq!(records[0].image_url, "http://x/b.jpg");

        assert_eq!(store.rename("http://x/a.jpg", "http://x/c.jpg").await, 1);
        assert_eq!(store.remove("http://x/c.jpg").await, 1);
        assert_eq!(store.list().await.len(), 1);
    }
}
