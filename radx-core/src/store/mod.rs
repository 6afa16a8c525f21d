//! Scan history persistence.
//!
//! The store is an injected trait seam so the HTTP facade never touches the
//! backing file directly: [`JsonFileStore`] persists the documented
//! `image_data.json` array, [`MemoryStore`] backs tests.
//!
//! Error surface follows the documented degradation rules: reads of a
//! missing or corrupt document yield an empty history, and write failures
//! are logged but masked from the caller.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use radx_model::ScanRecord;

/// Ordered scan history, most-recent-first. `imageUrl` is the de facto
/// record key; rename and remove hit every matching entry and report how
/// many matched.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Full history, most-recent-first.
    async fn list(&self) -> Vec<ScanRecord>;

    /// Insert a record at the front of the history.
    async fn save(&self, record: ScanRecord);

    /// Rewrite the `imageUrl` field of every matching record. Metadata
    /// only; files on disk keep their names.
    async fn rename(&self, image_url: &str, new_image_url: &str) -> usize;

    /// Drop every record whose `imageUrl` matches. Metadata only.
    async fn remove(&self, image_url: &str) -> usize;
}
