//! Asset directory layout under the configurable data root.
//!
//! Three areas: saved scan images, processed detection outputs, and
//! transient uploads. The scan history document `image_data.json` sits at
//! the root next to them.

use std::path::{Path, PathBuf};

use crate::Result;

/// URL mount for saved scan images.
pub const IMAGES_MOUNT: &str = "/images";
/// URL mount for processed detection outputs (and placeholders).
pub const PROCESSED_MOUNT: &str = "/processed_images";
/// URL mount for transient uploads.
pub const UPLOADS_MOUNT: &str = "/uploads";

/// Filesystem layout for the three served asset areas.
#[derive(Debug, Clone)]
pub struct AssetDirs {
    root: PathBuf,
}

impl AssetDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the asset directories if they are missing (recursive).
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(self.scans_dir())?;
        std::fs::create_dir_all(self.processed_dir())?;
        std::fs::create_dir_all(self.uploads_dir())?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Saved scan images, served at [`IMAGES_MOUNT`].
    pub fn scans_dir(&self) -> PathBuf {
        self.root.join("scans")
    }

    /// Detection outputs and placeholders, served at [`PROCESSED_MOUNT`].
    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    /// Transient uploads, served at [`UPLOADS_MOUNT`].
    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    /// The scan history document.
    pub fn store_file(&self) -> PathBuf {
        self.root.join("image_data.json")
    }

    /// Deterministic per-job image name derived from the client timestamp.
    pub fn output_name(timestamp: i64) -> String {
        format!("xray_{timestamp}.jpg")
    }

    /// Deterministic per-job anomalies description file name.
    pub fn anomalies_name(timestamp: i64) -> String {
        format!("xray_{timestamp}.json")
    }
}

/// Reduce an externally-supplied URL or path to a bare file name.
///
/// Takes the final path segment and drops any query/fragment. Returns
/// `None` when nothing usable remains (e.g. a `data:` URL), in which case
/// callers synthesize a name instead.
pub fn basename_for_url(image_url: &str) -> Option<String> {
    if image_url.starts_with("data:") {
        return None;
    }
    let name = match url::Url::parse(image_url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("")
            .to_string(),
        // Not an absolute URL; treat it as a bare path.
        Err(_) => image_url
            .split(['?', '#'])
            .next()
            .unwrap_or(image_url)
            .trim_end_matches('/')
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or("")
            .to_string(),
    };
    // A scheme remnant like "http:" means the URL had no path segment.
    if name.is_empty() || name.ends_with(':') || name == "." || name == ".." {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_creates_all_three_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = AssetDirs::new(tmp.path().join("data"));
        dirs.ensure().unwrap();
        assert!(dirs.scans_dir().is_dir());
        assert!(dirs.processed_dir().is_dir());
        assert!(dirs.uploads_dir().is_dir());
        // Idempotent.
        dirs.ensure().unwrap();
    }

    #[test]
    fn deterministic_output_names() {
        assert_eq!(AssetDirs::output_name(1700000000000), "xray_1700000000000.jpg");
        assert_eq!(
            AssetDirs::anomalies_name(1700000000000),
            "xray_1700000000000.json"
        );
    }

    #[test]
    fn basename_strips_directories_and_query() {
        assert_eq!(
            basename_for_url("http://x/a/b/test.jpg").as_deref(),
            Some("test.jpg")
        );
        assert_eq!(
            basename_for_url("http://x/test.jpg?size=large#frag").as_deref(),
            Some("test.jpg")
        );
        assert_eq!(
            basename_for_url("../../etc/passwd").as_deref(),
            Some("passwd")
        );
    }

    #[test]
    fn basename_rejects_unusable_urls() {
        assert!(basename_for_url("data:image/jpeg;base64,/9j/4A==").is_none());
        assert!(basename_for_url("http://example.com/").is_none());
        assert!(basename_for_url("").is_none());
    }
}
