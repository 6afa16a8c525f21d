//! Detection job orchestration.
//!
//! A detect call persists the upload, pre-copies it to the deterministic
//! processed path as a placeholder, registers a pending job, and returns.
//! The external detector runs on a detached task; its outcome is published
//! on the [`JobBoard`] and, on success, its output image and anomalies
//! description replace the placeholder. A failed run is logged and marked
//! `failed`: the placeholder stays as the visible result, the HTTP caller
//! is never interrupted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use radx_model::{Anomaly, DetectResponse, DetectionJob, DetectionStatus};
use tokio::process::Command;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::assets::{AssetDirs, PROCESSED_MOUNT, UPLOADS_MOUNT};
use crate::image::ImageSource;
use crate::{RadxError, Result};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp"];

/// Name the external detector gives its anomalies side-effect file.
const ANOMALIES_FILE: &str = "anomalies.json";

/// Command line of the external detection program.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Interpreter the script runs under.
    pub python: String,
    /// Detection script path.
    pub script: PathBuf,
    /// Model checkpoint handed to the script.
    pub weights: PathBuf,
}

/// Shared registry of detection jobs keyed by the client timestamp.
///
/// Re-detecting with an already-used timestamp replaces the prior record.
/// Each launch carries a generation tag; a superseded run reporting in
/// late finds the tag mismatched and is discarded instead of overwriting
/// the replacement job.
#[derive(Debug, Clone, Default)]
pub struct JobBoard {
    inner: Arc<RwLock<HashMap<i64, BoardEntry>>>,
    generations: Arc<AtomicU64>,
}

#[derive(Debug)]
struct BoardEntry {
    generation: u64,
    job: DetectionJob,
}

impl JobBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, timestamp: i64) -> Option<DetectionJob> {
        self.inner
            .read()
            .await
            .get(&timestamp)
            .map(|entry| entry.job.clone())
    }

    /// Register a job, returning the generation the launching run must
    /// present to publish its outcome.
    async fn put(&self, job: DetectionJob) -> u64 {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        self.inner
            .write()
            .await
            .insert(job.timestamp, BoardEntry { generation, job });
        generation
    }

    async fn complete(&self, timestamp: i64, generation: u64, anomalies: Vec<Anomaly>) {
        if let Some(entry) = self.inner.write().await.get_mut(&timestamp) {
            if entry.generation != generation {
                debug!("Discarding completion from superseded run for {}", timestamp);
                return;
            }
            entry.job.status = DetectionStatus::Done;
            entry.job.anomalies = anomalies;
            entry.job.completed_at = Some(Utc::now());
        }
    }

    async fn fail(&self, timestamp: i64, generation: u64, message: String) {
        if let Some(entry) = self.inner.write().await.get_mut(&timestamp) {
            if entry.generation != generation {
                debug!("Discarding failure from superseded run for {}", timestamp);
                return;
            }
            entry.job.status = DetectionStatus::Failed;
            entry.job.error = Some(message);
            entry.job.completed_at = Some(Utc::now());
        }
    }
}

/// Accepts an image, guarantees a file at the deterministic output path
/// before replying, and runs the external detector in the background.
#[derive(Debug, Clone)]
pub struct DetectionLauncher {
    assets: AssetDirs,
    detector: DetectorConfig,
    client: reqwest::Client,
    jobs: JobBoard,
}

impl DetectionLauncher {
    pub fn new(assets: AssetDirs, detector: DetectorConfig) -> Self {
        Self {
            assets,
            detector,
            client: reqwest::Client::new(),
            jobs: JobBoard::new(),
        }
    }

    pub fn jobs(&self) -> &JobBoard {
        &self.jobs
    }

    /// Steps 1–3 of a detection: persist the upload, write the placeholder,
    /// register the pending job. Returns before the external program runs;
    /// by the time this resolves, the deterministic output path is
    /// guaranteed to hold a file.
    pub async fn launch(
        &self,
        source: ImageSource,
        timestamp: i64,
    ) -> Result<DetectResponse> {
        let bytes = source.fetch(&self.client).await?;

        let name = AssetDirs::output_name(timestamp);
        let upload_file = self.assets.uploads_dir().join(&name);
        let processed_file = self.assets.processed_dir().join(&name);

        tokio::fs::write(&upload_file, &bytes).await?;
        // Placeholder fallback: the unprocessed image already sits at the
        // expected result path if the detector never delivers.
        tokio::fs::copy(&upload_file, &processed_file).await?;
        info!(
            "Detection job {} staged: upload {} ({} bytes)",
            timestamp,
            upload_file.display(),
            bytes.len()
        );

        let upload_path = format!("{UPLOADS_MOUNT}/{name}");
        let processed_path = format!("{PROCESSED_MOUNT}/{name}");
        let generation = self
            .jobs
            .put(DetectionJob::pending(
                timestamp,
                upload_path.clone(),
                processed_path.clone(),
            ))
            .await;

        let detector = self.detector.clone();
        let assets = self.assets.clone();
        let jobs = self.jobs.clone();
        tokio::spawn(async move {
            run_detector(detector, assets, jobs, timestamp, generation, upload_file).await;
        });

        Ok(DetectResponse {
            timestamp,
            upload_path,
            processed_path,
        })
    }
}

/// Detached step 4: run the external program and promote its output.
/// All failure paths end on the job board; nothing propagates to a caller.
async fn run_detector(
    detector: DetectorConfig,
    assets: AssetDirs,
    jobs: JobBoard,
    timestamp: i64,
    generation: u64,
    upload_file: PathBuf,
) {
    let project_dir = assets.processed_dir().join(format!("xray_{timestamp}"));

    let output = Command::new(&detector.python)
        .arg(&detector.script)
        .arg("--source")
        .arg(&upload_file)
        .arg("--weights")
        .arg(&detector.weights)
        .arg("--project")
        .arg(&project_dir)
        .arg("--exist-ok")
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            error!("Detection job {} failed to spawn detector: {}", timestamp, e);
            jobs.fail(timestamp, generation, format!("failed to spawn detector: {e}"))
                .await;
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(
            "Detection job {} failed ({}): {}",
            timestamp,
            output.status,
            stderr.trim()
        );
        jobs.fail(
            timestamp,
            generation,
            format!("detector exited with {}", output.status),
        )
        .await;
        return;
    }

    match promote_output(&assets, timestamp, &project_dir).await {
        Ok(anomalies) => {
            info!(
                "Detection job {} done: {} anomalies",
                timestamp,
                anomalies.len()
            );
            jobs.complete(timestamp, generation, anomalies).await;
        }
        Err(e) => {
            error!("Detection job {} produced no usable output: {}", timestamp, e);
            jobs.fail(timestamp, generation, e.to_string()).await;
        }
    }
}

/// Copy the detector's result image over the placeholder and publish the
/// anomalies description at the per-job deterministic path.
async fn promote_output(
    assets: &AssetDirs,
    timestamp: i64,
    project_dir: &Path,
) -> Result<Vec<Anomaly>> {
    let files = collect_files(project_dir).await?;

    let result_image = files
        .iter()
        .find(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
                })
        })
        .ok_or_else(|| {
            RadxError::Detection("detector wrote no output image".to_string())
        })?;

    let final_image = assets
        .processed_dir()
        .join(AssetDirs::output_name(timestamp));
    tokio::fs::copy(result_image, &final_image).await?;
    debug!(
        "Promoted {} over placeholder {}",
        result_image.display(),
        final_image.display()
    );

    let anomalies = match files
        .iter()
        .find(|path| path.file_name().is_some_and(|n| n == ANOMALIES_FILE))
    {
        Some(path) => read_anomalies(path).await,
        None => Vec::new(),
    };

    // Per-job description file, fetched by clients alongside the image.
    let description = assets
        .processed_dir()
        .join(AssetDirs::anomalies_name(timestamp));
    let json = serde_json::to_vec_pretty(&anomalies)?;
    tokio::fs::write(&description, json).await?;

    Ok(anomalies)
}

/// A malformed description file degrades to no findings; the job itself
/// still counts as done.
async fn read_anomalies(path: &Path) -> Vec<Anomaly> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) => {
            error!("Error reading {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    match serde_json::from_slice::<Vec<Anomaly>>(&data) {
        Ok(list) => list.into_iter().map(Anomaly::normalized).collect(),
        Err(e) => {
            error!("Malformed anomalies file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Recursively list the files under `dir` in sorted order, so "the first
/// file" is deterministic across runs.
async fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use std::time::Duration;

    const JPEG_HEADER: [u8; 6] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    fn jpeg_source() -> ImageSource {
        ImageSource::Base64(BASE64.encode(JPEG_HEADER))
    }

    fn launcher_with(python: &str, script: &Path, assets: &AssetDirs) -> DetectionLauncher {
        DetectionLauncher::new(
            assets.clone(),
            DetectorConfig {
                python: python.to_string(),
                script: script.to_path_buf(),
                weights: PathBuf::from("xray.pt"),
            },
        )
    }

    async fn wait_for_terminal(jobs: &JobBoard, timestamp: i64) -> DetectionJob {
        for _ in 0..250 {
            if let Some(job) = jobs.get(timestamp).await {
                if job.status.is_terminal() {
                    return job;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("detection job {timestamp} never reached a terminal state");
    }

    /// Stand-in detector that behaves like the real script: writes a result
    /// image and an anomalies description under the project directory.
    fn write_fake_detector(dir: &Path) -> PathBuf {
        let script = dir.join("fake_detect.sh");
        std::fs::write(
            &script,
            r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    --source) src="$2"; shift 2 ;;
    --project) proj="$2"; shift 2 ;;
    *) shift ;;
  esac
done
mkdir -p "$proj/exp"
cp "$src" "$proj/exp/result.jpg"
printf '%s' '[{"anomalyName":"Fracture","percentage":"85%"}]' > "$proj/exp/anomalies.json"
"#,
        )
        .unwrap();
        script
    }

    #[tokio::test]
    async fn placeholder_exists_before_launch_returns() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = AssetDirs::new(tmp.path().join("data"));
        assets.ensure().unwrap();
        // Detector guaranteed to fail; the placeholder must not depend on it.
        let launcher = launcher_with("false", Path::new("/nonexistent"), &assets);

        let response = launcher.launch(jpeg_source(), 1).await.unwrap();
        assert_eq!(response.processed_path, "/processed_images/xray_1.jpg");

        let placeholder = assets.processed_dir().join("xray_1.jpg");
        assert_eq!(std::fs::read(&placeholder).unwrap(), JPEG_HEADER);
        assert_eq!(
            std::fs::read(assets.uploads_dir().join("xray_1.jpg")).unwrap(),
            JPEG_HEADER
        );
    }

    #[tokio::test]
    async fn failed_detector_marks_job_failed_and_keeps_placeholder() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = AssetDirs::new(tmp.path().join("data"));
        assets.ensure().unwrap();
        let launcher = launcher_with("false", Path::new("/nonexistent"), &assets);

        launcher.launch(jpeg_source(), 2).await.unwrap();
        let job = wait_for_terminal(launcher.jobs(), 2).await;

        assert_eq!(job.status, DetectionStatus::Failed);
        assert!(job.error.is_some());
        assert!(job.anomalies.is_empty());
        // The caller still sees the unprocessed original at the result path.
        assert_eq!(
            std::fs::read(assets.processed_dir().join("xray_2.jpg")).unwrap(),
            JPEG_HEADER
        );
    }

    #[tokio::test]
    async fn successful_detector_promotes_output_and_anomalies() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = AssetDirs::new(tmp.path().join("data"));
        assets.ensure().unwrap();
        let script = write_fake_detector(tmp.path());
        let launcher = launcher_with("sh", &script, &assets);

        launcher.launch(jpeg_source(), 3).await.unwrap();
        let job = wait_for_terminal(launcher.jobs(), 3).await;

        assert_eq!(job.status, DetectionStatus::Done);
        assert_eq!(job.anomalies.len(), 1);
        assert_eq!(job.anomalies[0].anomaly_name, "Fracture");
        assert_eq!(job.anomalies[0].percentage, "85%");
        assert!(job.completed_at.is_some());

        // The result image replaced the placeholder and the per-job
        // description file was published next to it.
        assert!(assets.processed_dir().join("xray_3.jpg").is_file());
        let description =
            std::fs::read(assets.processed_dir().join("xray_3.json")).unwrap();
        let parsed: Vec<Anomaly> = serde_json::from_slice(&description).unwrap();
        assert_eq!(parsed, job.anomalies);
    }

    #[tokio::test]
    async fn relaunching_a_timestamp_replaces_the_job_record() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = AssetDirs::new(tmp.path().join("data"));
        assets.ensure().unwrap();
        let launcher = launcher_with("false", Path::new("/nonexistent"), &assets);

        launcher.launch(jpeg_source(), 4).await.unwrap();
        wait_for_terminal(launcher.jobs(), 4).await;

        launcher.launch(jpeg_source(), 4).await.unwrap();
        let fresh = launcher.jobs().get(4).await.unwrap();
        // Either still pending or already failed again, but never the stale
        // record's completion data with a pending status.
        assert!(
            fresh.status == DetectionStatus::Pending
                || fresh.status == DetectionStatus::Failed
        );
    }

    #[tokio::test]
    async fn unknown_timestamp_is_absent_from_the_board() {
        let board = JobBoard::new();
        assert!(board.get(999).await.is_none());
    }

    #[tokio::test]
    async fn stale_run_outcome_does_not_overwrite_the_replacement_job() {
        let board = JobBoard::new();
        let pending = || {
            DetectionJob::pending(
                5,
                "/uploads/xray_5.jpg".to_string(),
                "/processed_images/xray_5.jpg".to_string(),
            )
        };
        let first_gen = board.put(pending()).await;
        let second_gen = board.put(pending()).await;
        assert_ne!(first_gen, second_gen);

        // The first run's detached task finishes after the relaunch; its
        // outcome must be discarded, not published under the new job.
        board
            .complete(5, first_gen, vec![Anomaly::new("Fracture", "85%")])
            .await;
        let job = board.get(5).await.unwrap();
        assert_eq!(job.status, DetectionStatus::Pending);
        assert!(job.anomalies.is_empty());
        assert!(job.completed_at.is_none());

        board.fail(5, first_gen, "stale failure".to_string()).await;
        assert_eq!(board.get(5).await.unwrap().status, DetectionStatus::Pending);

        // The owning run still publishes normally.
        board
            .complete(5, second_gen, vec![Anomaly::new("crack", "50%")])
            .await;
        let job = board.get(5).await.unwrap();
        assert_eq!(job.status, DetectionStatus::Done);
        assert_eq!(job.anomalies[0].anomaly_name, "crack");
    }
}
