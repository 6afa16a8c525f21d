//! One detection attempt from image selection to displayed result.
//!
//! The session polls the job-status endpoint instead of trusting a blind
//! timer, but keeps the fallback behavior: when the job fails or the
//! deadline passes, it proceeds with whatever sits at the deterministic
//! result path, which is the placeholder copy of the original image.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use radx_model::{
    Anomaly, DetectRequest, DetectionStatus, SaveScanRequest,
};

use crate::client::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ImageSelected,
    Detecting,
    ResultAvailable,
}

pub struct SessionOutcome {
    pub timestamp: i64,
    pub output_file: PathBuf,
    pub anomalies: Vec<Anomaly>,
    pub detection_succeeded: bool,
}

pub struct ScanSession<'a> {
    client: &'a ApiClient,
    poll_interval: Duration,
    deadline: Duration,
    state: SessionState,
}

impl<'a> ScanSession<'a> {
    pub fn new(client: &'a ApiClient, poll_interval: Duration, deadline: Duration) -> Self {
        Self {
            client,
            poll_interval,
            deadline,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the full session: submit, poll, fetch the result image and the
    /// anomalies description.
    pub async fn run(
        &mut self,
        image: &str,
        output: Option<PathBuf>,
    ) -> Result<SessionOutcome> {
        let request = build_request(image, chrono::Utc::now().timestamp_millis())?;
        self.state = SessionState::ImageSelected;

        let response = self.client.detect(&request).await?;
        self.state = SessionState::Detecting;
        let timestamp = response.timestamp;
        println!("Detection job {timestamp} submitted, waiting for results...");

        let detection_succeeded = self.poll_until_terminal(timestamp).await;
        if !detection_succeeded {
            println!("Detection did not complete; showing the unprocessed image.");
        }

        let image_bytes = self.client.fetch_bytes(&response.processed_path).await?;
        let output_file =
            output.unwrap_or_else(|| PathBuf::from(format!("xray_{timestamp}.jpg")));
        tokio::fs::write(&output_file, &image_bytes)
            .await
            .with_context(|| format!("failed to write {}", output_file.display()))?;

        let anomalies = self.client.fetch_anomalies(timestamp).await;
        self.state = SessionState::ResultAvailable;

        Ok(SessionOutcome {
            timestamp,
            output_file,
            anomalies,
            detection_succeeded,
        })
    }

    /// Persist the finished scan into the history.
    pub async fn save(&self, outcome: &SessionOutcome) -> Result<()> {
        let image_url = format!(
            "{}/processed_images/xray_{}.jpg",
            self.client.base_url(),
            outcome.timestamp
        );
        self.client
            .save(&SaveScanRequest {
                image_url: Some(image_url),
                anomalies: Some(outcome.anomalies.clone()),
            })
            .await?;
        Ok(())
    }

    /// True when the job finished as `done` before the deadline.
    async fn poll_until_terminal(&self, timestamp: i64) -> bool {
        let started = std::time::Instant::now();
        while started.elapsed() < self.deadline {
            match self.client.job_status(timestamp).await {
                Ok(Some(job)) if job.status == DetectionStatus::Done => return true,
                Ok(Some(job)) if job.status == DetectionStatus::Failed => {
                    if let Some(error) = job.error {
                        eprintln!("Detection failed: {error}");
                    }
                    return false;
                }
                // Still pending, unknown, or a transient error: keep polling.
                _ => {}
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        false
    }
}

/// A local file becomes an inline base64 upload; anything else is passed
/// through as a URL for the server to fetch.
fn build_request(image: &str, timestamp: i64) -> Result<DetectRequest> {
    if Path::new(image).is_file() {
        let bytes = std::fs::read(image)
            .with_context(|| format!("failed to read {image}"))?;
        Ok(DetectRequest {
            image_url: None,
            image_data: Some(BASE64.encode(bytes)),
            timestamp,
        })
    } else {
        Ok(DetectRequest {
            image_url: Some(image.to_string()),
            image_data: None,
            timestamp,
        })
    }
}

/// Parse a `name=percentage` pair from the command line.
pub fn parse_anomaly_arg(arg: &str) -> Result<Anomaly> {
    let (name, percentage) = arg
        .split_once('=')
        .with_context(|| format!("expected name=percentage, got '{arg}'"))?;
    Ok(Anomaly::new(name, percentage).normalized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_files_are_sent_inline() {
        let tmp = std::env::temp_dir().join("radxctl_session_test.jpg");
        std::fs::write(&tmp, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        let request = build_request(tmp.to_str().unwrap(), 1).unwrap();
        assert!(request.image_url.is_none());
        assert!(request.image_data.is_some());
        std::fs::remove_file(&tmp).ok();
    }

    #[test]
    fn urls_are_passed_through() {
        let request = build_request("http://x/scan.jpg", 1).unwrap();
        assert_eq!(request.image_url.as_deref(), Some("http://x/scan.jpg"));
        assert!(request.image_data.is_none());
    }

    #[test]
    fn anomaly_args_parse_and_normalize() {
        let anomaly = parse_anomaly_arg("Fracture=65%").unwrap();
        assert_eq!(anomaly.anomaly_name, "Fracture");
        assert_eq!(anomaly.percentage, "65%");

        let padded = parse_anomaly_arg("=40%").unwrap();
        assert_eq!(padded.anomaly_name, "Unknown");

        assert!(parse_anomaly_arg("no-separator").is_err());
    }

    #[test]
    fn session_starts_idle() {
        let client = ApiClient::new("http://localhost:3000");
        let session = ScanSession::new(
            &client,
            Duration::from_millis(500),
            Duration::from_secs(15),
        );
        assert_eq!(session.state(), SessionState::Idle);
    }
}
