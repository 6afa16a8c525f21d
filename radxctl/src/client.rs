//! Thin typed wrapper over the server's HTTP surface.

use anyhow::{Context, Result};
use radx_model::{
    Anomaly, DeleteRequest, DetectRequest, DetectResponse, DetectionJob, RenameRequest,
    SaveScanRequest, ScanRecord,
};
use serde_json::Value;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list(&self) -> Result<Vec<ScanRecord>> {
        let records = self
            .http
            .get(&self.base_url)
            .send()
            .await
            .context("failed to reach the server")?
            .error_for_status()?
            .json()
            .await?;
        Ok(records)
    }

    pub async fn save(&self, request: &SaveScanRequest) -> Result<Value> {
        let body = self
            .http
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .context("failed to reach the server")?
            .error_for_status()?
            .json()
            .await?;
        Ok(body)
    }

    pub async fn detect(&self, request: &DetectRequest) -> Result<DetectResponse> {
        let response = self
            .http
            .post(format!("{}/detect", self.base_url))
            .json(request)
            .send()
            .await
            .context("failed to reach the server")?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    /// `None` for a timestamp the server has no job record for.
    pub async fn job_status(&self, timestamp: i64) -> Result<Option<DetectionJob>> {
        let response = self
            .http
            .get(format!("{}/detect/{timestamp}", self.base_url))
            .send()
            .await
            .context("failed to reach the server")?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json().await?))
    }

    pub async fn rename(&self, request: &RenameRequest) -> Result<u64> {
        let body: Value = self
            .http
            .post(format!("{}/rename", self.base_url))
            .json(request)
            .send()
            .await
            .context("failed to reach the server")?
            .error_for_status()?
            .json()
            .await?;
        Ok(body["matched"].as_u64().unwrap_or(0))
    }

    pub async fn delete(&self, request: &DeleteRequest) -> Result<u64> {
        let body: Value = self
            .http
            .post(format!("{}/delete", self.base_url))
            .json(request)
            .send()
            .await
            .context("failed to reach the server")?
            .error_for_status()?
            .json()
            .await?;
        Ok(body["matched"].as_u64().unwrap_or(0))
    }

    /// Fetch a static asset by its server-relative path (`/processed_images/...`).
    pub async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let bytes = self
            .http
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .context("failed to reach the server")?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }

    /// Fetch the per-job anomalies description file. Any failure degrades
    /// to no findings, mirroring how the server treats a missing file.
    pub async fn fetch_anomalies(&self, timestamp: i64) -> Vec<Anomaly> {
        let url = format!(
            "{}/processed_images/xray_{timestamp}.json",
            self.base_url
        );
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(_) => return Vec::new(),
        };
        if !response.status().is_success() {
            return Vec::new();
        }
        response.json().await.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
