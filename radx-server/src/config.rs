use std::env;
use std::path::PathBuf;

use radx_core::{AssetDirs, DetectorConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    /// Base URL clients use to reach the static mounts; stored image URLs
    /// are rewritten against it.
    pub public_base_url: String,

    /// Root of the asset directories and the scan history document.
    pub data_root: PathBuf,

    // External detector settings
    pub detect_python: String,
    pub detect_script: PathBuf,
    pub detect_weights: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        Ok(Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port,

            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{server_port}")),

            data_root: env::var("RADX_DATA_ROOT")
                .unwrap_or_else(|_| "./data".to_string())
                .into(),

            detect_python: env::var("DETECT_PYTHON")
                .unwrap_or_else(|_| "python3".to_string()),
            detect_script: env::var("DETECT_SCRIPT")
                .unwrap_or_else(|_| "./yolov7/detect.py".to_string())
                .into(),
            detect_weights: env::var("DETECT_WEIGHTS")
                .unwrap_or_else(|_| "./yolov7/xray.pt".to_string())
                .into(),
        })
    }

    pub fn asset_dirs(&self) -> AssetDirs {
        AssetDirs::new(&self.data_root)
    }

    pub fn detector(&self) -> DetectorConfig {
        DetectorConfig {
            python: self.detect_python.clone(),
            script: self.detect_script.clone(),
            weights: self.detect_weights.clone(),
        }
    }

    /// Create the asset directories if they don't exist.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        self.asset_dirs().ensure()?;
        Ok(())
    }
}
