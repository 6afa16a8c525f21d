use std::sync::Arc;

use radx_core::{AssetDirs, DetectionLauncher, DetectorConfig, JsonFileStore, ScanStore};

use crate::Config;

/// Shared handler state: the injected scan store, the detection launcher,
/// and enough of the config to rewrite stored image URLs.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ScanStore>,
    pub launcher: Arc<DetectionLauncher>,
    pub assets: AssetDirs,
    pub public_base_url: String,
    pub client: reqwest::Client,
}

impl AppState {
    /// Production wiring: file-backed store at the data root.
    pub fn from_config(config: &Config) -> Self {
        let assets = config.asset_dirs();
        let store = Arc::new(JsonFileStore::new(assets.store_file()));
        Self::new(store, assets, config.detector(), config.public_base_url.clone())
    }

    pub fn new(
        store: Arc<dyn ScanStore>,
        assets: AssetDirs,
        detector: DetectorConfig,
        public_base_url: String,
    ) -> Self {
        let launcher = Arc::new(DetectionLauncher::new(assets.clone(), detector));
        Self {
            store,
            launcher,
            assets,
            public_base_url,
            client: reqwest::Client::new(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("assets", &self.assets)
            .field("public_base_url", &self.public_base_url)
            .finish_non_exhaustive()
    }
}
