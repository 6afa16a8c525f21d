//! Core library for the radx X-ray scan service: persistent scan history,
//! asset directory management, image intake, and orchestration of the
//! external detection program.

pub mod assets;
pub mod detect;
pub mod error;
pub mod image;
pub mod store;

pub use assets::AssetDirs;
pub use detect::{DetectionLauncher, DetectorConfig, JobBoard};
pub use error::{RadxError, Result};
pub use image::{ImageSource, validate_magic_bytes};
pub use store::{JsonFileStore, MemoryStore, ScanStore};
