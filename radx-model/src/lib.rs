//! Core data model definitions shared across radx crates.
//!
//! Field names serialize in the camelCase wire format the scan history file
//! and the HTTP API use (`imageUrl`, `anomalyName`, ...).
#![allow(missing_docs)]

pub mod detect;
pub mod requests;
pub mod scan;

pub use detect::{DetectRequest, DetectResponse, DetectionJob, DetectionStatus};
pub use requests::{DeleteRequest, RenameRequest, SaveScanRequest};
pub use scan::{Anomaly, ScanRecord};
