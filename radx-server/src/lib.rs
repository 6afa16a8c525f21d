//! HTTP facade for the radx X-ray scan service.
//!
//! Exposes the scan history and the detection job launcher over JSON
//! endpoints and serves the three asset directories as static content.
#![allow(missing_docs)]

pub mod config;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::Config;
pub use errors::{AppError, AppResult};
pub use routes::create_app;
pub use state::AppState;
