use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, RadxError>;
