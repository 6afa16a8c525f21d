//! Image intake: remote URL download, inline base64 decode, and magic byte
//! validation before anything touches the asset directories.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::warn;

use crate::{RadxError, Result};

/// Where the bytes of an incoming image come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Remote `http`/`https` URL fetched server-side, or an inline `data:`
    /// URL decoded without touching the network.
    Url(String),
    /// Base64 payload, raw or with a `data:*;base64,` prefix.
    Base64(String),
}

impl ImageSource {
    /// Build a source from the optional request fields, enforcing the
    /// exactly-one rule.
    pub fn from_request(
        image_url: Option<String>,
        image_data: Option<String>,
    ) -> Result<Self> {
        match (image_url, image_data) {
            (Some(url), None) => Ok(Self::Url(url)),
            (None, Some(data)) => Ok(Self::Base64(data)),
            (Some(_), Some(_)) => Err(RadxError::InvalidImage(
                "supply either imageUrl or imageData, not both".to_string(),
            )),
            (None, None) => Err(RadxError::InvalidImage(
                "one of imageUrl or imageData is required".to_string(),
            )),
        }
    }

    /// Resolve the source to validated image bytes.
    pub async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<u8>> {
        let bytes = match self {
            Self::Url(url) if url.starts_with("data:") => decode_base64(url)?,
            Self::Url(url) => {
                let response = client.get(url).send().await?.error_for_status()?;
                response.bytes().await?.to_vec()
            }
            Self::Base64(data) => decode_base64(data)?,
        };
        validate_magic_bytes(&bytes)?;
        Ok(bytes)
    }
}

/// Decode a base64 payload, tolerating a `data:*;base64,` prefix and
/// surrounding whitespace.
fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let payload = match data.split_once("base64,") {
        Some((_, rest)) => rest,
        None if data.starts_with("data:") => {
            return Err(RadxError::InvalidImage(
                "data URL is not base64-encoded".to_string(),
            ));
        }
        None => data,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(cleaned.as_bytes())
        .map_err(|e| RadxError::InvalidImage(format!("invalid base64 payload: {e}")))
}

/// Validate image bytes by checking magic bytes.
/// Returns the detected content type if valid.
pub fn validate_magic_bytes(data: &[u8]) -> Result<&'static str> {
    if data.len() < 4 {
        return Err(RadxError::InvalidImage(
            "payload too small to be an image".to_string(),
        ));
    }

    // JPEG: FF D8 FF
    if data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
        return Ok("image/jpeg");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.len() >= 8 && data[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        return Ok("image/png");
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Ok("image/webp");
    }

    // GIF: GIF87a or GIF89a
    if data.len() >= 6 && &data[0..3] == b"GIF" {
        return Ok("image/gif");
    }

    // BMP: BM
    if &data[0..2] == b"BM" {
        return Ok("image/bmp");
    }

    warn!(
        "Unrecognized image format, first 8 bytes: {:02X?}",
        &data[..8.min(data.len())]
    );
    Err(RadxError::InvalidImage(
        "unrecognized image format".to_string(),
    ))
}
