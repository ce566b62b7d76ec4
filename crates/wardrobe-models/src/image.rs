//! Encoded image payloads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Dimensions;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Payload is empty")]
    Empty,

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Corrupt payload: {0}")]
    Corrupt(String),
}

/// Base64-encoded image bytes as carried at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ImagePayload(String);

impl ImagePayload {
    /// Encode raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    /// Wrap an already-encoded string.
    ///
    /// A `data:<mime>;base64,` prefix, as produced by browser file readers,
    /// is stripped.
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        let encoded = encoded.into();
        match encoded.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => Self(data.to_string()),
            _ => Self(encoded),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Decode back into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, PayloadError> {
        if self.is_empty() {
            return Err(PayloadError::Empty);
        }
        Ok(STANDARD.decode(self.0.trim())?)
    }

    /// `data:` URL suitable for an `<img src>`; payloads are PNG.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.0)
    }
}

/// A user-selected photograph, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub payload: ImagePayload,
    pub filename: String,
    /// Natural (not displayed) pixel size.
    pub dimensions: Dimensions,
}

/// The isolated garment produced from a selection or a click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoutImage {
    pub payload: ImagePayload,
}

impl CutoutImage {
    pub fn new(payload: ImagePayload) -> Self {
        Self { payload }
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
