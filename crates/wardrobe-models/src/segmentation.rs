//! Segmentation results returned by the backend.

use std::fmt;
use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use serde::{Deserialize, Serialize};

use crate::image::PayloadError;

/// Position of a region in the backend's outline list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub usize);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One connected contour, as an SVG path string in natural pixel space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub path: String,
}

/// Opaque mask payload: zlib-compressed, base64-encoded, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct MaskPayload(pub String);

impl MaskPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Number of mask bytes after base64 + zlib decoding.
    pub fn decoded_len(&self) -> Result<usize, PayloadError> {
        if self.is_empty() {
            return Err(PayloadError::Empty);
        }
        let compressed = STANDARD.decode(self.0.trim())?;
        let mut raw = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut raw)
            .map_err(|e| PayloadError::Corrupt(e.to_string()))?;
        Ok(raw.len())
    }
}

/// Region outlines plus mask for one uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SegmentationResult {
    pub regions: Vec<Region>,
    pub mask: MaskPayload,
}

impl SegmentationResult {
    /// Build from the backend's ordered path list.
    pub fn from_paths(paths: Vec<String>, mask: MaskPayload) -> Self {
        let regions = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| Region {
                id: RegionId(i),
                path,
            })
            .collect();
        Self { regions, mask }
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
