//! Backend request/response types.
//!
//! One schema per endpoint. Image payloads travel as base64 strings.

use serde::{Deserialize, Serialize};
use wardrobe_models::{
    FacetCandidates, ImagePayload, ItemId, MaskPayload, Point, SegmentationResult, WardrobeItem,
};

/// Responses that carry a `success` flag and an optional error string.
pub trait Reply {
    fn success(&self) -> bool;
    fn error(&self) -> Option<&str>;
}

macro_rules! impl_reply {
    ($($ty:ty),* $(,)?) => {
        $(impl Reply for $ty {
            fn success(&self) -> bool {
                self.success
            }

            fn error(&self) -> Option<&str> {
                self.error.as_deref()
            }
        })*
    };
}

/// Segmentation request for an inline image.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest<'a> {
    pub image_base64: &'a ImagePayload,
}

/// Segmentation response.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default)]
    pub mask: MaskPayload,
    #[serde(default)]
    pub polygons: Vec<String>,
    /// Server-hosted filename (multipart uploads only)
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn into_segmentation(self) -> SegmentationResult {
        SegmentationResult::from_paths(self.polygons, self.mask)
    }
}

/// Click-to-segment cutout request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickCutoutRequest<'a> {
    pub image_base64: &'a ImagePayload,
    pub click_point: Point,
}

/// Mask-selection cutout request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskCutoutRequest<'a> {
    pub image_base64: &'a ImagePayload,
    pub mask_base64: &'a MaskPayload,
    /// Path strings of the selected regions
    pub selected_segments: Vec<&'a str>,
}

/// Cutout response (both cutout protocols).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoutResponse {
    pub success: bool,
    #[serde(default)]
    pub cutout_base64: ImagePayload,
    #[serde(default)]
    pub error: Option<String>,
}

/// Identification request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest<'a> {
    pub cutout_base64: &'a ImagePayload,
}

/// Identification response with ranked candidates per facet.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifyResponse {
    pub success: bool,
    #[serde(flatten)]
    pub candidates: FacetCandidates,
    #[serde(default)]
    pub error: Option<String>,
}

/// Save response.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub error: Option<String>,
}

impl_reply!(UploadResponse, CutoutResponse, IdentifyResponse, SaveResponse);

/// Wardrobe listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsResponse {
    pub items: Vec<WardrobeItem>,
}

/// Outfit suggestion request.
#[derive(Debug, Serialize)]
pub struct SuggestOutfitRequest<'a> {
    pub city: &'a str,
    /// Temperature in degrees Celsius
    pub weather: Option<f64>,
}

/// Outfit suggestion response.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestOutfitResponse {
    #[serde(default)]
    pub suggested_outfit: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}

/// Error body of non-2xx responses.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn message(self) -> Option<String> {
        self.error.or(self.detail)
    }
}
