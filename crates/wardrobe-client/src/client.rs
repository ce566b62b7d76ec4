//! Wardrobe backend HTTP client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use wardrobe_models::{
    CutoutImage, FacetCandidates, FashionOptions, ImagePayload, ItemId, MaskPayload,
    NewWardrobeItem, Point, SegmentationResult, UploadedImage, WardrobeItem,
};

use crate::error::{BackendError, BackendResult};
use crate::types::{
    ClickCutoutRequest, CutoutResponse, ErrorBody, HealthResponse, IdentifyRequest,
    IdentifyResponse, ItemsResponse, MaskCutoutRequest, Reply, SaveResponse,
    SuggestOutfitRequest, SuggestOutfitResponse, UploadRequest, UploadResponse,
};

/// Header carrying the contract version the client speaks.
pub const API_VERSION_HEADER: &str = "x-wardrobe-api-version";

/// How images are sent to `/upload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadEncoding {
    /// `{ imageBase64 }` JSON body
    #[default]
    Json,
    /// Legacy multipart form with a `file` part
    Multipart,
}

impl UploadEncoding {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(UploadEncoding::Json),
            "multipart" => Some(UploadEncoding::Multipart),
            _ => None,
        }
    }
}

/// Configuration for the backend client.
#[derive(Debug, Clone)]
pub struct WardrobeClientConfig {
    /// Base URL of the wardrobe backend
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Contract version sent with every request
    pub api_version: u32,
    /// Encoding used for segmentation uploads
    pub upload_encoding: UploadEncoding,
}

impl Default for WardrobeClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(120), // segmentation is slow on CPU
            api_version: 1,
            upload_encoding: UploadEncoding::Json,
        }
    }
}

impl WardrobeClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("WARDROBE_BACKEND_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("WARDROBE_BACKEND_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            api_version: std::env::var("WARDROBE_API_VERSION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.api_version),
            upload_encoding: std::env::var("WARDROBE_UPLOAD_ENCODING")
                .ok()
                .and_then(|s| UploadEncoding::parse(&s))
                .unwrap_or(defaults.upload_encoding),
        }
    }

    /// Same config pointed at another backend.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Segmentation plus the legacy hosted filename, if any.
#[derive(Debug, Clone)]
pub struct SegmentationReply {
    pub segmentation: SegmentationResult,
    pub hosted_file: Option<String>,
}

/// Client for the wardrobe backend.
///
/// Every call is a single request; failures are returned, never retried.
pub struct WardrobeClient {
    http: Client,
    config: WardrobeClientConfig,
}

impl WardrobeClient {
    /// Create a new backend client.
    pub fn new(config: WardrobeClientConfig) -> BackendResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(API_VERSION_HEADER, HeaderValue::from(config.api_version));

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(BackendError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> BackendResult<Self> {
        Self::new(WardrobeClientConfig::from_env())
    }

    pub fn config(&self) -> &WardrobeClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Check if the backend is healthy.
    pub async fn health_check(&self) -> BackendResult<bool> {
        let url = self.url("/health");

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Wardrobe backend health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Wardrobe backend health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Segment an uploaded image into selectable regions.
    pub async fn upload(&self, image: &UploadedImage) -> BackendResult<SegmentationReply> {
        let response: UploadResponse = match self.config.upload_encoding {
            UploadEncoding::Json => {
                self.post_checked(
                    "/upload",
                    &UploadRequest {
                        image_base64: &image.payload,
                    },
                )
                .await?
            }
            UploadEncoding::Multipart => {
                let bytes = image.payload.decode()?;
                self.upload_file(bytes, &image.filename).await?
            }
        };

        let hosted_file = response.file.clone();
        Ok(SegmentationReply {
            segmentation: response.into_segmentation(),
            hosted_file,
        })
    }

    /// Legacy multipart upload of raw file bytes.
    pub async fn upload_file(&self, bytes: Vec<u8>, filename: &str) -> BackendResult<UploadResponse> {
        let url = self.url("/upload");
        debug!(filename, size = bytes.len(), "Uploading multipart image to {}", url);

        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename.to_string()));
        let response = self.send(self.http.post(&url).multipart(form)).await?;
        checked(read_json(response).await?)
    }

    /// Cutout from a click point (click-to-segment protocol).
    pub async fn cutout_from_click(
        &self,
        image: &ImagePayload,
        point: Point,
    ) -> BackendResult<CutoutImage> {
        let response: CutoutResponse = self
            .post_checked(
                "/create-segmented-image",
                &ClickCutoutRequest {
                    image_base64: image,
                    click_point: point,
                },
            )
            .await?;
        cutout(response)
    }

    /// Cutout from the segmentation mask and the selected region paths.
    pub async fn cutout_from_mask(
        &self,
        image: &ImagePayload,
        mask: &MaskPayload,
        selected_paths: Vec<&str>,
    ) -> BackendResult<CutoutImage> {
        let response: CutoutResponse = self
            .post_checked(
                "/save-selection",
                &MaskCutoutRequest {
                    image_base64: image,
                    mask_base64: mask,
                    selected_segments: selected_paths,
                },
            )
            .await?;
        cutout(response)
    }

    /// Ranked label candidates for a cutout.
    pub async fn identify(&self, cutout: &CutoutImage) -> BackendResult<FacetCandidates> {
        let response: IdentifyResponse = self
            .post_checked(
                "/identify-image",
                &IdentifyRequest {
                    cutout_base64: &cutout.payload,
                },
            )
            .await?;
        Ok(response.candidates)
    }

    /// Label vocabularies for the override controls.
    pub async fn fashion_options(&self) -> BackendResult<FashionOptions> {
        self.get_json("/fashion-options").await
    }

    /// Persist a labelled cutout. Returns the server-assigned id when given.
    pub async fn save(&self, item: &NewWardrobeItem) -> BackendResult<Option<ItemId>> {
        let response: SaveResponse = self.post_checked("/save-to-wardrobe", item).await?;
        Ok(response.id)
    }

    /// Full wardrobe listing.
    pub async fn list_items(&self) -> BackendResult<Vec<WardrobeItem>> {
        let response: ItemsResponse = self.get_json("/clothing-items").await?;
        Ok(response.items)
    }

    /// Delete one item; any 2xx status counts as success.
    pub async fn delete_item(&self, id: &ItemId) -> BackendResult<()> {
        let url = self.url(&format!("/clothing-items/{}", id));
        debug!(item_id = %id, "Deleting wardrobe item");

        let response = self.send(self.http.delete(&url)).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }

    /// Ask the backend for an outfit suggestion.
    pub async fn suggest_outfit(&self, city: &str, temperature: Option<f64>) -> BackendResult<Option<String>> {
        let response: SuggestOutfitResponse = self
            .post_json(
                "/suggest-outfit",
                &SuggestOutfitRequest {
                    city,
                    weather: temperature,
                },
            )
            .await?;
        Ok(response.suggested_outfit)
    }

    /// POST and require `success: true` in the reply.
    async fn post_checked<B, R>(&self, path: &str, body: &B) -> BackendResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned + Reply,
    {
        checked(self.post_json(path, body).await?)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> BackendResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self.send(self.http.post(&url).json(body)).await?;
        read_json(response).await
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> BackendResult<R> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.send(self.http.get(&url)).await?;
        read_json(response).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> BackendResult<Response> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.config.timeout.as_secs())
            } else {
                BackendError::Network(e)
            }
        })
    }
}

/// Parse a JSON body, turning non-2xx statuses into `Status` errors.
async fn read_json<R: DeserializeOwned>(response: Response) -> BackendResult<R> {
    if !response.status().is_success() {
        return Err(status_error(response).await);
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        warn!("Unparseable wardrobe backend response: {}", e);
        BackendError::InvalidResponse(e.to_string())
    })
}

async fn status_error(response: Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::message)
        .unwrap_or_default();
    warn!(status, "Wardrobe backend returned error status: {}", body);
    BackendError::from_http_status(status, message)
}

fn checked<R: Reply>(reply: R) -> BackendResult<R> {
    if reply.success() {
        Ok(reply)
    } else {
        Err(BackendError::rejected(
            reply.error().unwrap_or("Request failed").to_string(),
        ))
    }
}

fn cutout(response: CutoutResponse) -> BackendResult<CutoutImage> {
    if response.cutout_base64.is_empty() {
        return Err(BackendError::InvalidResponse(
            "cutoutBase64 missing from successful response".to_string(),
        ));
    }
    Ok(CutoutImage::new(response.cutout_base64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = WardrobeClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.api_version, 1);
        assert_eq!(config.upload_encoding, UploadEncoding::Json);
    }

    #[test]
    fn test_upload_encoding_parse() {
        assert_eq!(UploadEncoding::parse("Multipart"), Some(UploadEncoding::Multipart));
        assert_eq!(UploadEncoding::parse("json"), Some(UploadEncoding::Json));
        assert_eq!(UploadEncoding::parse("xml"), None);
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client =
            WardrobeClient::new(WardrobeClientConfig::default().with_base_url("http://backend/"))
                .unwrap();
        assert_eq!(client.url("/upload"), "http://backend/upload");
    }

    #[test]
    fn test_checked_rejects_failure() {
        let reply = SaveResponse {
            success: false,
            id: None,
            error: Some("Disk full".into()),
        };
        let err = checked(reply).unwrap_err();
        assert_eq!(err.user_message(), "Disk full");
    }
}
