//! Client for the wardrobe backend.
//!
//! The backend owns segmentation, garment classification, persistence and
//! outfit suggestion. This crate speaks its JSON contract (plus the legacy
//! multipart upload) and maps failures into [`BackendError`], keeping
//! server-provided messages intact for display.
//!
//! [`WidgetClient`] fetches the ambient city/weather snapshot from public
//! geocoding and forecast services.

pub mod client;
pub mod error;
pub mod types;
pub mod widget;

pub use client::{
    SegmentationReply, UploadEncoding, WardrobeClient, WardrobeClientConfig, API_VERSION_HEADER,
};
pub use error::{BackendError, BackendResult, TRANSPORT_FAILURE_MESSAGE};
pub use widget::{WidgetClient, WidgetClientConfig};
