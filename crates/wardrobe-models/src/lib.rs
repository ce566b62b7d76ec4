//! Shared data models for the wardrobe session service.
//!
//! This crate provides Serde-serializable types for:
//! - Uploaded images, cutouts and segmentation masks
//! - Overlay geometry (natural vs. displayed pixel space)
//! - Region selection sets
//! - Identification facets and preselection policy
//! - Wardrobe items and gallery filters
//! - Widget context (city + weather)
//! - Add-item flow stages

pub mod geometry;
pub mod identification;
pub mod image;
pub mod item;
pub mod segmentation;
pub mod selection;
pub mod session;
pub mod stage;
pub mod widget;

// Re-export common types
pub use geometry::{Dimensions, Point};
pub use identification::{
    Candidate, Facet, FacetCandidates, FashionOptions, IdentificationResult, LabelUpdate,
    PreselectPolicy, UNKNOWN_LABEL,
};
pub use image::{CutoutImage, ImagePayload, PayloadError, UploadedImage};
pub use item::{GalleryFilter, ItemId, NewWardrobeItem, WardrobeItem};
pub use segmentation::{MaskPayload, Region, RegionId, SegmentationResult};
pub use selection::SelectionSet;
pub use session::SessionId;
pub use stage::FlowStage;
pub use widget::{Weather, WidgetContext, UNKNOWN_LOCATION};
