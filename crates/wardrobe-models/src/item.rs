//! Persisted wardrobe items.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identification::IdentificationResult;
use crate::image::{CutoutImage, ImagePayload};

/// Server-assigned item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A labelled cutout stored in the user's wardrobe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardrobeItem {
    pub id: ItemId,
    #[serde(rename = "imageBase64")]
    pub image: ImagePayload,
    pub clothing_type: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
}

/// Body of a save request: cutout plus the labels chosen at confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWardrobeItem {
    pub cutout_base64: ImagePayload,
    pub clothing_type: String,
    pub colors: Vec<String>,
    pub pattern: String,
    pub style: String,
}

impl NewWardrobeItem {
    pub fn new(cutout: &CutoutImage, identification: &IdentificationResult) -> Self {
        Self {
            cutout_base64: cutout.payload.clone(),
            clothing_type: identification.clothing_type.clone(),
            colors: identification.colors.clone(),
            pattern: identification.pattern.clone(),
            style: identification.style.clone(),
        }
    }

    /// The stored record once the backend has assigned an id.
    pub fn into_item(self, id: ItemId) -> WardrobeItem {
        WardrobeItem {
            id,
            image: self.cutout_base64,
            clothing_type: self.clothing_type,
            colors: self.colors,
            pattern: Some(self.pattern),
            style: Some(self.style),
        }
    }
}

/// Gallery browsing filter; unset fields match everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GalleryFilter {
    #[serde(default, rename = "type")]
    pub clothing_type: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl GalleryFilter {
    pub fn matches(&self, item: &WardrobeItem) -> bool {
        let type_ok = self
            .clothing_type
            .as_deref()
            .map_or(true, |t| item.clothing_type.eq_ignore_ascii_case(t));
        let color_ok = self
            .color
            .as_deref()
            .map_or(true, |c| item.colors.iter().any(|ic| ic.eq_ignore_ascii_case(c)));
        type_ok && color_ok
    }
}
