//! Per-session workflow state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use wardrobe_models::{
    CutoutImage, Dimensions, FlowStage, IdentificationResult, ImagePayload, ItemId,
    NewWardrobeItem, Point, RegionId, SessionId, UploadedImage,
};

use crate::outfit::OutfitLog;
use crate::overlay::OverlayState;

/// Everything one add-item session has produced so far.
///
/// Passed explicitly to every [`FlowController`](crate::FlowController)
/// operation; the registry owns it between requests.
#[derive(Debug, Clone)]
pub struct FlowSession {
    pub id: SessionId,
    pub stage: FlowStage,
    pub image: Option<UploadedImage>,
    pub overlay: Option<OverlayState>,
    /// Last click, already converted to the configured space
    pub click: Option<Point>,
    pub cutout: Option<CutoutImage>,
    pub identification: Option<IdentificationResult>,
    pub saved: Option<SavedItem>,
    /// Message of the most recent failed operation
    pub last_error: Option<String>,
    /// Bumped on every reset so delayed resets can tell cycles apart
    pub cycle: u64,
    /// Outfit advisor replies; kept across resets
    pub outfit_log: OutfitLog,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl FlowSession {
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            stage: FlowStage::Upload,
            image: None,
            overlay: None,
            click: None,
            cutout: None,
            identification: None,
            saved: None,
            last_error: None,
            cycle: 0,
            outfit_log: OutfitLog::default(),
            created_at: now,
            last_active: now,
        }
    }

    /// Back to `Upload` with every artifact cleared. The id survives.
    pub fn reset(&mut self) {
        self.stage = FlowStage::Upload;
        self.image = None;
        self.overlay = None;
        self.click = None;
        self.cutout = None;
        self.identification = None;
        self.saved = None;
        self.last_error = None;
        self.cycle += 1;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Seconds since the session was last used.
    pub fn idle_secs(&self) -> i64 {
        (Utc::now() - self.last_active).num_seconds()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let timeline = FlowStage::TIMELINE
            .iter()
            .map(|stage| TimelineEntry {
                stage: *stage,
                title: stage.title(),
                state: if stage.index() < self.stage.index() {
                    StepState::Done
                } else if *stage == self.stage {
                    StepState::Current
                } else {
                    StepState::Pending
                },
            })
            .collect();

        SessionSnapshot {
            id: self.id,
            stage: self.stage,
            stage_title: self.stage.title(),
            timeline,
            image: self.image.as_ref().map(|i| ImageSummary {
                filename: i.filename.clone(),
                dimensions: i.dimensions,
            }),
            region_count: self.overlay.as_ref().map_or(0, |o| o.segmentation().len()),
            selected: self
                .overlay
                .as_ref()
                .map(|o| o.selection().iter().collect())
                .unwrap_or_default(),
            click: self.click,
            cutout_base64: self.cutout.as_ref().map(|c| c.payload.clone()),
            identification: self.identification.clone(),
            saved_item_id: self.saved.as_ref().and_then(|s| s.id.clone()),
            last_error: self.last_error.clone(),
            created_at: self.created_at,
            last_active: self.last_active,
        }
    }
}

/// What the backend stored at the end of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    /// Server-assigned id, when the backend reports one
    pub id: Option<ItemId>,
    pub item: NewWardrobeItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Done,
    Current,
    Pending,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub stage: FlowStage,
    pub title: &'static str,
    pub state: StepState,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub filename: String,
    pub dimensions: Dimensions,
}

/// Read-only view of a session for the UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub stage: FlowStage,
    pub stage_title: &'static str,
    pub timeline: Vec<TimelineEntry>,
    pub image: Option<ImageSummary>,
    pub region_count: usize,
    pub selected: Vec<RegionId>,
    pub click: Option<Point>,
    pub cutout_base64: Option<ImagePayload>,
    pub identification: Option<IdentificationResult>,
    pub saved_item_id: Option<ItemId>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}
