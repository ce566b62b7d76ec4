//! Flow Controller: the add-item state machine.
//!
//! `Upload -> Cutout -> Identify -> Save -> Complete`, strictly forward, with
//! `Complete` wrapping back to `Upload`. Every operation takes the session it
//! acts on; the controller itself only holds the backend client, the flow
//! configuration and the cached label vocabularies.
//!
//! The requester methods (`fetch_cutout`, `fetch_identification`, `persist`)
//! check their own inputs before touching the network, so a missing cutout
//! or an incomplete identification can never reach the backend.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn, Instrument};
use wardrobe_client::WardrobeClient;
use wardrobe_models::{
    CutoutImage, Dimensions, FacetCandidates, FashionOptions, FlowStage, IdentificationResult,
    ImagePayload, LabelUpdate, MaskPayload, NewWardrobeItem, Point, RegionId, UploadedImage,
};

use crate::config::{CutoutMode, FlowConfig};
use crate::error::{FlowError, FlowResult};
use crate::logging::SessionLogger;
use crate::metrics;
use crate::overlay::OverlayState;
use crate::session::{FlowSession, SavedItem};

/// Input to a cutout request, one variant per protocol.
#[derive(Debug, Clone)]
pub enum CutoutInput<'a> {
    Selection {
        image: &'a ImagePayload,
        mask: &'a MaskPayload,
        paths: Vec<&'a str>,
    },
    Click {
        image: &'a ImagePayload,
        point: Point,
    },
}

/// Result of confirming the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Advanced { from: FlowStage, to: FlowStage },
    /// Identification arrived; the labels wait for review before the next
    /// confirmation moves on.
    AwaitingReview,
}

impl ConfirmOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmOutcome::Advanced { .. } => "advanced",
            ConfirmOutcome::AwaitingReview => "pending",
        }
    }

    /// Whether this confirmation stored an item.
    pub fn saved(&self) -> bool {
        matches!(
            self,
            ConfirmOutcome::Advanced {
                to: FlowStage::Complete,
                ..
            }
        )
    }
}

pub struct FlowController {
    client: Arc<WardrobeClient>,
    config: FlowConfig,
    options: RwLock<Option<FashionOptions>>,
}

impl FlowController {
    pub fn new(client: Arc<WardrobeClient>, config: FlowConfig) -> Self {
        Self {
            client,
            config,
            options: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<WardrobeClient> {
        &self.client
    }

    /// Fetch the label vocabularies and cache them for override checks.
    pub async fn load_options(&self) -> FlowResult<FashionOptions> {
        let options = self.client.fashion_options().await?;
        *self.options.write().await = Some(options.clone());
        Ok(options)
    }

    /// Cached vocabularies, if loaded.
    pub async fn options(&self) -> Option<FashionOptions> {
        self.options.read().await.clone()
    }

    // ------------------------------------------------------------------
    // Session operations
    // ------------------------------------------------------------------

    /// Segment a new image. Replaces any previous image and everything
    /// derived from it; on failure the previous state is kept.
    pub async fn upload(&self, session: &mut FlowSession, image: UploadedImage) -> FlowResult<()> {
        let result = self.upload_inner(session, image).await;
        self.settle(session, "upload", result)
    }

    async fn upload_inner(&self, session: &mut FlowSession, image: UploadedImage) -> FlowResult<()> {
        require_stage(session, "upload an image", &[FlowStage::Upload])?;

        let logger = SessionLogger::new(&session.id, session.stage);
        logger.log_request("upload");
        let reply = self
            .client
            .upload(&image)
            .instrument(logger.create_span())
            .await?;

        if reply.segmentation.is_empty() {
            warn!(session_id = %session.id, filename = %image.filename, "Segmentation returned no regions");
        }

        let overlay = OverlayState::new(reply.segmentation, image.dimensions);
        if !overlay.segmentation().mask.is_empty() {
            overlay.verify_mask();
        }

        info!(
            session_id = %session.id,
            filename = %image.filename,
            regions = overlay.segmentation().len(),
            "Image segmented"
        );

        session.image = Some(image);
        session.overlay = Some(overlay);
        session.click = None;
        session.cutout = None;
        session.identification = None;
        session.saved = None;
        Ok(())
    }

    /// Flip a region in the selection. Returns whether it is now selected.
    pub async fn toggle_region(&self, session: &mut FlowSession, region: RegionId) -> FlowResult<bool> {
        let result = toggle_inner(session, region);
        self.settle(session, "toggle_region", result)
    }

    /// Empty the selection. Idempotent.
    pub async fn deselect_all(&self, session: &mut FlowSession) -> FlowResult<()> {
        let result = require_stage(session, "change the selection", SELECTING).map(|_| {
            if let Some(overlay) = session.overlay.as_mut() {
                overlay.deselect_all();
            }
            if session.stage == FlowStage::Cutout {
                session.cutout = None;
            }
        });
        self.settle(session, "deselect_all", result)
    }

    /// Click-point mode: record a click on the displayed image and request a
    /// cutout for it.
    pub async fn click(
        &self,
        session: &mut FlowSession,
        displayed_point: Point,
        displayed_size: Dimensions,
    ) -> FlowResult<CutoutImage> {
        let result = self.click_inner(session, displayed_point, displayed_size).await;
        self.settle(session, "click", result)
    }

    async fn click_inner(
        &self,
        session: &mut FlowSession,
        displayed_point: Point,
        displayed_size: Dimensions,
    ) -> FlowResult<CutoutImage> {
        require_stage(session, "request a cutout", &[FlowStage::Cutout])?;
        if self.config.cutout_mode != CutoutMode::ClickPoint {
            return Err(FlowError::validation(
                "Click-point cutouts are not enabled; select regions instead",
            ));
        }

        let overlay = session
            .overlay
            .as_ref()
            .ok_or_else(|| FlowError::validation("Upload an image first"))?;
        let point = overlay.click_point(displayed_point, displayed_size, self.config.click_space)?;
        session.click = Some(point);

        self.cutout_step(session).await
    }

    /// Request a cutout from the current selection (or last click).
    pub async fn request_cutout(&self, session: &mut FlowSession) -> FlowResult<CutoutImage> {
        let result = match require_stage(session, "request a cutout", &[FlowStage::Cutout]) {
            Ok(()) => self.cutout_step(session).await,
            Err(e) => Err(e),
        };
        self.settle(session, "request_cutout", result)
    }

    /// Request identification of the current cutout.
    pub async fn request_identification(
        &self,
        session: &mut FlowSession,
    ) -> FlowResult<IdentificationResult> {
        let result = match require_stage(session, "identify", &[FlowStage::Identify]) {
            Ok(()) => self.identify_step(session).await,
            Err(e) => Err(e),
        };
        self.settle(session, "request_identification", result)
    }

    /// Override one or more facets.
    pub async fn set_labels(
        &self,
        session: &mut FlowSession,
        update: LabelUpdate,
    ) -> FlowResult<IdentificationResult> {
        let options = self.options().await;
        let result = set_labels_inner(session, update, options.as_ref());
        self.settle(session, "set_labels", result)
    }

    /// Confirm the current stage (`confirmCurrentStage`).
    pub async fn confirm(&self, session: &mut FlowSession) -> FlowResult<ConfirmOutcome> {
        let result = self.confirm_inner(session).await;
        self.settle(session, "confirm", result)
    }

    async fn confirm_inner(&self, session: &mut FlowSession) -> FlowResult<ConfirmOutcome> {
        let from = session.stage;

        match from {
            FlowStage::Upload => {
                let overlay = match (&session.image, session.overlay.as_mut()) {
                    (Some(_), Some(overlay)) => overlay,
                    _ => return Err(FlowError::validation("Upload an image before continuing")),
                };
                overlay.deselect_all();
                session.click = None;
                session.cutout = None;
            }
            FlowStage::Cutout => {
                if session.cutout.is_none() {
                    self.cutout_step(session).await?;
                }
                session.identification = None;
            }
            FlowStage::Identify => {
                if session.identification.is_none() {
                    self.identify_step(session).await?;
                    return Ok(ConfirmOutcome::AwaitingReview);
                }
                let missing = session
                    .identification
                    .as_ref()
                    .map(|i| i.missing_facets())
                    .unwrap_or_default();
                if !missing.is_empty() {
                    let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
                    return Err(FlowError::validation(format!(
                        "Choose a value for: {}",
                        names.join(", ")
                    )));
                }
            }
            FlowStage::Save => {
                self.save_step(session).await?;
            }
            FlowStage::Complete => {
                session.reset();
            }
        }

        let to = from.next();
        session.stage = to;
        SessionLogger::new(&session.id, from).log_transition(to);
        metrics::record_stage_transition(from.as_str(), to.as_str());
        Ok(ConfirmOutcome::Advanced { from, to })
    }

    /// Abandon the current cycle.
    pub fn reset(&self, session: &mut FlowSession) {
        info!(session_id = %session.id, stage = %session.stage, "Session reset");
        session.reset();
    }

    // ------------------------------------------------------------------
    // Stage steps (state already checked by the caller)
    // ------------------------------------------------------------------

    async fn cutout_step(&self, session: &mut FlowSession) -> FlowResult<CutoutImage> {
        let image = session
            .image
            .as_ref()
            .ok_or_else(|| FlowError::validation("Upload an image first"))?;

        let input = match self.config.cutout_mode {
            CutoutMode::MaskSelection => {
                let overlay = session
                    .overlay
                    .as_ref()
                    .ok_or_else(|| FlowError::validation("Upload an image first"))?;
                if overlay.selection().is_empty() {
                    return Err(FlowError::validation(
                        "Select at least one region before generating a cutout",
                    ));
                }
                CutoutInput::Selection {
                    image: &image.payload,
                    mask: &overlay.segmentation().mask,
                    paths: overlay.selected_paths(),
                }
            }
            CutoutMode::ClickPoint => {
                let point = session.click.ok_or_else(|| {
                    FlowError::validation("Click on the garment before generating a cutout")
                })?;
                CutoutInput::Click {
                    image: &image.payload,
                    point,
                }
            }
        };

        let logger = SessionLogger::new(&session.id, session.stage);
        logger.log_request(self.config.cutout_mode.as_str());
        let cutout = self
            .fetch_cutout(input)
            .instrument(logger.create_span())
            .await?;

        session.cutout = Some(cutout.clone());
        session.identification = None;
        Ok(cutout)
    }

    async fn identify_step(&self, session: &mut FlowSession) -> FlowResult<IdentificationResult> {
        let cutout = session
            .cutout
            .as_ref()
            .ok_or_else(|| FlowError::validation("Generate a cutout before identifying"))?;

        let logger = SessionLogger::new(&session.id, session.stage);
        logger.log_request("identify");
        let candidates = self
            .fetch_identification(cutout)
            .instrument(logger.create_span())
            .await?;

        let identification =
            IdentificationResult::from_candidates(candidates, &self.config.preselect);
        session.identification = Some(identification.clone());
        Ok(identification)
    }

    async fn save_step(&self, session: &mut FlowSession) -> FlowResult<()> {
        let (cutout, identification) = match (&session.cutout, &session.identification) {
            (Some(c), Some(i)) => (c, i),
            _ => {
                return Err(FlowError::validation(
                    "A cutout and its labels are required before saving",
                ))
            }
        };

        let logger = SessionLogger::new(&session.id, session.stage);
        logger.log_request("save");
        let saved = self
            .persist(cutout, identification)
            .instrument(logger.create_span())
            .await?;

        info!(
            session_id = %session.id,
            item_id = ?saved.id,
            clothing_type = %saved.item.clothing_type,
            "Item saved to wardrobe"
        );
        metrics::record_item_saved();
        session.saved = Some(saved);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Requesters
    // ------------------------------------------------------------------

    /// Cutout Requester. No caching: identical input calls the backend again.
    pub async fn fetch_cutout(&self, input: CutoutInput<'_>) -> FlowResult<CutoutImage> {
        let cutout = match input {
            CutoutInput::Selection { image, mask, paths } => {
                if paths.is_empty() {
                    return Err(FlowError::validation(
                        "Select at least one region before generating a cutout",
                    ));
                }
                self.client.cutout_from_mask(image, mask, paths).await?
            }
            CutoutInput::Click { image, point } => self.client.cutout_from_click(image, point).await?,
        };
        Ok(cutout)
    }

    /// Identification Requester. Refuses an empty cutout.
    pub async fn fetch_identification(&self, cutout: &CutoutImage) -> FlowResult<FacetCandidates> {
        if cutout.is_empty() {
            return Err(FlowError::validation("Generate a cutout before identifying"));
        }
        Ok(self.client.identify(cutout).await?)
    }

    /// Persistence Requester. Refuses an incomplete identification.
    pub async fn persist(
        &self,
        cutout: &CutoutImage,
        identification: &IdentificationResult,
    ) -> FlowResult<SavedItem> {
        if cutout.is_empty() {
            return Err(FlowError::validation("Generate a cutout before saving"));
        }
        if !identification.is_complete() {
            return Err(FlowError::validation(
                "All four labels must be set before saving",
            ));
        }

        let item = NewWardrobeItem::new(cutout, identification);
        let id = self.client.save(&item).await?;
        Ok(SavedItem { id, item })
    }

    /// Record the outcome on the session: the error message on failure,
    /// nothing on success.
    fn settle<T>(
        &self,
        session: &mut FlowSession,
        operation: &'static str,
        result: FlowResult<T>,
    ) -> FlowResult<T> {
        session.touch();
        match &result {
            Ok(_) => session.last_error = None,
            Err(e) => {
                let logger = SessionLogger::new(&session.id, session.stage);
                let message = e.user_message();
                if e.is_validation() {
                    logger.log_validation(&message);
                    metrics::record_validation_failure(operation);
                } else {
                    logger.log_error(&e.to_string());
                    if let FlowError::Backend(b) = e {
                        metrics::record_backend_failure(operation, b);
                    }
                }
                session.last_error = Some(message);
            }
        }
        result
    }
}

/// Stages in which the region selection may change.
const SELECTING: &[FlowStage] = &[FlowStage::Upload, FlowStage::Cutout];

fn require_stage(
    session: &FlowSession,
    operation: &'static str,
    allowed: &[FlowStage],
) -> FlowResult<()> {
    if allowed.contains(&session.stage) {
        Ok(())
    } else {
        Err(FlowError::WrongStage {
            operation,
            stage: session.stage,
        })
    }
}

fn toggle_inner(session: &mut FlowSession, region: RegionId) -> FlowResult<bool> {
    require_stage(session, "change the selection", SELECTING)?;
    let overlay = session
        .overlay
        .as_mut()
        .ok_or_else(|| FlowError::validation("Upload an image first"))?;
    let selected = overlay.toggle(region)?;

    // The cutout no longer matches the selection
    if session.stage == FlowStage::Cutout {
        session.cutout = None;
    }
    Ok(selected)
}

fn set_labels_inner(
    session: &mut FlowSession,
    update: LabelUpdate,
    options: Option<&FashionOptions>,
) -> FlowResult<IdentificationResult> {
    require_stage(session, "change labels", &[FlowStage::Identify])?;
    let identification = session
        .identification
        .as_mut()
        .ok_or_else(|| FlowError::validation("Identify the garment before changing labels"))?;
    identification.apply(update, options)?;
    Ok(identification.clone())
}
