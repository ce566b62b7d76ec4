//! Add-item workflow for the wardrobe session service.
//!
//! - [`FlowController`]: the `Upload -> Cutout -> Identify -> Save -> Complete`
//!   state machine and its cutout / identification / persistence requesters
//! - [`OverlayState`]: segmentation overlay and region selection
//! - [`SessionRegistry`]: in-memory sessions with a per-session
//!   single-flight guard
//! - [`WardrobeGallery`] and [`OutfitAdvisor`]: read paths outside the flow

pub mod acquire;
pub mod config;
pub mod controller;
pub mod error;
pub mod gallery;
pub mod logging;
pub mod metrics;
pub mod outfit;
pub mod overlay;
pub mod registry;
pub mod session;

pub use acquire::{acquire, acquire_base64, acquire_path};
pub use config::{BusyPolicy, ClickSpace, CutoutMode, FlowConfig};
pub use controller::{ConfirmOutcome, CutoutInput, FlowController};
pub use error::{FlowError, FlowResult};
pub use gallery::WardrobeGallery;
pub use logging::SessionLogger;
pub use outfit::{
    OutfitAdvisor, OutfitLog, OutfitMessage, MAX_OUTFIT_MESSAGES, NO_SUGGESTION, SUGGESTION_FAILED,
};
pub use overlay::OverlayState;
pub use registry::{SessionGuard, SessionRegistry};
pub use session::{FlowSession, SavedItem, SessionSnapshot};
