//! Flow error types.

use thiserror::Error;
use wardrobe_client::BackendError;
use wardrobe_models::identification::LabelError;
use wardrobe_models::{FlowStage, RegionId, SessionId};

pub type FlowResult<T> = Result<T, FlowError>;

#[derive(Debug, Error)]
pub enum FlowError {
    /// A prerequisite artifact is missing; nothing was sent.
    #[error("{0}")]
    Validation(String),

    #[error("Cannot {operation} during the {stage} stage")]
    WrongStage {
        operation: &'static str,
        stage: FlowStage,
    },

    #[error("Unknown region {0}")]
    UnknownRegion(RegionId),

    #[error("Could not read image: {0}")]
    ImageDecode(String),

    #[error("Session {0} already has a request in flight")]
    Busy(SessionId),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlowError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn image_decode(msg: impl Into<String>) -> Self {
        Self::ImageDecode(msg.into())
    }

    /// Blocked locally, before any backend call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FlowError::Validation(_)
                | FlowError::WrongStage { .. }
                | FlowError::UnknownRegion(_)
                | FlowError::ImageDecode(_)
                | FlowError::Label(_)
        ) || matches!(self, FlowError::Backend(e) if e.is_local())
    }

    /// Text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            FlowError::Backend(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
