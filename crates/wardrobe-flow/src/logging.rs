//! Structured session logging.
//!
//! Gives every flow log line the same `session_id` and `stage` fields.

use tracing::{error, info, warn, Span};
use wardrobe_models::{FlowStage, SessionId};

/// Logger bound to one session at one stage.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    stage: FlowStage,
}

impl SessionLogger {
    pub fn new(session_id: &SessionId, stage: FlowStage) -> Self {
        Self {
            session_id: session_id.to_string(),
            stage,
        }
    }

    /// Log a backend request being issued.
    pub fn log_request(&self, operation: &str) {
        info!(
            session_id = %self.session_id,
            stage = %self.stage,
            operation,
            "Session request: {}", operation
        );
    }

    /// Log a stage transition.
    pub fn log_transition(&self, to: FlowStage) {
        info!(
            session_id = %self.session_id,
            stage = %self.stage,
            to = %to,
            "Session advanced: {} -> {}", self.stage, to
        );
    }

    /// Log a locally blocked operation.
    pub fn log_validation(&self, message: &str) {
        warn!(
            session_id = %self.session_id,
            stage = %self.stage,
            "Session validation failed: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            session_id = %self.session_id,
            stage = %self.stage,
            "Session error: {}", message
        );
    }

    /// Span carrying the session fields, for wrapping backend calls.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "session",
            session_id = %self.session_id,
            stage = %self.stage
        )
    }
}
