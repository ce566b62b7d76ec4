//! Backend client error types.

use thiserror::Error;
use wardrobe_models::PayloadError;

pub type BackendResult<T> = Result<T, BackendError>;

/// Message shown for transport failures, where there is no server text.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "An error occurred while contacting the wardrobe service.";

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request could not be built from the local payload; nothing was sent.
    #[error("Invalid image payload: {0}")]
    Payload(#[from] PayloadError),
}

impl BackendError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Build from a non-success HTTP status and the server's error text.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Fetch rejected before any response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Network(_) | BackendError::Timeout(_))
    }

    /// Failed before a request was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, BackendError::Payload(_))
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            BackendError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Text to show the user: server-provided strings verbatim, a generic
    /// message otherwise.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Rejected(msg) => msg.clone(),
            BackendError::Status { message, .. } if !message.trim().is_empty() => message.clone(),
            BackendError::Status { status, .. } => {
                format!("The wardrobe service returned an error ({status}).")
            }
            BackendError::InvalidResponse(_) | BackendError::Json(_) => {
                "The wardrobe service sent an unexpected response.".to_string()
            }
            BackendError::Timeout(_) | BackendError::Network(_) => {
                TRANSPORT_FAILURE_MESSAGE.to_string()
            }
            BackendError::Payload(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_verbatim() {
        let err = BackendError::rejected("Could not decode image: truncated");
        assert_eq!(err.user_message(), "Could not decode image: truncated");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_status_message() {
        let err = BackendError::from_http_status(400, "Missing cutoutBase64");
        assert_eq!(err.user_message(), "Missing cutoutBase64");
        assert_eq!(err.http_status(), Some(400));

        let bare = BackendError::from_http_status(500, "");
        assert_eq!(bare.user_message(), "The wardrobe service returned an error (500).");
    }

    #[test]
    fn test_timeout_is_transport() {
        let err = BackendError::Timeout(30);
        assert!(err.is_transport());
        assert_eq!(err.user_message(), TRANSPORT_FAILURE_MESSAGE);
    }
}
