//! Flow metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder. Without a recorder these are no-ops.

use metrics::{counter, gauge};
use wardrobe_client::BackendError;

/// Metric names as constants for consistency.
pub mod names {
    pub const STAGE_TRANSITIONS_TOTAL: &str = "wardrobe_stage_transitions_total";
    pub const BACKEND_FAILURES_TOTAL: &str = "wardrobe_backend_failures_total";
    pub const VALIDATION_FAILURES_TOTAL: &str = "wardrobe_validation_failures_total";
    pub const ITEMS_SAVED_TOTAL: &str = "wardrobe_items_saved_total";
    pub const SESSIONS_ACTIVE: &str = "wardrobe_sessions_active";
    pub const SESSIONS_BUSY_REJECTED_TOTAL: &str = "wardrobe_sessions_busy_rejected_total";
}

pub fn record_stage_transition(from: &str, to: &str) {
    let labels = [("from", from.to_string()), ("to", to.to_string())];
    counter!(names::STAGE_TRANSITIONS_TOTAL, &labels).increment(1);
}

/// Record a failed backend call, labelled by failure kind.
pub fn record_backend_failure(operation: &str, err: &BackendError) {
    let labels = [
        ("operation", operation.to_string()),
        ("kind", failure_kind(err).to_string()),
    ];
    counter!(names::BACKEND_FAILURES_TOTAL, &labels).increment(1);
}

fn failure_kind(err: &BackendError) -> &'static str {
    match err {
        BackendError::Rejected(_) => "rejected",
        e if e.is_transport() => "transport",
        e if e.is_local() => "payload",
        BackendError::Status { .. } => "status",
        _ => "invalid_response",
    }
}

pub fn record_validation_failure(operation: &str) {
    let labels = [("operation", operation.to_string())];
    counter!(names::VALIDATION_FAILURES_TOTAL, &labels).increment(1);
}

pub fn record_item_saved() {
    counter!(names::ITEMS_SAVED_TOTAL).increment(1);
}

pub fn set_active_sessions(count: usize) {
    gauge!(names::SESSIONS_ACTIVE).set(count as f64);
}

pub fn record_busy_rejection() {
    counter!(names::SESSIONS_BUSY_REJECTED_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind() {
        assert_eq!(failure_kind(&BackendError::rejected("no")), "rejected");
        assert_eq!(failure_kind(&BackendError::Timeout(5)), "transport");
        assert_eq!(failure_kind(&BackendError::from_http_status(500, "")), "status");
    }
}
