//! Add-item flow stages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage of one add-item session. Transitions are strictly forward;
/// `Complete` wraps around to `Upload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    /// Choose an image and receive its segmentation
    #[default]
    Upload,
    /// Pick regions (or click) to produce a cutout
    Cutout,
    /// Review and adjust the suggested labels
    Identify,
    /// Persist the labelled cutout
    Save,
    /// Item saved; the next confirmation starts a new cycle
    Complete,
}

impl FlowStage {
    /// Stages shown on the timeline bar, in order.
    pub const TIMELINE: &'static [FlowStage] = &[
        FlowStage::Upload,
        FlowStage::Cutout,
        FlowStage::Identify,
        FlowStage::Save,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStage::Upload => "upload",
            FlowStage::Cutout => "cutout",
            FlowStage::Identify => "identify",
            FlowStage::Save => "save",
            FlowStage::Complete => "complete",
        }
    }

    /// Human-readable title for the timeline bar.
    pub fn title(&self) -> &'static str {
        match self {
            FlowStage::Upload => "Upload & Segmentation",
            FlowStage::Cutout => "Cutout Generation",
            FlowStage::Identify => "Clothing Identification",
            FlowStage::Save => "Save to Wardrobe",
            FlowStage::Complete => "Complete",
        }
    }

    /// Zero-based timeline position.
    pub fn index(&self) -> usize {
        match self {
            FlowStage::Upload => 0,
            FlowStage::Cutout => 1,
            FlowStage::Identify => 2,
            FlowStage::Save => 3,
            FlowStage::Complete => 4,
        }
    }

    /// The stage reached by a successful confirmation.
    pub fn next(&self) -> FlowStage {
        match self {
            FlowStage::Upload => FlowStage::Cutout,
            FlowStage::Cutout => FlowStage::Identify,
            FlowStage::Identify => FlowStage::Save,
            FlowStage::Save => FlowStage::Complete,
            FlowStage::Complete => FlowStage::Upload,
        }
    }
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_cycle() {
        let mut stage = FlowStage::default();
        let mut seen = vec![stage];
        for _ in 0..5 {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                FlowStage::Upload,
                FlowStage::Cutout,
                FlowStage::Identify,
                FlowStage::Save,
                FlowStage::Complete,
                FlowStage::Upload,
            ]
        );
    }

    #[test]
    fn test_index_matches_timeline() {
        for (i, stage) in FlowStage::TIMELINE.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&FlowStage::Identify).unwrap(), "\"identify\"");
    }
}
