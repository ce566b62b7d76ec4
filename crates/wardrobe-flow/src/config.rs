//! Flow configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wardrobe_models::PreselectPolicy;

/// Which cutout protocol the backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoutMode {
    /// Selected region paths plus the segmentation mask (`/save-selection`)
    #[default]
    MaskSelection,
    /// A single click point (`/create-segmented-image`)
    ClickPoint,
}

impl CutoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CutoutMode::MaskSelection => "mask_selection",
            CutoutMode::ClickPoint => "click_point",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "mask_selection" | "mask" | "selection" => Some(CutoutMode::MaskSelection),
            "click_point" | "click" => Some(CutoutMode::ClickPoint),
            _ => None,
        }
    }
}

/// Pixel space click coordinates are sent in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickSpace {
    /// Scaled into the image's natural pixel space
    #[default]
    Natural,
    /// Forwarded as clicked, in displayed pixels
    Displayed,
}

impl ClickSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClickSpace::Natural => "natural",
            ClickSpace::Displayed => "displayed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "natural" => Some(ClickSpace::Natural),
            "displayed" => Some(ClickSpace::Displayed),
            _ => None,
        }
    }
}

/// What happens to a request for a session that already has one in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Fail immediately
    #[default]
    Reject,
    /// Wait for the outstanding request to finish
    Queue,
}

impl BusyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusyPolicy::Reject => "reject",
            BusyPolicy::Queue => "queue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reject" => Some(BusyPolicy::Reject),
            "queue" => Some(BusyPolicy::Queue),
            _ => None,
        }
    }
}

/// Flow configuration.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub cutout_mode: CutoutMode,
    pub click_space: ClickSpace,
    pub preselect: PreselectPolicy,
    /// How long `Complete` stays visible before the session resets
    pub save_complete_delay: Duration,
    pub busy_policy: BusyPolicy,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            cutout_mode: CutoutMode::MaskSelection,
            click_space: ClickSpace::Natural,
            preselect: PreselectPolicy::default(),
            save_complete_delay: Duration::from_millis(2000),
            busy_policy: BusyPolicy::Reject,
        }
    }
}

impl FlowConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cutout_mode: std::env::var("CUTOUT_MODE")
                .ok()
                .and_then(|s| CutoutMode::parse(&s))
                .unwrap_or(defaults.cutout_mode),
            click_space: std::env::var("CLICK_COORDINATES")
                .ok()
                .and_then(|s| ClickSpace::parse(&s))
                .unwrap_or(defaults.click_space),
            preselect: PreselectPolicy {
                colour_top_n: std::env::var("COLOUR_TOP_N")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(defaults.preselect.colour_top_n),
            },
            save_complete_delay: Duration::from_millis(
                std::env::var("SAVE_COMPLETE_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
            busy_policy: std::env::var("BUSY_POLICY")
                .ok()
                .and_then(|s| BusyPolicy::parse(&s))
                .unwrap_or(defaults.busy_policy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FlowConfig::default();
        assert_eq!(config.cutout_mode, CutoutMode::MaskSelection);
        assert_eq!(config.click_space, ClickSpace::Natural);
        assert_eq!(config.preselect.colour_top_n, 1);
        assert_eq!(config.save_complete_delay, Duration::from_secs(2));
        assert_eq!(config.busy_policy, BusyPolicy::Reject);
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(CutoutMode::parse("click-point"), Some(CutoutMode::ClickPoint));
        assert_eq!(CutoutMode::parse("MASK"), Some(CutoutMode::MaskSelection));
        assert_eq!(ClickSpace::parse("Displayed"), Some(ClickSpace::Displayed));
        assert_eq!(BusyPolicy::parse("queue"), Some(BusyPolicy::Queue));
        assert_eq!(BusyPolicy::parse("drop"), None);
    }
}
