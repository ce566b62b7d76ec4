//! Ambient location/weather context used by outfit suggestions.

use serde::{Deserialize, Serialize};

/// Placeholder city when geocoding is unavailable.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Degrees Celsius.
    pub temperature: f64,
}

/// City + weather snapshot. Either half may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WidgetContext {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub weather: Option<Weather>,
}

impl WidgetContext {
    /// City for display and prompts.
    pub fn city_or_unknown(&self) -> &str {
        self.city
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNKNOWN_LOCATION)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.weather.map(|w| w.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_fallback() {
        assert_eq!(WidgetContext::default().city_or_unknown(), UNKNOWN_LOCATION);
        let ctx = WidgetContext {
            city: Some("Leeds".into()),
            weather: Some(Weather { temperature: 11.5 }),
        };
        assert_eq!(ctx.city_or_unknown(), "Leeds");
        assert_eq!(ctx.temperature(), Some(11.5));
    }
}
