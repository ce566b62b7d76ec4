//! Location and weather lookups for the widget context.
//!
//! Reverse geocoding uses a Nominatim-compatible `/reverse` endpoint and the
//! weather comes from an Open-Meteo-compatible `/v1/forecast` endpoint. The
//! two lookups are independent: one failing leaves only its half empty.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use wardrobe_models::{Weather, WidgetContext, UNKNOWN_LOCATION};

use crate::error::{BackendError, BackendResult};

/// Configuration for the widget lookups.
#[derive(Debug, Clone)]
pub struct WidgetClientConfig {
    pub geocoder_url: String,
    pub weather_url: String,
    pub timeout: Duration,
    /// Nominatim rejects requests without an identifying agent
    pub user_agent: String,
}

impl Default for WidgetClientConfig {
    fn default() -> Self {
        Self {
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            weather_url: "https://api.open-meteo.com".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("wardrobe/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl WidgetClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            geocoder_url: std::env::var("GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            weather_url: std::env::var("WEATHER_URL").unwrap_or(defaults.weather_url),
            timeout: std::env::var("WIDGET_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            user_agent: defaults.user_agent,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
}

/// Client for the city + weather snapshot.
pub struct WidgetClient {
    http: Client,
    config: WidgetClientConfig,
}

impl WidgetClient {
    pub fn new(config: WidgetClientConfig) -> BackendResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(BackendError::Network)?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> BackendResult<Self> {
        Self::new(WidgetClientConfig::from_env())
    }

    /// Fetch city and weather for a position. Never fails as a whole.
    pub async fn fetch(&self, latitude: f64, longitude: f64) -> WidgetContext {
        let (city, weather) = tokio::join!(
            self.city(latitude, longitude),
            self.weather(latitude, longitude)
        );

        WidgetContext {
            city: city
                .map_err(|e| warn!("Failed to fetch city name: {}", e))
                .ok(),
            weather: weather
                .map_err(|e| warn!("Failed to fetch weather data: {}", e))
                .ok()
                .flatten(),
        }
    }

    /// Reverse geocode to city, town or village name.
    pub async fn city(&self, latitude: f64, longitude: f64) -> BackendResult<String> {
        let url = format!("{}/reverse", self.config.geocoder_url.trim_end_matches('/'));
        debug!(latitude, longitude, "Reverse geocoding");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let body: ReverseResponse = response.json().await?;

        let name = body
            .address
            .and_then(|a| a.city.or(a.town).or(a.village))
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
        Ok(name)
    }

    /// Current temperature, if the service reports one.
    pub async fn weather(&self, latitude: f64, longitude: f64) -> BackendResult<Option<Weather>> {
        let url = format!("{}/v1/forecast", self.config.weather_url.trim_end_matches('/'));
        debug!(latitude, longitude, "Fetching current weather");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let body: ForecastResponse = response.json().await?;

        Ok(body.current_weather.map(|w| Weather {
            temperature: w.temperature,
        }))
    }
}
