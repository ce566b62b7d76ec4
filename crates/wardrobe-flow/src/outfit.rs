//! Outfit suggestions from the widget context.
//!
//! Each session keeps its own [`OutfitLog`]; the advisor only talks to the
//! backend and appends to whichever log it is handed.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use wardrobe_client::WardrobeClient;
use wardrobe_models::WidgetContext;

use crate::error::FlowResult;
use crate::metrics;

/// Shown when the backend answers without a suggestion.
pub const NO_SUGGESTION: &str = "No outfit suggestions found.";

/// Logged in place of a suggestion when the request fails.
pub const SUGGESTION_FAILED: &str = "Error processing your request.";

/// Replies kept per session; older ones are dropped first.
pub const MAX_OUTFIT_MESSAGES: usize = 50;

/// One advisor reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitMessage {
    pub text: String,
    pub failed: bool,
    pub created_at: DateTime<Utc>,
}

/// Bounded conversation with the advisor, oldest first.
#[derive(Debug, Clone, Default)]
pub struct OutfitLog {
    messages: VecDeque<OutfitMessage>,
}

impl OutfitLog {
    pub fn push(&mut self, text: String, failed: bool) {
        if self.messages.len() == MAX_OUTFIT_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(OutfitMessage {
            text,
            failed,
            created_at: Utc::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn to_vec(&self) -> Vec<OutfitMessage> {
        self.messages.iter().cloned().collect()
    }
}

/// Requests outfit suggestions.
pub struct OutfitAdvisor {
    client: Arc<WardrobeClient>,
}

impl OutfitAdvisor {
    pub fn new(client: Arc<WardrobeClient>) -> Self {
        Self { client }
    }

    /// Ask for an outfit suited to `widget`'s city and temperature, recording
    /// the reply (or the failure notice) in `log`.
    pub async fn suggest(&self, log: &mut OutfitLog, widget: &WidgetContext) -> FlowResult<String> {
        let city = widget.city_or_unknown();
        let temperature = widget.temperature();
        info!(city, temperature = ?temperature, "Requesting outfit suggestion");

        match self.client.suggest_outfit(city, temperature).await {
            Ok(suggestion) => {
                let text = suggestion
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| NO_SUGGESTION.to_string());
                log.push(text.clone(), false);
                Ok(text)
            }
            Err(e) => {
                warn!(city, "Outfit suggestion failed: {}", e);
                metrics::record_backend_failure("suggest_outfit", &e);
                log.push(SUGGESTION_FAILED.to_string(), true);
                Err(e.into())
            }
        }
    }
}
