//! Application state.

use std::sync::Arc;

use wardrobe_client::{BackendResult, WardrobeClient, WidgetClient};
use wardrobe_flow::{FlowConfig, FlowController, OutfitAdvisor, SessionRegistry, WardrobeGallery};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub controller: Arc<FlowController>,
    pub sessions: SessionRegistry,
    pub gallery: Arc<WardrobeGallery>,
    pub advisor: Arc<OutfitAdvisor>,
    pub widget: Arc<WidgetClient>,
}

impl AppState {
    /// Create new application state from the environment.
    pub fn new(config: ApiConfig) -> BackendResult<Self> {
        let client = WardrobeClient::from_env()?;
        let widget = WidgetClient::from_env()?;
        Ok(Self::with_clients(config, FlowConfig::from_env(), client, widget))
    }

    /// Assemble state around already-built clients.
    pub fn with_clients(
        config: ApiConfig,
        flow: FlowConfig,
        client: WardrobeClient,
        widget: WidgetClient,
    ) -> Self {
        let client = Arc::new(client);
        let sessions = SessionRegistry::new(flow.busy_policy);

        Self {
            config,
            controller: Arc::new(FlowController::new(Arc::clone(&client), flow)),
            sessions,
            gallery: Arc::new(WardrobeGallery::new(Arc::clone(&client))),
            advisor: Arc::new(OutfitAdvisor::new(client)),
            widget: Arc::new(widget),
        }
    }
}
