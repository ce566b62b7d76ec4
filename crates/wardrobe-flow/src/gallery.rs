//! Wardrobe gallery read path.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};
use wardrobe_client::WardrobeClient;
use wardrobe_models::{GalleryFilter, ItemId, WardrobeItem};

use crate::error::FlowResult;
use crate::metrics;

/// The displayed wardrobe list.
///
/// Deletes are pessimistic: an item leaves the list only once the backend
/// has confirmed the delete, and a failed delete is never retried.
pub struct WardrobeGallery {
    client: Arc<WardrobeClient>,
    items: RwLock<Vec<WardrobeItem>>,
}

impl WardrobeGallery {
    pub fn new(client: Arc<WardrobeClient>) -> Self {
        Self {
            client,
            items: RwLock::new(Vec::new()),
        }
    }

    /// Refetch the full list.
    pub async fn load(&self) -> FlowResult<Vec<WardrobeItem>> {
        let items = self.client.list_items().await?;
        info!(count = items.len(), "Wardrobe loaded");
        *self.items.write().await = items.clone();
        Ok(items)
    }

    /// Items as last loaded.
    pub async fn items(&self) -> Vec<WardrobeItem> {
        self.items.read().await.clone()
    }

    /// Loaded items matching `filter`.
    pub async fn filter(&self, filter: &GalleryFilter) -> Vec<WardrobeItem> {
        self.items
            .read()
            .await
            .iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect()
    }

    /// Delete an item, dropping it from the list only on success.
    pub async fn delete(&self, id: &ItemId) -> FlowResult<()> {
        if let Err(e) = self.client.delete_item(id).await {
            warn!(item_id = %id, "Failed to delete wardrobe item: {}", e);
            metrics::record_backend_failure("delete_item", &e);
            return Err(e.into());
        }

        self.items.write().await.retain(|item| &item.id != id);
        info!(item_id = %id, "Wardrobe item deleted");
        Ok(())
    }
}
