//! Wardrobe gallery and label vocabulary handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use wardrobe_models::{FashionOptions, GalleryFilter, ItemId, WardrobeItem};

use crate::error::ApiResult;
use crate::state::AppState;

/// Label vocabularies. Also refreshes the cache used to check overrides.
pub async fn fashion_options(State(state): State<AppState>) -> ApiResult<Json<FashionOptions>> {
    Ok(Json(state.controller.load_options().await?))
}

#[derive(Debug, Serialize)]
pub struct WardrobeListResponse {
    pub items: Vec<WardrobeItem>,
    pub total: usize,
}

/// Refetch the wardrobe, then apply `?type=&color=`.
pub async fn list_wardrobe(
    State(state): State<AppState>,
    Query(filter): Query<GalleryFilter>,
) -> ApiResult<Json<WardrobeListResponse>> {
    state.gallery.load().await?;
    let items = state.gallery.filter(&filter).await;

    Ok(Json(WardrobeListResponse {
        total: items.len(),
        items,
    }))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.gallery.delete(&ItemId::from_string(item_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
