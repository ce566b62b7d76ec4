//! Widget context and outfit suggestion handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use wardrobe_flow::OutfitMessage;
use wardrobe_models::{SessionId, WidgetContext};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WidgetRequest {
    pub latitude: f64,
    pub longitude: f64,
}

/// City and current temperature for a position. Lookup failures leave the
/// matching half empty rather than failing the request.
pub async fn widget(
    State(state): State<AppState>,
    Json(request): Json<WidgetRequest>,
) -> ApiResult<Json<WidgetContext>> {
    if !(-90.0..=90.0).contains(&request.latitude) || !(-180.0..=180.0).contains(&request.longitude)
    {
        return Err(ApiError::bad_request("Coordinates out of range"));
    }

    Ok(Json(
        state.widget.fetch(request.latitude, request.longitude).await,
    ))
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub suggestion: String,
}

/// Ask for an outfit and append the reply to the session's conversation.
pub async fn suggest_outfit(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(context): Json<WidgetContext>,
) -> ApiResult<Json<SuggestionResponse>> {
    let mut session = state.sessions.acquire(id).await?;
    session.touch();
    let suggestion = state
        .advisor
        .suggest(&mut session.outfit_log, &context)
        .await?;
    Ok(Json(SuggestionResponse { suggestion }))
}

/// The session's suggestions (and failure notices), oldest first.
pub async fn outfit_messages(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<Vec<OutfitMessage>>> {
    let messages = state.sessions.read(id, |s| s.outfit_log.to_vec()).await?;
    Ok(Json(messages))
}
