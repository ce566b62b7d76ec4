//! Add-item session handlers.
//!
//! Mutating routes take the session through the registry's single-flight
//! guard and answer with the resulting snapshot. Reads wait for any
//! in-flight request instead of being rejected.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use wardrobe_flow::{acquire_base64, OverlayState, SessionSnapshot};
use wardrobe_models::{Dimensions, ImagePayload, LabelUpdate, Point, RegionId, SessionId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Used when the client sends no filename.
const DEFAULT_FILENAME: &str = "upload";

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionSnapshot>) {
    (StatusCode::CREATED, Json(state.sessions.create().await))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<SessionSnapshot>> {
    Ok(Json(state.sessions.snapshot(id).await?))
}

/// Abandon a session and everything it produced.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<StatusCode> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageRequest {
    /// Raw base64 or a `data:` URL
    pub image_base64: String,
    #[serde(default)]
    pub filename: Option<String>,
}

pub async fn upload_image(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(request): Json<UploadImageRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    let mut session = state.sessions.acquire(id).await?;

    let filename = request
        .filename
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(DEFAULT_FILENAME);
    let image = match acquire_base64(ImagePayload::from_base64(request.image_base64), filename) {
        Ok(image) => image,
        Err(e) => {
            session.last_error = Some(e.user_message());
            return Err(e.into());
        }
    };

    state.controller.upload(&mut session, image).await?;
    Ok(Json(session.snapshot()))
}

/// Segmentation outlines as an SVG sized to the image's natural pixels.
pub async fn get_overlay(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Response> {
    let svg = state
        .sessions
        .read(id, |session| session.overlay.as_ref().map(OverlayState::render_svg))
        .await?
        .ok_or_else(|| ApiError::not_found("No image has been segmented in this session"))?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub region: RegionId,
    pub selected: bool,
    pub session: SessionSnapshot,
}

pub async fn toggle_region(
    State(state): State<AppState>,
    Path((id, region)): Path<(SessionId, usize)>,
) -> ApiResult<Json<ToggleResponse>> {
    let mut session = state.sessions.acquire(id).await?;
    let region = RegionId(region);
    let selected = state.controller.toggle_region(&mut session, region).await?;

    Ok(Json(ToggleResponse {
        region,
        selected,
        session: session.snapshot(),
    }))
}

pub async fn deselect_all(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<SessionSnapshot>> {
    let mut session = state.sessions.acquire(id).await?;
    state.controller.deselect_all(&mut session).await?;
    Ok(Json(session.snapshot()))
}

/// A click on the image as displayed by the client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRequest {
    pub x: f64,
    pub y: f64,
    pub displayed_width: u32,
    pub displayed_height: u32,
}

pub async fn click(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(request): Json<ClickRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    let mut session = state.sessions.acquire(id).await?;
    state
        .controller
        .click(
            &mut session,
            Point::new(request.x, request.y),
            Dimensions::new(request.displayed_width, request.displayed_height),
        )
        .await?;
    Ok(Json(session.snapshot()))
}

pub async fn request_cutout(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<SessionSnapshot>> {
    let mut session = state.sessions.acquire(id).await?;
    state.controller.request_cutout(&mut session).await?;
    Ok(Json(session.snapshot()))
}

pub async fn request_identification(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<SessionSnapshot>> {
    let mut session = state.sessions.acquire(id).await?;
    state.controller.request_identification(&mut session).await?;
    Ok(Json(session.snapshot()))
}

pub async fn set_labels(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(update): Json<LabelUpdate>,
) -> ApiResult<Json<SessionSnapshot>> {
    if update.is_empty() {
        return Err(ApiError::bad_request("No labels given"));
    }

    let mut session = state.sessions.acquire(id).await?;
    state.controller.set_labels(&mut session, update).await?;
    Ok(Json(session.snapshot()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    /// `advanced` or `pending` (labels fetched, awaiting review)
    pub outcome: &'static str,
    pub session: SessionSnapshot,
}

pub async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<ConfirmResponse>> {
    let mut session = state.sessions.acquire(id).await?;
    let outcome = state.controller.confirm(&mut session).await?;

    if outcome.saved() {
        let delay = state.controller.config().save_complete_delay;
        info!(session_id = %id, delay_ms = delay.as_millis() as u64, "Scheduling reset after save");
        state.sessions.schedule_reset(id, session.cycle, delay);
    }

    Ok(Json(ConfirmResponse {
        outcome: outcome.as_str(),
        session: session.snapshot(),
    }))
}

/// Abandon the current cycle but keep the session.
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<SessionSnapshot>> {
    let mut session = state.sessions.acquire(id).await?;
    state.controller.reset(&mut session);
    Ok(Json(session.snapshot()))
}
