//! API routes.

use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::error::hide_internal_details;
use crate::handlers::{
    click, confirm, create_session, delete_item, delete_session, deselect_all, fashion_options,
    get_overlay, get_session, health, list_wardrobe, outfit_messages, ready, request_cutout,
    request_identification, reset_session, set_labels, suggest_outfit, toggle_region,
    upload_image, widget,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    hide_internal_details(state.config.is_production());

    let session_routes = Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/image", post(upload_image))
        .route("/sessions/:id/overlay", get(get_overlay))
        .route("/sessions/:id/regions/:region/toggle", post(toggle_region))
        .route("/sessions/:id/selection", delete(deselect_all))
        .route("/sessions/:id/click", post(click))
        .route("/sessions/:id/cutout", post(request_cutout))
        .route("/sessions/:id/identify", post(request_identification))
        .route("/sessions/:id/labels", patch(set_labels))
        .route("/sessions/:id/confirm", post(confirm))
        .route("/sessions/:id/reset", post(reset_session))
        .route(
            "/sessions/:id/outfit",
            post(suggest_outfit).get(outfit_messages),
        );

    let wardrobe_routes = Router::new()
        .route("/fashion-options", get(fashion_options))
        .route("/wardrobe", get(list_wardrobe))
        .route("/wardrobe/:item_id", delete(delete_item));

    let api_routes = Router::new()
        .merge(session_routes)
        .merge(wardrobe_routes)
        .route("/widget", post(widget));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
