//! API integration tests against a mock wardrobe backend.

use std::io::Cursor;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use serde_json::{json, Value};
use tokio_test::assert_ok;
use tower::ServiceExt;
use wardrobe_api::{create_router, ApiConfig, AppState};
use wardrobe_client::{WardrobeClient, WardrobeClientConfig, WidgetClient, WidgetClientConfig};
use wardrobe_flow::FlowConfig;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_base64() -> String {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(400, 300))
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    STANDARD.encode(bytes)
}

fn build(server: &MockServer, flow: FlowConfig) -> (Router, AppState) {
    let client =
        WardrobeClient::new(WardrobeClientConfig::default().with_base_url(server.uri())).unwrap();
    let widget = WidgetClient::new(WidgetClientConfig {
        geocoder_url: server.uri(),
        weather_url: server.uri(),
        ..Default::default()
    })
    .unwrap();

    let state = AppState::with_clients(ApiConfig::default(), flow, client, widget);
    (create_router(state.clone(), None), state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    // Extractor rejections answer in plain text
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn new_session(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["stage"], "upload");
    body["id"].as_str().unwrap().to_string()
}

async fn mount_upload(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "mask": "",
            "polygons": ["M0 0L10 0L10 10Z", "M20 20L40 20L40 40Z"]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_health_and_headers() {
    let server = MockServer::start().await;
    let (app, _) = build(&server, FlowConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-1");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_ready_reflects_backend_health() {
    let server = MockServer::start().await;
    let (app, _) = build(&server, FlowConfig::default());

    // No /health mock yet: wiremock answers 404
    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"]["status"], "ok");
}

#[tokio::test]
async fn test_metrics_route_absent_without_recorder() {
    let server = MockServer::start().await;
    let (app, _) = build(&server, FlowConfig::default());

    let (status, _) = send(&app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_lookup_errors() {
    let server = MockServer::start().await;
    let (app, _) = build(&server, FlowConfig::default());

    let (status, _) = send(&app, Method::GET, "/api/sessions/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/sessions/550e8400-e29b-41d4-a716-446655440000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let id = new_session(&app).await;
    let (status, _) = send(&app, Method::DELETE, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_item_over_http() {
    let server = MockServer::start().await;
    mount_upload(&server).await;

    Mock::given(method("POST"))
        .and(path("/save-selection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "cutoutBase64": "abc"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/identify-image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "clothingType": [{ "label": "Shirt", "confidence": 0.9 }],
            "colors": [{ "label": "blue", "confidence": 0.8 }],
            "pattern": [{ "label": "plain", "confidence": 0.7 }],
            "style": [{ "label": "casual", "confidence": 0.6 }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/save-to-wardrobe"))
        .and(body_json(json!({
            "cutoutBase64": "abc",
            "clothingType": "Shirt",
            "colors": ["white"],
            "pattern": "plain",
            "style": "casual"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "id": "42" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (app, _) = build(
        &server,
        FlowConfig {
            save_complete_delay: Duration::from_millis(50),
            ..Default::default()
        },
    );
    let id = new_session(&app).await;
    let base = format!("/api/sessions/{id}");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("{base}/image"),
        Some(json!({ "imageBase64": png_base64(), "filename": "photo.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["regionCount"], 2);
    assert_eq!(body["image"]["dimensions"]["width"], 400);

    let overlay = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("{base}/overlay"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(overlay.headers()[header::CONTENT_TYPE], "image/svg+xml");
    let svg = axum::body::to_bytes(overlay.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&svg).contains("<svg"));

    let (_, body) = send(&app, Method::POST, &format!("{base}/confirm"), None).await;
    assert_eq!(body["outcome"], "advanced");
    assert_eq!(body["session"]["stage"], "cutout");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("{base}/regions/1/toggle"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected"], true);
    assert_eq!(body["session"]["selected"], json!([1]));

    let (_, body) = send(&app, Method::POST, &format!("{base}/confirm"), None).await;
    assert_eq!(body["session"]["stage"], "identify");
    assert_eq!(body["session"]["cutoutBase64"], "abc");

    let (_, body) = send(&app, Method::POST, &format!("{base}/confirm"), None).await;
    assert_eq!(body["outcome"], "pending");
    assert_eq!(body["session"]["identification"]["clothingType"], "Shirt");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("{base}/labels"),
        Some(json!({ "colors": ["white"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identification"]["colors"], json!(["white"]));

    let (_, body) = send(&app, Method::POST, &format!("{base}/confirm"), None).await;
    assert_eq!(body["session"]["stage"], "save");

    let (status, body) = send(&app, Method::POST, &format!("{base}/confirm"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["stage"], "complete");
    assert_eq!(body["session"]["savedItemId"], "42");

    // Complete resets on its own after the configured delay
    tokio::time::sleep(Duration::from_millis(300)).await;
    let (_, body) = send(&app, Method::GET, &base, None).await;
    assert_eq!(body["stage"], "upload");
    assert!(body["image"].is_null());
}

#[tokio::test]
async fn test_validation_blocks_backend_call() {
    let server = MockServer::start().await;
    mount_upload(&server).await;
    Mock::given(method("POST"))
        .and(path("/save-selection"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = build(&server, FlowConfig::default());
    let id = new_session(&app).await;
    let base = format!("/api/sessions/{id}");

    let (status, body) = send(&app, Method::POST, &format!("{base}/confirm"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation");

    let (_, body) = send(&app, Method::GET, &base, None).await;
    assert_eq!(body["lastError"], "Upload an image before continuing");

    send(
        &app,
        Method::POST,
        &format!("{base}/image"),
        Some(json!({ "imageBase64": png_base64() })),
    )
    .await;
    send(&app, Method::POST, &format!("{base}/confirm"), None).await;

    // Cutout with nothing selected
    let (status, body) = send(&app, Method::POST, &format!("{base}/cutout"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["detail"],
        "Select at least one region before generating a cutout"
    );

    let (status, _) = send(&app, Method::POST, &format!("{base}/regions/9/toggle"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_undecodable_upload_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = build(&server, FlowConfig::default());
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/image"),
        Some(json!({ "imageBase64": STANDARD.encode(b"not an image") })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn test_backend_rejection_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "No garment found in image"
        })))
        .mount(&server)
        .await;

    let (app, _) = build(&server, FlowConfig::default());
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/image"),
        Some(json!({ "imageBase64": png_base64() })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "backend_rejected");
    assert_eq!(body["detail"], "No garment found in image");

    let (_, body) = send(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(body["stage"], "upload");
    assert_eq!(body["lastError"], "No garment found in image");
}

#[tokio::test]
async fn test_busy_session_is_rejected() {
    let server = MockServer::start().await;
    let (app, state) = build(&server, FlowConfig::default());
    let id = new_session(&app).await;

    let guard = assert_ok!(state.sessions.acquire(id.parse().unwrap()).await);
    let (status, body) = send(&app, Method::POST, &format!("/api/sessions/{id}/confirm"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "busy");
    drop(guard);

    let (status, _) = send(&app, Method::POST, &format!("/api/sessions/{id}/reset"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_wardrobe_list_filter_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clothing-items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "41", "imageBase64": "eA==", "clothingType": "Jeans", "colors": ["blue"] },
                { "id": "42", "imageBase64": "eQ==", "clothingType": "Shirt", "colors": ["white"] }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/clothing-items/42"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/clothing-items/41"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let (app, _) = build(&server, FlowConfig::default());

    let (status, body) = send(&app, Method::GET, "/api/wardrobe?type=shirt", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], "42");

    let (_, body) = send(&app, Method::GET, "/api/wardrobe?color=BLUE", None).await;
    assert_eq!(body["items"][0]["id"], "41");

    let (status, body) = send(&app, Method::DELETE, "/api/wardrobe/42", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "backend_error");

    let (status, _) = send(&app, Method::DELETE, "/api/wardrobe/41", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_fashion_options_proxy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fashion-options"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clothingTypes": ["Shirt"],
            "colors": ["blue"],
            "patterns": ["plain"],
            "styles": ["casual"]
        })))
        .mount(&server)
        .await;

    let (app, state) = build(&server, FlowConfig::default());
    let (status, body) = send(&app, Method::GET, "/api/fashion-options", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clothingTypes"], json!(["Shirt"]));
    assert!(state.controller.options().await.is_some());
}

#[tokio::test]
async fn test_widget_and_outfit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": { "city": "Leeds" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("current_weather", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current_weather": { "temperature": 9.0 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/suggest-outfit"))
        .and(body_json(json!({ "city": "Leeds", "weather": 9.0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "suggested_outfit": "Wool coat over a knit jumper"
        })))
        .mount(&server)
        .await;

    let (app, _) = build(&server, FlowConfig::default());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/widget",
        Some(json!({ "latitude": 123.0, "longitude": 0.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, widget) = send(
        &app,
        Method::POST,
        "/api/widget",
        Some(json!({ "latitude": 53.8, "longitude": -1.55 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(widget["city"], "Leeds");
    assert_eq!(widget["weather"]["temperature"], 9.0);

    let leeds = new_session(&app).await;
    let other = new_session(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{leeds}/outfit"),
        Some(widget),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestion"], "Wool coat over a knit jumper");

    let (_, messages) = send(&app, Method::GET, &format!("/api/sessions/{leeds}/outfit"), None).await;
    assert_eq!(messages.as_array().map(Vec::len), Some(1));
    assert_eq!(messages[0]["failed"], false);

    // Conversations are per session
    let (status, messages) =
        send(&app, Method::GET, &format!("/api/sessions/{other}/outfit"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages, json!([]));

    let (status, _) = send(&app, Method::DELETE, &format!("/api/sessions/{leeds}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/api/sessions/{leeds}/outfit"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
