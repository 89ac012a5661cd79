//! API endpoint integration tests

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use sightline::api::{ApiServer, ApiState};
use sightline::assistant::SessionManager;
use sightline::config::DEFAULT_CORS_ORIGINS;
use tower::ServiceExt;

mod common;
use common::{
    CannedSearcher, Heard, RecordingOutput, ScriptedDevices, StaticSource, TextSynthesizer,
    capabilities, perception, person_on_left,
};

fn base_state() -> ApiState {
    ApiState::new(perception(
        Arc::new(StaticSource::new(640, 480)),
        person_on_left(),
        Duration::from_secs(1),
    ))
}

/// Build a test API router
fn build_test_router(state: ApiState) -> axum::Router {
    let server = ApiServer::new(state, 0, DEFAULT_CORS_ORIGINS).unwrap();
    server.router()
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(base_state());

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["camera_configured"], false);
    assert_eq!(json["assistant_available"], false);
}

#[tokio::test]
async fn test_set_camera_url_from_ip() {
    let app = build_test_router(base_state());

    let response = app
        .clone()
        .oneshot(form("/set_camera_url", "ip=192.168.1.5"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json_body = json(response).await;
    assert_eq!(json_body["message"], "Camera connected");
    assert_eq!(json_body["stream_url"], "http://192.168.1.5:8080/video");

    let response = app.oneshot(get("/camera_url")).await.unwrap();
    assert_eq!(
        json(response).await["stream_url"],
        "http://192.168.1.5:8080/video"
    );
}

#[tokio::test]
async fn test_set_camera_url_requires_input() {
    let app = build_test_router(base_state());

    let response = app
        .clone()
        .oneshot(form("/set_camera_url", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(form("/set_camera_url", "url=ftp%3A%2F%2Fcam%2Fvideo"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_detect_objects_before_camera_is_set() {
    let app = build_test_router(base_state());

    let response = app.oneshot(get("/detect_objects")).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        json(response).await["error"]["code"],
        "camera_not_configured"
    );
}

#[tokio::test]
async fn test_detect_objects_reports_directions() {
    let app = build_test_router(base_state());

    let response = app
        .clone()
        .oneshot(form("/set_camera_url", "ip=192.168.1.5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/detect_objects")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json(response).await;
    assert_eq!(json["frame"]["width"], 640);
    assert_eq!(json["detections"][0]["label"], "person");
    assert_eq!(json["detections"][0]["direction"], "left");
    assert!(json["detections"][0]["box"]["x_min"].is_number());
}

#[tokio::test]
async fn test_assistant_disabled() {
    let app = build_test_router(base_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/assistant/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(response).await["error"]["code"], "not_configured");
}

#[tokio::test]
async fn test_assistant_session_lifecycle() {
    let synth = TextSynthesizer::default();
    let state = base_state();
    let manager = SessionManager::new(
        Arc::new(ScriptedDevices {
            script: vec![Heard::Silence],
            output: RecordingOutput::default(),
        }),
        capabilities(&[], Arc::new(state.perception.clone()), &synth),
        Duration::from_millis(50),
    );
    let app = build_test_router(state.with_sessions(Arc::new(manager)));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/assistant/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = json(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(get(&format!("/assistant/sessions/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = json(response).await;
    assert_eq!(status["session_id"], id.as_str());
    assert!(status["state"].is_string());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/assistant/sessions/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["state"], "idle");

    let response = app
        .oneshot(get(&format!("/assistant/sessions/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_configured_origins() {
    let app = build_test_router(base_state());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://sightline-demo.vercel.app")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://sightline-demo.vercel.app"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://evil.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[test]
fn test_cors_pattern_must_compile() {
    tokio_test::assert_ok!(ApiServer::new(base_state(), 0, DEFAULT_CORS_ORIGINS));
    assert!(ApiServer::new(base_state(), 0, "(unclosed").is_err());
}

#[tokio::test]
async fn test_search_and_speak() {
    let synth = TextSynthesizer::default();
    let state = base_state()
        .with_searcher(Arc::new(CannedSearcher("Paris is sunny")))
        .with_synthesizer(Arc::new(synth.clone()));
    let app = build_test_router(state);

    let response = app
        .clone()
        .oneshot(form("/search", "query=weather+in+Paris"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json_body = json(response).await;
    assert_eq!(json_body["query"], "weather in Paris");
    assert_eq!(json_body["summary"], "Paris is sunny (weather in Paris)");

    let response = app
        .clone()
        .oneshot(form("/speak", "text=hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    let audio = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&audio[..], b"hello");
    assert_eq!(synth.lines(), vec!["hello"]);

    let response = app.oneshot(form("/speak", "text=+")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_without_provider() {
    let app = build_test_router(base_state());

    let response = app
        .oneshot(form("/search", "query=anything"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
