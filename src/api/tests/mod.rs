use super::*;
use crate::config::{PlatformConfig, PollConfig, RedirectConfig};
use crate::types::TaskId;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use std::time::Duration;
use tower::ServiceExt;


/// Config pointing the runner at `api_base`, with a fast poll budget
fn test_config(api_base: &str, token: Option<&str>) -> Config {
    let mut config = Config::default();
    config.runner.api_base = api_base.to_string();
    config.runner.token = token.map(str::to_string);
    config.poll = PollConfig {
        max_attempts: 3,
        interval: Duration::from_millis(5),
    };
    config.platforms = vec![
        PlatformConfig {
            name: "tiktok".to_string(),
            task_id: TaskId::parse("owner/task").unwrap(),
        },
        PlatformConfig {
            name: "youtube".to_string(),
            task_id: TaskId::parse("solo-task").unwrap(),
        },
    ];
    config.redirect = RedirectConfig {
        short_link_hosts: vec!["vm.tiktok.com".to_string()],
    };
    config
}

fn test_app(config: Config) -> Router {
    let state = AppState::new(Arc::new(config)).unwrap();
    create_router(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(test_config("http://127.0.0.1:1", Some("tok")));

    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_root_banner() {
    let app = test_app(test_config("http://127.0.0.1:1", Some("tok")));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8(body.to_vec()).unwrap().contains("running"));
}

#[tokio::test]
async fn test_openapi_json_endpoint() {
    let app = test_app(test_config("http://127.0.0.1:1", Some("tok")));

    let (status, body) = get(app, "/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/{platform}"].is_object());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = test_app(test_config("http://127.0.0.1:1", Some("tok")));

    let (status, body) = get(app, "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_cors_enabled() {
    let mut config = test_config("http://127.0.0.1:1", Some("tok"));
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let app = test_app(config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = test_config("http://127.0.0.1:1", Some("tok"));
    config.api.cors_enabled = false;
    let app = test_app(config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_server_starts_and_stops_gracefully() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = test_config("http://127.0.0.1:1", Some("tok"));
    config.api.bind_address = addr;
    let config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(start_api_server(config, async move {
        let _ = stop_rx.await;
    }));

    // Give the server a moment to bind
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
