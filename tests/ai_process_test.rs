mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use hunt_tickets_backend::config::WebhookConfig;
use hunt_tickets_backend::services::webhook::{WebhookClient, WebhookError, WebhookRequest};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;
use wiremock::matchers::{basic_auth, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROCESS_URI: &str = "/api/invoices/ai-process";
const HOOK_PATH: &str = "/webhook/invoice-processing";

fn process_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(PROCESS_URI)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_payload() -> serde_json::Value {
    json!({
        "fileUrl": "https://storage.test/object/sign/invoices/abc.pdf?token=t",
        "uuid": "7d3c1f0e-5a4b-4c2d-9e8f-0a1b2c3d4e5f"
    })
}

async fn app_for(server: &MockServer) -> axum::Router {
    let url = format!("{}{}", server.uri(), HOOK_PATH);
    test_app(Arc::new(MockStorageService::new()), test_config(&url)).await
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    for payload in [
        json!({ "fileUrl": "https://storage.test/a.pdf" }),
        json!({ "uuid": "abc" }),
        json!({ "fileUrl": "", "uuid": "abc" }),
    ] {
        let response = app.clone().oneshot(process_request(payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Missing fileUrl or uuid");
    }
}

#[tokio::test]
async fn test_json_result_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .and(basic_auth("admin", "admin"))
        .and(body_json(valid_payload()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "invoiceNumber": "FE-1029",
            "total": 1250000
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let response = app.oneshot(process_request(valid_payload())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Invoice sent for AI processing");
    assert_eq!(json["uuid"], "7d3c1f0e-5a4b-4c2d-9e8f-0a1b2c3d4e5f");
    assert_eq!(json["webhookResult"]["invoiceNumber"], "FE-1029");
}

#[tokio::test]
async fn test_non_json_success_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("Workflow was started"))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let response = app.oneshot(process_request(valid_payload())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["webhookResult"], json!({ "status": "success" }));
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("Authorization data is wrong!"))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let response = app.oneshot(process_request(valid_payload())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Invalid request to AI processing service");
    assert!(json["details"].as_str().unwrap().contains("401"));
}

#[tokio::test]
async fn test_server_error_retried_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let response = app.oneshot(process_request(valid_payload())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["error"], "AI processing service unavailable");
}

#[tokio::test]
async fn test_recovers_after_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "queued": true })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let response = app.oneshot(process_request(valid_payload())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["webhookResult"]["queued"], true);
}

#[tokio::test]
async fn test_timeout_reported_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(3)
        .mount(&server)
        .await;

    let app = app_for(&server).await;

    let response = app.oneshot(process_request(valid_payload())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["error"], "AI processing timed out");
}

#[tokio::test]
async fn test_unreachable_webhook_reports_connection_failure() {
    // Nothing listens on the discard port
    let app = test_app(
        Arc::new(MockStorageService::new()),
        test_config("http://127.0.0.1:9/webhook/invoice-processing"),
    )
    .await;

    let response = app.oneshot(process_request(valid_payload())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Failed to connect to AI processing service");
}

fn webhook_request() -> WebhookRequest {
    WebhookRequest {
        uuid: "7d3c1f0e-5a4b-4c2d-9e8f-0a1b2c3d4e5f".to_string(),
        file_url: "https://storage.test/object/sign/invoices/abc.pdf?token=t".to_string(),
    }
}

// Runs on the real clock: a paused clock would also fast-forward the
// per-attempt timeout while the request is in flight.
#[tokio::test]
async fn test_default_backoff_waits_one_then_two_seconds() {
    let server = MockServer::start().await;
    let hits: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = hits.clone();
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(move |_: &wiremock::Request| {
            recorded.lock().unwrap().push(Instant::now());
            ResponseTemplate::new(502)
        })
        .expect(3)
        .mount(&server)
        .await;

    let config = WebhookConfig {
        url: format!("{}{}", server.uri(), HOOK_PATH),
        ..WebhookConfig::default()
    };
    let client = WebhookClient::new(&config);

    let policy = client.policy();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    assert_eq!(policy.delay_for(2), Duration::from_secs(2));

    let err = client.call(&webhook_request()).await.unwrap_err();
    assert!(matches!(err, WebhookError::ServerError { status: 502, .. }));

    let hits = hits.lock().unwrap();
    assert_eq!(hits.len(), 3);
    let first_gap = hits[1] - hits[0];
    let second_gap = hits[2] - hits[1];
    assert!(
        first_gap >= Duration::from_secs(1) && first_gap < Duration::from_millis(1900),
        "first gap {first_gap:?}"
    );
    assert!(
        second_gap >= Duration::from_secs(2) && second_gap < Duration::from_millis(3500),
        "second gap {second_gap:?}"
    );
}

#[tokio::test]
async fn test_truncated_success_body_is_retried_as_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));

    let counter = connections.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 4096];
                while !request.windows(7).any(|w| w == b"fileUrl") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                // Promise 100 bytes, send a few, then hang up
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"invoice",
                    )
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    let config = WebhookConfig {
        url: format!("http://{}{}", addr, HOOK_PATH),
        timeout_secs: 5,
        backoff_base_ms: 1,
        ..WebhookConfig::default()
    };
    let client = WebhookClient::new(&config);

    let err = client.call(&webhook_request()).await.unwrap_err();
    assert!(matches!(err, WebhookError::Network(_)), "{err:?}");
    assert_eq!(connections.load(Ordering::SeqCst), 3);
}
