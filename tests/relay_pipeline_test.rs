//! End-to-end tests for the webhook relay pipeline.
//!
//! Drives the real router with tower `oneshot` requests while the
//! destination directory host and the alert destinations are HTTP doubles.
//! Covers the response-code contract (200/401/405/500), verification
//! short-circuiting, coupon matching, and fan-out behavior.

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use coupon_relay::{create_router, crypto::sign_payload, AppState, Config};
use tower::ServiceExt;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

const SECRET: &str = "relay-test-secret";
const SIGNATURE_HEADER: &str = "x-wc-webhook-signature";

const ORDER_BODY: &str = r#"{
    "id": 731,
    "status": "processing",
    "currency": "EUR",
    "total": "49.90",
    "billing": {"first_name": "Nina", "last_name": "K."},
    "coupon_lines": [{"code": "save10"}],
    "line_items": [{"name": "Classic Hoodie", "quantity": 1}]
}"#;

fn expected_alert() -> serde_json::Value {
    serde_json::json!({
        "message": "Nina just bought Classic Hoodie!",
        "value": "49.90",
        "currency": "EUR"
    })
}

fn test_state(secret: &str, directory_url: &str) -> AppState {
    let config = Config {
        webhook_secret: secret.to_string(),
        directory_url: directory_url.to_string(),
        directory_timeout_seconds: 2,
        delivery_timeout_seconds: 2,
        ..Config::default()
    };

    AppState::from_config(config).expect("application state should build")
}

fn signed_request(body: &str, secret: &str) -> Request<Body> {
    let signature = sign_payload(body.as_bytes(), secret).expect("signing should succeed");

    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

async fn mount_directory(server: &MockServer, csv: &str, expected_fetches: u64) {
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/directory.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(csv.to_string()))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

fn directory_url(server: &MockServer) -> String {
    format!("{}/directory.csv", server.uri())
}

#[tokio::test]
async fn valid_webhook_relays_alert_to_matched_destination() -> Result<()> {
    let directory = MockServer::start().await;
    let destination = MockServer::start().await;

    let csv = format!("code,destination\nSAVE10,{}/alert\n", destination.uri());
    mount_directory(&directory, &csv, 1).await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/alert"))
        .and(matchers::header("content-type", "application/json"))
        .and(matchers::body_json(expected_alert()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&destination)
        .await;

    let app = create_router(test_state(SECRET, &directory_url(&directory)));
    let response = app.oneshot(signed_request(ORDER_BODY, SECRET)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn every_mapped_destination_receives_the_same_payload() -> Result<()> {
    let directory = MockServer::start().await;
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    let csv = format!(
        "code,destination\nSAVE10,{}/alert, {}/alert\n",
        first.uri(),
        second.uri()
    );
    mount_directory(&directory, &csv, 1).await;

    for destination in [&first, &second] {
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/alert"))
            .and(matchers::body_json(expected_alert()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(destination)
            .await;
    }

    let app = create_router(test_state(SECRET, &directory_url(&directory)));
    let response = app.oneshot(signed_request(ORDER_BODY, SECRET)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn invalid_signature_short_circuits_before_any_downstream_work() -> Result<()> {
    let directory = MockServer::start().await;
    mount_directory(&directory, "code,destination\n", 0).await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, "bm90IHRoZSByaWdodCBzaWduYXR1cmU=")
        .body(Body::from(ORDER_BODY))?;

    let app = create_router(test_state(SECRET, &directory_url(&directory)));
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn missing_signature_header_is_rejected() -> Result<()> {
    let directory = MockServer::start().await;
    mount_directory(&directory, "code,destination\n", 0).await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(ORDER_BODY))?;

    let app = create_router(test_state(SECRET, &directory_url(&directory)));
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn missing_secret_is_a_server_error() -> Result<()> {
    let directory = MockServer::start().await;
    mount_directory(&directory, "code,destination\n", 0).await;

    let app = create_router(test_state("", &directory_url(&directory)));
    let response = app.oneshot(signed_request(ORDER_BODY, "whatever")).await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn order_without_coupon_is_acknowledged_without_dispatch() -> Result<()> {
    let directory = MockServer::start().await;
    let destination = MockServer::start().await;

    let csv = format!("code,destination\nSAVE10,{}/alert\n", destination.uri());
    mount_directory(&directory, &csv, 1).await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&destination)
        .await;

    let body = r#"{"billing": {"first_name": "Nina"}, "total": "49.90", "currency": "EUR"}"#;

    let app = create_router(test_state(SECRET, &directory_url(&directory)));
    let response = app.oneshot(signed_request(body, SECRET)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn unmatched_coupon_is_acknowledged_without_dispatch() -> Result<()> {
    let directory = MockServer::start().await;
    let destination = MockServer::start().await;

    let csv = format!("code,destination\nOTHER,{}/alert\n", destination.uri());
    mount_directory(&directory, &csv, 1).await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&destination)
        .await;

    let app = create_router(test_state(SECRET, &directory_url(&directory)));
    let response = app.oneshot(signed_request(ORDER_BODY, SECRET)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn coupon_matching_is_case_insensitive() -> Result<()> {
    let directory = MockServer::start().await;
    let destination = MockServer::start().await;

    // Directory key lower-case, order code upper-case via normalization.
    let csv = format!("code,destination\nsave10,{}/alert\n", destination.uri());
    mount_directory(&directory, &csv, 1).await;

    Mock::given(matchers::method("POST"))
        .and(matchers::body_json(expected_alert()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&destination)
        .await;

    let app = create_router(test_state(SECRET, &directory_url(&directory)));
    let response = app.oneshot(signed_request(ORDER_BODY, SECRET)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn directory_failure_still_acknowledges_the_sender() -> Result<()> {
    let directory = MockServer::start().await;

    Mock::given(matchers::method("GET"))
        .and(matchers::path("/directory.csv"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&directory)
        .await;

    let app = create_router(test_state(SECRET, &directory_url(&directory)));
    let response = app.oneshot(signed_request(ORDER_BODY, SECRET)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn unreachable_directory_still_acknowledges_the_sender() -> Result<()> {
    // Nothing is listening on this port.
    let app = create_router(test_state(SECRET, "http://127.0.0.1:9/directory.csv"));
    let response = app.oneshot(signed_request(ORDER_BODY, SECRET)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn failed_destination_does_not_block_its_sibling() -> Result<()> {
    let directory = MockServer::start().await;
    let failing = MockServer::start().await;
    let healthy = MockServer::start().await;

    let csv = format!(
        "code,destination\nSAVE10,{}/alert, {}/alert\n",
        failing.uri(),
        healthy.uri()
    );
    mount_directory(&directory, &csv, 1).await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&failing)
        .await;
    Mock::given(matchers::method("POST"))
        .and(matchers::body_json(expected_alert()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&healthy)
        .await;

    let app = create_router(test_state(SECRET, &directory_url(&directory)));
    let response = app.oneshot(signed_request(ORDER_BODY, SECRET)).await?;

    // Sender is acknowledged even though one destination failed.
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn unsupported_method_answers_405() -> Result<()> {
    let app = create_router(test_state(SECRET, "http://127.0.0.1:9/directory.csv"));

    let request = Request::builder().method("DELETE").uri("/").body(Body::empty())?;
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}

#[tokio::test]
async fn signature_must_cover_the_exact_raw_bytes() -> Result<()> {
    let directory = MockServer::start().await;
    mount_directory(&directory, "code,destination\n", 0).await;

    // Semantically identical JSON with different whitespace must not verify
    // against a signature computed over the original bytes.
    let reformatted: String = ORDER_BODY.split_whitespace().collect::<Vec<_>>().join("");
    let signature = sign_payload(ORDER_BODY.as_bytes(), SECRET)?;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(reformatted))?;

    let app = create_router(test_state(SECRET, &directory_url(&directory)));
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
