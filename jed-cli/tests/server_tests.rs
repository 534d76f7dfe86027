#![allow(clippy::unwrap_used)]
//! Tests for the `/check` HTTP service.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use jed_cli::server::{ServerConfig, router};
use tower::ServiceExt;

fn fuse_map(feabits: &str) -> String {
    format!(
        "\u{2}QP44*\nQF1024*\nL0000 {}*\nE{}\n{feabits}*\n\u{3}0000\n",
        "1".repeat(32),
        "0".repeat(64),
    )
}

async fn post_check(uri: &str, body: impl Into<Body>) -> (StatusCode, serde_json::Value) {
    post_check_with(&ServerConfig::default(), uri, body).await
}

async fn post_check_with(
    config: &ServerConfig,
    uri: &str,
    body: impl Into<Body>,
) -> (StatusCode, serde_json::Value) {
    let response = router(config)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let response = router(&ServerConfig::default())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn valid_fuse_map_is_accepted() {
    let (status, json) =
        post_check("/check?filename=device.jed", fuse_map("0000000000000000")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["name"], "device.jed");
    assert_eq!(json["exempt"], false);
    assert_eq!(json["address_digits"], 4);
    assert_eq!(json["status"], "device.jed passed file check");
}

#[tokio::test]
async fn spi_disabled_is_unprocessable() {
    let (status, json) =
        post_check("/check?filename=device.jed", fuse_map("0000000001000000")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["ok"], false);
    assert_eq!(json["code"], "feature_disabled");
    assert_eq!(json["reason"], "SPI port disabled");
    assert_eq!(json["status"], "File check failed: SPI port is disabled");
}

#[tokio::test]
async fn exempt_asset_is_accepted_without_scan() {
    let (status, json) = post_check("/check?filename=favicon.ico", "not a fuse map").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["exempt"], true);
    assert!(json.get("address_digits").is_none());
}

#[tokio::test]
async fn wrong_extension_is_unprocessable() {
    let (status, json) =
        post_check("/check?filename=device.bin", fuse_map("0000000000000000")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["reason"], "wrong format");
}

#[tokio::test]
async fn missing_filename_is_bad_request() {
    let (status, json) = post_check("/check", fuse_map("0000000000000000")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["ok"], false);

    let (status, _) = post_check("/check?filename=", "x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn binary_body_is_bad_request() {
    let (status, json) =
        post_check("/check?filename=device.jed", vec![0x02_u8, 0xff, 0xfe]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("UTF-8"));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = ServerConfig::default();
    config.max_body_bytes = 16;
    let (status, _) =
        post_check_with(&config, "/check?filename=device.jed", "x".repeat(64)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn oversized_body_is_rejected_with_body_logging() {
    let mut config = ServerConfig::default();
    config.verbose = 2;
    config.max_body_bytes = 16;
    let (status, _) =
        post_check_with(&config, "/check?filename=device.jed", "x".repeat(64)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn access_log_keeps_request_body_intact() {
    let mut config = ServerConfig::default();
    config.verbose = 2;
    let (status, json) = post_check_with(
        &config,
        "/check?filename=device.jed",
        fuse_map("0000000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
}
