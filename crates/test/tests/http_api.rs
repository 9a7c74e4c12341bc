//! HTTP surface exercised in-process with `tower::ServiceExt::oneshot`.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use blobcast_node::router;
use blobcast_test_support::{LocalKeyBackend, MockEthRpc, ReceiptBehavior};
use blobcast_types::submission::FundingMode;
use common::{Harness, fast_config, is_versioned_hash};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn call(h: &Harness, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router(h.app_state()).oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn submit_returns_camel_case_body() {
    let h = Harness::funded(FundingMode::Ephemeral);

    let (status, body) = call(&h, post_json("/submit", &json!({ "json": { "example": "data" } }))).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["dataSize"], 18);
    assert!(is_versioned_hash(body["blobHash"].as_str().unwrap()));
    assert!(body["ethTransferHash"].as_str().unwrap().starts_with("0x"));
    assert!(body["blockNumber"].is_u64());
    assert_eq!(body["signerAddress"], h.backend.address().to_string());
}

#[tokio::test]
async fn root_path_accepts_the_data_field() {
    let h = Harness::funded(FundingMode::Direct);

    let (status, body) = call(&h, post_json("/", &json!({ "data": "plain text payload" }))).await;
    assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&body));

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["dataSize"], "plain text payload".len());
    assert!(body["ethTransferHash"].is_null());
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let h = Harness::funded(FundingMode::Direct);

    let request = Request::post("/submit")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = call(&h, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid request body");
    assert!(h.rpc.sent().is_empty());
}

#[tokio::test]
async fn request_without_payload_is_a_bad_request() {
    let h = Harness::funded(FundingMode::Direct);

    let (status, _) = call(&h, post_json("/submit", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.backend.key_fetches(), 0);
}

#[tokio::test]
async fn insufficient_balance_reports_amounts() {
    let backend = LocalKeyBackend::from_seed(0x61);
    let h = Harness::new(backend, MockEthRpc::default(), fast_config(FundingMode::Ephemeral));

    let (status, body) = call(&h, post_json("/submit", &json!({ "json": "hi" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["balance"], "0");
    assert!(body["required"].as_str().unwrap().parse::<u128>().unwrap() > 0);
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn failed_blob_tx_reports_the_funding_transfer() {
    let backend = LocalKeyBackend::from_seed(0x63);
    let rpc = common::funded_rpc(&backend).with_blob_receipts(ReceiptBehavior::Revert);
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Ephemeral));

    let (status, body) = call(&h, post_json("/submit", &json!({ "json": "hi" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["ethTransferHash"], h.rpc.sent()[0].hash.to_string());
}

#[tokio::test]
async fn signing_failure_is_a_server_error() {
    let backend = LocalKeyBackend::from_seed(0x62);
    backend.fail_signing();
    let rpc = common::funded_rpc(&backend);
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Direct));

    let (status, body) = call(&h, post_json("/submit", &json!({ "json": "hi" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["details"].as_str().unwrap().contains("local-key-62"));
}

#[tokio::test]
async fn health_reports_the_signer() {
    let h = Harness::funded(FundingMode::Direct);

    let (status, body) = call(&h, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["kmsKeyId"], "local-key-42");
    assert_eq!(body["signerAddress"], h.backend.address().to_string());
}

#[tokio::test]
async fn metrics_are_exposed_after_a_submission() {
    let h = Harness::funded(FundingMode::Direct);
    call(&h, post_json("/submit", &json!({ "json": "count me" }))).await;

    let (status, body) = call(&h, Request::get("/metrics").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("blobcast_submissions_started_total 1"), "{text}");
    assert!(text.contains("blobcast_submissions_succeeded_total 1"), "{text}");
    assert!(text.contains("stage=\"confirmed\""), "{text}");
}
