//! Access flow tests against a running gate.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{signed, wallet, TestHarness, DEFAULT_WALLET_ADDRESS, PDF_BYTES};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokengate::ResponseMode;

/// A holder gets the PDF with the hardening headers.
#[tokio::test]
async fn test_holder_gets_pdf() {
    let harness = TestHarness::setup().await.unwrap();
    harness.chain.set_balance(1).await;
    harness.gateway.serve_pdf("").await;

    let response = harness.view(&signed(&wallet(), "Let me read")).await;

    assert_eq!(response.status(), 200);
    let headers = response.headers().clone();
    assert_eq!(headers["content-type"], "application/pdf");
    assert_eq!(headers["content-disposition"], "inline; filename=\"docs.pdf\"");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(&response.bytes().await.unwrap()[..], PDF_BYTES);

    let calls = harness.chain.calls().await;
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("0x70a08231"));
    assert!(calls[0].ends_with(&DEFAULT_WALLET_ADDRESS[2..].to_lowercase()));

    harness.teardown().await.unwrap();
}

/// Redirect mode hands out the URL instead of the bytes.
#[tokio::test]
async fn test_holder_gets_url_in_redirect_mode() {
    let harness = TestHarness::setup_with(|c| {
        c.mode = ResponseMode::Redirect;
        c.docs_file = Some("docs.pdf".into());
    })
    .await
    .unwrap();
    harness.chain.set_balance(7).await;

    let response = harness.view(&signed(&wallet(), "Let me read")).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["url"], harness.gateway.url_of("docs.pdf"));
    assert_eq!(harness.gateway.request_count().await, 0);

    harness.teardown().await.unwrap();
}

/// A non-holder is refused and learns nothing about the document.
#[tokio::test]
async fn test_non_holder_forbidden() {
    let harness = TestHarness::setup_with(|c| c.mode = ResponseMode::Redirect)
        .await
        .unwrap();
    harness.chain.set_balance(0).await;

    let response = harness.view(&signed(&wallet(), "Let me read")).await;

    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("no token"));
    assert!(body.get("url").is_none());

    harness.teardown().await.unwrap();
}

/// A failing RPC node surfaces as 502, never as a denial.
#[tokio::test]
async fn test_rpc_failure_is_bad_gateway() {
    let harness = TestHarness::setup().await.unwrap();
    harness.chain.fail_with(500).await;

    let response = harness.view(&signed(&wallet(), "Let me read")).await;

    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert!(!body["error"].as_str().unwrap().contains("127.0.0.1"));

    harness.teardown().await.unwrap();
}

/// A stalled RPC node is cut off at the configured timeout.
#[tokio::test]
async fn test_rpc_stall_times_out() {
    let harness = TestHarness::setup_with(|c| c.timeouts.rpc_secs = 1)
        .await
        .unwrap();
    harness.chain.stall(Duration::from_secs(10)).await;

    let started = Instant::now();
    let response = harness.view(&signed(&wallet(), "Let me read")).await;
    let elapsed = started.elapsed();

    assert_eq!(response.status(), 504);
    assert!(elapsed < Duration::from_millis(2500), "took {elapsed:?}");

    harness.teardown().await.unwrap();
}

/// Bad input is rejected before any upstream is contacted.
#[tokio::test]
async fn test_bad_input_never_reaches_upstreams() {
    let harness = TestHarness::setup().await.unwrap();
    harness.chain.set_balance(1).await;

    let invalid = harness
        .view(&json!({ "address": "0xnothex", "message": "m", "signature": "0x00" }))
        .await;
    assert_eq!(invalid.status(), 400);

    let forged = {
        let mut body = signed(&wallet(), "Let me read");
        body["address"] = json!("0x000000000000000000000000000000000000dead");
        body
    };
    assert_eq!(harness.view(&forged).await.status(), 401);

    let unsigned = harness.view(&json!({ "address": DEFAULT_WALLET_ADDRESS })).await;
    assert_eq!(unsigned.status(), 401);

    let malformed = harness
        .client
        .post(harness.url("/api/view"))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), 400);

    assert!(harness.chain.calls().await.is_empty());
    assert_eq!(harness.gateway.request_count().await, 0);

    harness.teardown().await.unwrap();
}

/// Only POST reaches the gate; GET is health.
#[tokio::test]
async fn test_methods() {
    let harness = TestHarness::setup().await.unwrap();

    let health: Value = harness
        .client
        .get(harness.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let put = harness
        .client
        .put(harness.url("/api/view"))
        .send()
        .await
        .unwrap();
    assert_eq!(put.status(), 405);

    let nonce = harness
        .client
        .get(harness.url("/api/view?nonce=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(nonce.status(), 404);

    harness.teardown().await.unwrap();
}

/// Discovery finds the document among the conventional paths.
#[tokio::test]
async fn test_discovery() {
    let harness = TestHarness::setup_with(|c| {
        c.mode = ResponseMode::Redirect;
        c.discover_path = true;
    })
    .await
    .unwrap();
    harness.chain.set_balance(1).await;
    harness.gateway.serve_pdf("document.pdf").await;

    let response = harness.view(&signed(&wallet(), "Let me read")).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["url"], harness.gateway.url_of("document.pdf"));

    harness.teardown().await.unwrap();
}

/// Discovery that finds nothing reports every URL it tried.
#[tokio::test]
async fn test_discovery_not_located() {
    let harness = TestHarness::setup_with(|c| c.discover_path = true)
        .await
        .unwrap();
    harness.chain.set_balance(1).await;

    let response = harness.view(&signed(&wallet(), "Let me read")).await;

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    let tried = body["tried"].as_array().unwrap();
    assert_eq!(tried.len(), 5);
    assert_eq!(tried[0], harness.gateway.url_of(""));

    harness.teardown().await.unwrap();
}

/// With nonce binding on, a signed request works once.
#[tokio::test]
async fn test_nonce_binding() {
    let harness = TestHarness::setup_with(|c| {
        c.mode = ResponseMode::Redirect;
        c.auth.require_nonce = true;
    })
    .await
    .unwrap();
    harness.chain.set_balance(1).await;

    let issued: Value = harness
        .client
        .get(harness.url("/api/view?nonce=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let nonce = issued["nonce"].as_str().unwrap();
    assert!(issued["expiresAt"].as_i64().unwrap() > 0);

    let body = signed(&wallet(), &format!("Let me read\nNonce: {nonce}"));
    assert_eq!(harness.view(&body).await.status(), 200);
    assert_eq!(harness.view(&body).await.status(), 401);
    assert_eq!(harness.chain.calls().await.len(), 1);

    harness.teardown().await.unwrap();
}

/// Missing configuration is reported per request, by variable name.
#[tokio::test]
async fn test_missing_configuration() {
    let harness = TestHarness::setup_with(|c| {
        c.rpc_url = None;
        c.docs_cid = None;
    })
    .await
    .unwrap();

    let response = harness.view(&signed(&wallet(), "Let me read")).await;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing env vars: RPC_URL, DOCS_CID");

    harness.teardown().await.unwrap();
}
