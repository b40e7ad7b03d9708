//! HTTP-level tests for POST /gate/access.
//!
//! Drives the production router with `oneshot`, a manual clock and a scripted
//! oracle, and checks status codes, bodies and side effects per outcome.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::*;

async fn seed_vault(t: &TestGate) {
    for content in ["first vision", "second vision"] {
        t.vault
            .store_vision(content, json!({ "content": content }), "VALID".into())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_authorized_with_valid_token_and_benign_intent() {
    let oracle = ScriptedOracle::classified("VALID");
    let t = build_test_gate(oracle.clone()).await;

    let (status, body) = post_json(
        &t.app,
        "/gate/access",
        json!({ "token": t.valid_token(), "bio_state": "NORMAL", "intent": "map monsoon data" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "AUTHORIZED");
    assert_eq!(body["node"], TEST_NODE);
    assert!(is_session_id(body["session"].as_str().unwrap()), "{body}");
    assert!(body.get("msg").is_none());

    let seen = oracle.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, vision_gate::PromptKind::Login);
    assert_eq!(seen[0].1, "map monsoon data");
}

#[tokio::test]
async fn test_duress_purges_vault_and_skips_oracle() {
    let oracle = ScriptedOracle::classified("VALID");
    let t = build_test_gate(oracle.clone()).await;
    seed_vault(&t).await;
    assert_eq!(t.vault.len().await.unwrap(), 2);

    let (status, body) = post_json(
        &t.app,
        "/gate/access",
        json!({ "token": t.valid_token(), "bio_state": "DURESS", "intent": "MALICIOUS plans" }),
    )
    .await;

    assert_eq!(status, StatusCode::GONE);
    assert_eq!(
        body,
        json!({ "status": "PURGED", "msg": "Neural Distress. Vault Sanitized." })
    );
    assert_eq!(oracle.calls(), 0);
    assert!(t.vault.root().is_dir());
    assert_eq!(std::fs::read_dir(t.vault.root()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_invalid_token_denied_without_side_effects() {
    let oracle = ScriptedOracle::classified("MALICIOUS");
    let t = build_test_gate(oracle.clone()).await;
    seed_vault(&t).await;

    let bodies = [
        json!({ "bio_state": "DURESS", "intent": "x" }),
        json!({ "token": null, "bio_state": "DURESS", "intent": "x" }),
        json!({ "token": "00ff", "bio_state": "DURESS", "intent": "x" }),
        json!({ "token": "00ff", "bio_state": "NORMAL", "intent": "x" }),
    ];
    for body in bodies {
        let (status, resp) = post_json(&t.app, "/gate/access", body).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(resp, json!({ "status": "DENIED", "msg": "Identity Desync" }));
    }

    assert_eq!(oracle.calls(), 0);
    assert_eq!(t.vault.len().await.unwrap(), 2);
}

#[tokio::test]
async fn test_previous_window_token_is_denied() {
    let oracle = ScriptedOracle::classified("VALID");
    let t = build_test_gate(oracle.clone()).await;
    let stale = t.valid_token();

    t.clock.advance(30);

    let (status, body) = post_json(
        &t.app,
        "/gate/access",
        json!({ "token": stale, "bio_state": "NORMAL", "intent": "x" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "DENIED");
}

#[tokio::test]
async fn test_malicious_verdict_forbidden() {
    let oracle = ScriptedOracle::classified("The intent appears malicious.");
    let t = build_test_gate(oracle.clone()).await;

    let (status, body) = post_json(
        &t.app,
        "/gate/access",
        json!({ "token": t.valid_token(), "bio_state": "NORMAL", "intent": "exfiltrate" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "status": "FORBIDDEN", "msg": "Intent Violates Dharma" }));
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn test_unavailable_oracle_fails_open() {
    let oracle = ScriptedOracle::new(vision_gate::OracleOutcome::Unavailable);
    let t = build_test_gate(oracle.clone()).await;

    let (status, body) = post_json(
        &t.app,
        "/gate/access",
        json!({ "token": t.valid_token(), "bio_state": "NORMAL", "intent": "x" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "AUTHORIZED");
}

#[tokio::test]
async fn test_malformed_requests_rejected_before_gate() {
    let oracle = ScriptedOracle::classified("VALID");
    let t = build_test_gate(oracle.clone()).await;
    seed_vault(&t).await;

    // Valid token but missing intent: must not reach the duress stage
    let (status, body) = post_json(
        &t.app,
        "/gate/access",
        json!({ "token": t.valid_token(), "bio_state": "DURESS" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "MALFORMED");

    let (status, body) = post_raw(&t.app, "/gate/access", "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "MALFORMED");

    let (status, _) = post_json(
        &t.app,
        "/gate/access",
        json!({ "token": 42, "bio_state": "NORMAL", "intent": "x" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(oracle.calls(), 0);
    assert_eq!(t.vault.len().await.unwrap(), 2);
}

#[tokio::test]
async fn test_undeletable_retired_root_is_a_server_error() {
    let oracle = ScriptedOracle::classified("VALID");
    let t = build_test_gate(oracle.clone()).await;

    // Root replaced by a plain file: the swap succeeds, but the retired file
    // is not a tree `remove_dir_all` can delete, so the purge is incomplete
    let vault = std::sync::Arc::new(
        vision_gate::VisionVault::open(t.temp.path().join("vault2"))
            .await
            .unwrap(),
    );
    std::fs::remove_dir(vault.root()).unwrap();
    std::fs::write(vault.root(), b"now a file").unwrap();

    let gate = std::sync::Arc::new(vision_gate::AccessGate::new(
        t.verifier.clone(),
        vault,
        oracle.clone(),
        TEST_NODE,
    ));
    let app = vision_gate::api::build_router(vision_gate::api::AppState::new(gate));

    let (status, body) = post_json(
        &app,
        "/gate/access",
        json!({ "token": t.valid_token(), "bio_state": "DURESS", "intent": "x" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "ERROR");
    assert_eq!(oracle.calls(), 0);
}
