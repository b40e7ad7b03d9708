//! Shared fixtures for the HTTP and oracle integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vision_gate::api::{build_router, AppState};
use vision_gate::{
    AccessGate, IntentOracle, ManualClock, OracleOutcome, PromptKind, RotatingTokenVerifier,
    SharedSecret, VisionVault,
};

pub const TEST_SECRET: &str = "test-secret-for-integration-tests";
pub const TEST_NODE: &str = "ABQM-TEST-NODE";
pub const TEST_NOW: u64 = 1_700_000_000;

// ── Scripted oracle ────────────────────────────────────────────

/// Oracle that returns a fixed outcome and records every call.
pub struct ScriptedOracle {
    outcome: OracleOutcome,
    calls: AtomicUsize,
    seen: Mutex<Vec<(PromptKind, String)>>,
}

impl ScriptedOracle {
    pub fn new(outcome: OracleOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn classified(text: &str) -> Arc<Self> {
        Self::new(OracleOutcome::Classified(text.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(PromptKind, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentOracle for ScriptedOracle {
    async fn classify(&self, kind: PromptKind, input: &str) -> OracleOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((kind, input.to_string()));
        self.outcome.clone()
    }
}

// ── Stub oracle server ─────────────────────────────────────────

#[derive(Clone)]
pub enum StubReply {
    Json(Value),
    Status(u16),
    Garbage,
    Hang,
}

struct StubState {
    reply: StubReply,
    requests: Mutex<Vec<Value>>,
}

pub struct StubOracleServer {
    pub url: String,
    state: Arc<StubState>,
}

impl StubOracleServer {
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn stub_generate(State(stub): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    stub.requests.lock().unwrap().push(body);
    match &stub.reply {
        StubReply::Json(value) => Json(value.clone()).into_response(),
        StubReply::Status(code) => StatusCode::from_u16(*code).unwrap().into_response(),
        StubReply::Garbage => "<html>definitely not json</html>".into_response(),
        StubReply::Hang => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Json(serde_json::json!({"response": "too late"})).into_response()
        }
    }
}

/// Start a local `/api/generate` stand-in on an ephemeral port.
pub async fn spawn_oracle_stub(reply: StubReply) -> StubOracleServer {
    let state = Arc::new(StubState {
        reply,
        requests: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/api/generate", post(stub_generate))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubOracleServer {
        url: format!("http://{}/api/generate", addr),
        state,
    }
}

// ── Test app builder ───────────────────────────────────────────

pub struct TestGate {
    pub temp: TempDir,
    pub app: Router,
    pub gate: Arc<AccessGate>,
    pub verifier: Arc<RotatingTokenVerifier>,
    pub vault: Arc<VisionVault>,
    pub clock: Arc<ManualClock>,
}

impl TestGate {
    pub fn valid_token(&self) -> String {
        self.verifier.expected_token()
    }
}

pub async fn build_test_gate(oracle: Arc<dyn IntentOracle>) -> TestGate {
    let temp = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(TEST_NOW));
    let verifier = Arc::new(
        RotatingTokenVerifier::new(
            &SharedSecret::new(TEST_SECRET).unwrap(),
            Duration::from_secs(30),
            clock.clone(),
        )
        .unwrap(),
    );
    let vault = Arc::new(VisionVault::open(temp.path().join("vault")).await.unwrap());
    let gate = Arc::new(AccessGate::new(
        verifier.clone(),
        vault.clone(),
        oracle,
        TEST_NODE,
    ));
    let app = build_router(AppState::new(gate.clone()));

    TestGate {
        temp,
        app,
        gate,
        verifier,
        vault,
        clock,
    }
}

// ── Request helpers ────────────────────────────────────────────

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: &Router, uri: &str, body: String) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    (status, body_json(resp).await)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    (status, body_json(resp).await)
}

pub async fn body_json(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(
        |_| serde_json::json!({ "raw": String::from_utf8_lossy(&bytes).to_string() }),
    )
}

pub fn is_session_id(s: &str) -> bool {
    s.len() == 12 && s.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}
