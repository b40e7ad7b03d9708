//! Access gate orchestration
//!
//! `AccessGate::evaluate` runs three stages in a fixed order and stops at the
//! first one that decides:
//!
//! 1. identity   : rotating token must verify, else `DENIED` (403)
//! 2. bio-state  : `DURESS` purges the vault, then `PURGED` (410)
//! 3. intent     : oracle verdict containing "MALICIOUS", `FORBIDDEN` (401)
//!
//! Anything that survives is `AUTHORIZED` (200) with a fresh session id.
//! Stages 2 and 3 need an [`IdentityProof`], which only stage 1 can mint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use tracing::{info, warn};

use crate::clock::SystemClock;
use crate::config::GateConfig;
use crate::error::GateResult;
use crate::oracle::{IntentOracle, OllamaOracle, OracleOutcome, PromptKind, FALLBACK_VERDICT};
use crate::token::RotatingTokenVerifier;
use crate::vault::VisionVault;

pub const DURESS: &str = "DURESS";

const MSG_DENIED: &str = "Identity Desync";
const MSG_PURGED: &str = "Neural Distress. Vault Sanitized.";
const MSG_FORBIDDEN: &str = "Intent Violates Dharma";
const MSG_AUTHORIZED: &str = "Access Granted";

/// Inbound access request. Nothing in it is trusted until verified.
#[derive(Debug, Clone, Deserialize)]
pub struct GateRequest {
    #[serde(default)]
    pub token: Option<String>,
    pub bio_state: String,
    pub intent: String,
}

impl GateRequest {
    pub fn new(
        token: Option<String>,
        bio_state: impl Into<String>,
        intent: impl Into<String>,
    ) -> Self {
        Self {
            token,
            bio_state: bio_state.into(),
            intent: intent.into(),
        }
    }

    pub fn under_duress(&self) -> bool {
        self.bio_state == DURESS
    }
}

/// Outcome of a gate evaluation, serialized as the response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateDecision {
    Authorized { node: String, session: String },
    Denied { msg: &'static str },
    Purged { msg: &'static str },
    Forbidden { msg: &'static str },
}

impl GateDecision {
    fn denied() -> Self {
        GateDecision::Denied { msg: MSG_DENIED }
    }

    fn purged() -> Self {
        GateDecision::Purged { msg: MSG_PURGED }
    }

    fn forbidden() -> Self {
        GateDecision::Forbidden { msg: MSG_FORBIDDEN }
    }

    /// HTTP status the decision maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            GateDecision::Authorized { .. } => 200,
            GateDecision::Denied { .. } => 403,
            GateDecision::Purged { .. } => 410,
            GateDecision::Forbidden { .. } => 401,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GateDecision::Authorized { .. } => "AUTHORIZED",
            GateDecision::Denied { .. } => "DENIED",
            GateDecision::Purged { .. } => "PURGED",
            GateDecision::Forbidden { .. } => "FORBIDDEN",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            GateDecision::Authorized { .. } => MSG_AUTHORIZED,
            GateDecision::Denied { msg }
            | GateDecision::Purged { msg }
            | GateDecision::Forbidden { msg } => *msg,
        }
    }

    pub fn session(&self) -> Option<&str> {
        match self {
            GateDecision::Authorized { session, .. } => Some(session),
            _ => None,
        }
    }
}

/// Evidence that the identity stage passed for this request.
#[derive(Debug)]
pub struct IdentityProof {
    _private: (),
}

pub struct AccessGate {
    verifier: Arc<RotatingTokenVerifier>,
    vault: Arc<VisionVault>,
    oracle: Arc<dyn IntentOracle>,
    node_label: String,
    issued: AtomicU64,
}

impl AccessGate {
    pub fn new(
        verifier: Arc<RotatingTokenVerifier>,
        vault: Arc<VisionVault>,
        oracle: Arc<dyn IntentOracle>,
        node_label: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            vault,
            oracle,
            node_label: node_label.into(),
            issued: AtomicU64::new(0),
        }
    }

    /// Wire the production gate: system clock, on-disk vault, Ollama oracle.
    pub async fn from_config(config: &GateConfig) -> GateResult<Self> {
        let verifier = RotatingTokenVerifier::new(
            &config.shared_secret,
            config.window,
            Arc::new(SystemClock),
        )?;
        let vault = VisionVault::open(&config.vault_dir).await?;
        let oracle = OllamaOracle::from_config(config)?;

        Ok(Self::new(
            Arc::new(verifier),
            Arc::new(vault),
            Arc::new(oracle),
            config.node_label.clone(),
        ))
    }

    pub fn vault(&self) -> &Arc<VisionVault> {
        &self.vault
    }

    pub fn oracle(&self) -> &Arc<dyn IntentOracle> {
        &self.oracle
    }

    pub fn node_label(&self) -> &str {
        &self.node_label
    }

    /// Run the full pipeline for one request.
    ///
    /// Only a failed purge is an error; every other outcome is a decision.
    pub async fn evaluate(&self, request: &GateRequest) -> GateResult<GateDecision> {
        let Some(proof) = self.check_identity(request.token.as_deref()) else {
            warn!("Access denied: token did not verify");
            return Ok(GateDecision::denied());
        };

        if request.under_duress() {
            self.sanitize(&proof).await?;
            return Ok(GateDecision::purged());
        }

        let verdict = match self.consult_oracle(&proof, &request.intent).await {
            OracleOutcome::Classified(text) => text,
            // Fail open: an unreachable oracle counts as benign
            OracleOutcome::Unavailable => FALLBACK_VERDICT.to_string(),
        };
        if verdict.to_uppercase().contains("MALICIOUS") {
            warn!("Access forbidden: intent classified malicious");
            return Ok(GateDecision::forbidden());
        }

        let session = self.issue_session_id();
        info!(node = %self.node_label, "Access authorized");
        Ok(GateDecision::Authorized {
            node: self.node_label.clone(),
            session,
        })
    }

    fn check_identity(&self, token: Option<&str>) -> Option<IdentityProof> {
        self.verifier
            .verify(token)
            .then_some(IdentityProof { _private: () })
    }

    async fn sanitize(&self, _proof: &IdentityProof) -> GateResult<()> {
        warn!("Duress signalled by verified identity, purging vision vault");
        let ack = self.vault.purge().await?;
        info!(removed = ack.removed, "Duress purge complete");
        Ok(())
    }

    async fn consult_oracle(&self, _proof: &IdentityProof, intent: &str) -> OracleOutcome {
        self.oracle.classify(PromptKind::Login, intent).await
    }

    /// 12 uppercase hex characters from SHA3-256 over the current time and a
    /// per-process counter.
    fn issue_session_id(&self) -> String {
        let seq = self.issued.fetch_add(1, Ordering::Relaxed);
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let digest = hex::encode(Sha3_256::digest(format!("{nanos}:{seq}").as_bytes()));
        digest[..12].to_uppercase()
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("verifier", &self.verifier)
            .field("vault", &self.vault)
            .field("node_label", &self.node_label)
            .finish_non_exhaustive()
    }
}
