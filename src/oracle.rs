//! Intent oracle client
//!
//! Talks to an Ollama-style `/api/generate` endpoint. Every failure mode
//! (timeout, connection error, non-2xx status, undecodable reply) becomes
//! [`OracleOutcome::Unavailable`]; the client never returns an error. Callers
//! choose what `Unavailable` means for them.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GateConfig;
use crate::error::GateResult;

/// Text used wherever an unavailable oracle is treated as benign.
pub const FALLBACK_VERDICT: &str = "VALID";

/// Kind of question put to the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Login,
    Research,
    Canvas,
}

impl PromptKind {
    pub fn render(self, input: &str) -> String {
        match self {
            PromptKind::Login => format!(
                "Analyze this login intent: '{input}'. Is it for the benefit of humanity? Reply 'VALID' or 'MALICIOUS'."
            ),
            PromptKind::Research => format!(
                "Analyze this research summary: '{input}'. Predict its 50-year global impact score (0-1) and ethical alignment. Reply in JSON."
            ),
            PromptKind::Canvas => format!(
                "A scientist has sketched a formula: '{input}'. Provide a 2-sentence advanced insight and verify its physical validity."
            ),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PromptKind::Login => "login",
            PromptKind::Research => "research",
            PromptKind::Canvas => "canvas",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What came back from the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleOutcome {
    Classified(String),
    Unavailable,
}

impl OracleOutcome {
    /// Response text, or [`FALLBACK_VERDICT`] if the oracle could not answer.
    pub fn text_or_fallback(self) -> String {
        match self {
            OracleOutcome::Classified(text) => text,
            OracleOutcome::Unavailable => FALLBACK_VERDICT.to_string(),
        }
    }
}

#[async_trait]
pub trait IntentOracle: Send + Sync {
    async fn classify(&self, kind: PromptKind, input: &str) -> OracleOutcome;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    response: Option<String>,
}

/// Oracle backed by a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaOracle {
    client: Client,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl OllamaOracle {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> GateResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            timeout,
        })
    }

    pub fn from_config(config: &GateConfig) -> GateResult<Self> {
        Self::new(
            config.oracle_url.clone(),
            config.oracle_model.clone(),
            config.oracle_timeout,
        )
    }

    async fn generate(&self, prompt: String) -> Result<String, String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("timed out after {:?}", self.timeout)
                } else {
                    e.to_string()
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("status {}", status));
        }

        let reply: GenerateReply = response
            .json()
            .await
            .map_err(|e| format!("undecodable reply: {}", e))?;
        reply
            .response
            .ok_or_else(|| "reply has no response field".to_string())
    }
}

#[async_trait]
impl IntentOracle for OllamaOracle {
    async fn classify(&self, kind: PromptKind, input: &str) -> OracleOutcome {
        match self.generate(kind.render(input)).await {
            Ok(text) => {
                debug!(kind = %kind, "Oracle answered");
                OracleOutcome::Classified(text)
            }
            Err(reason) => {
                warn!(kind = %kind, endpoint = %self.endpoint, "Oracle unavailable: {}", reason);
                OracleOutcome::Unavailable
            }
        }
    }
}
