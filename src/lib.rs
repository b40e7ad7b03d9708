//! Vision Gate
//!
//! Access gate for the vision submission service. A request must pass three
//! checks in order before a session is issued:
//!
//! 1. a rotating HMAC-SHA3-512 token bound to the current 30 second window,
//! 2. a bio-state flag, where `DURESS` sanitizes the vision vault,
//! 3. an intent classification by an external language-model oracle.
//!
//! The HTTP surface lives in [`api`] behind the `server` feature.

pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod impact;
pub mod oracle;
pub mod token;
pub mod vault;

#[cfg(feature = "server")]
pub mod api;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{GateConfig, SharedSecret};
pub use error::{ConfigError, GateError, VaultError};
pub use gate::{AccessGate, GateDecision, GateRequest};
pub use oracle::{IntentOracle, OllamaOracle, OracleOutcome, PromptKind};
pub use token::RotatingTokenVerifier;
pub use vault::{PurgeAck, VisionId, VisionRecord, VisionVault};
