//! Rotating access tokens
//!
//! A token is `hex(HMAC-SHA3-512(secret, decimal(unix_seconds / window)))`.
//! It is valid only while its window is current. There is no skew
//! tolerance: a request that crosses a window boundary fails and the client
//! must derive the token again.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha3::Sha3_512;
use subtle::ConstantTimeEq;

use crate::clock::Clock;
use crate::config::SharedSecret;
use crate::error::ConfigError;

pub type HmacSha3_512 = Hmac<Sha3_512>;

/// Verifies client tokens against the window the clock currently reports.
pub struct RotatingTokenVerifier {
    keyed: HmacSha3_512,
    window_secs: u64,
    clock: Arc<dyn Clock>,
}

impl RotatingTokenVerifier {
    pub fn new(
        secret: &SharedSecret,
        window: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let window_secs = window.as_secs();
        if window_secs == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        let keyed =
            HmacSha3_512::new_from_slice(secret.as_bytes()).map_err(|e| ConfigError::Invalid {
                var: "GATE_SHARED_SECRET",
                value: "***".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            keyed,
            window_secs,
            clock,
        })
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    /// Current time step.
    pub fn time_step(&self) -> u64 {
        self.clock.unix_seconds() / self.window_secs
    }

    pub fn token_for_step(&self, step: u64) -> String {
        let mut mac = self.keyed.clone();
        mac.update(step.to_string().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Token a client must present right now.
    pub fn expected_token(&self) -> String {
        self.token_for_step(self.time_step())
    }

    /// True iff `candidate` is present and matches the current window's token.
    ///
    /// The byte comparison is constant time; only the (public) token length
    /// can short-circuit it.
    pub fn verify(&self, candidate: Option<&str>) -> bool {
        let Some(candidate) = candidate else {
            return false;
        };
        let expected = self.expected_token();
        bool::from(expected.as_bytes().ct_eq(candidate.as_bytes()))
    }
}

impl std::fmt::Debug for RotatingTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingTokenVerifier")
            .field("window_secs", &self.window_secs)
            .finish_non_exhaustive()
    }
}
