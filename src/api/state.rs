//! Shared application state

use std::sync::Arc;

use crate::gate::AccessGate;

/// Shared state for all routes. The gate owns the vault and oracle handles.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
}

impl AppState {
    pub fn new(gate: Arc<AccessGate>) -> Self {
        Self { gate }
    }
}
