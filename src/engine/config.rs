//! Ledger configuration options.

use serde::{Deserialize, Serialize};

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Mirror every ledger event to `tracing` at info level.
    pub trace_events: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            trace_events: false,
        }
    }
}
