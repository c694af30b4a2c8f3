//! Controller settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default bound given to the peer for fetching an invoice
pub const DEFAULT_FETCH_INVOICE_TIMEOUT_SECS: u64 = 30;

/// Default time a send waits for the payer key policy
pub const DEFAULT_KEY_RESOLUTION_TIMEOUT_SECS: u64 = 10;

/// Default maximum payer note size in bytes
pub const DEFAULT_MAX_PAYER_NOTE_LEN: usize = 512;

/// Offer payment controller settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds the peer may spend fetching an invoice
    pub fetch_invoice_timeout_secs: u64,
    /// Seconds a send waits for payer key selection to finish
    pub key_resolution_timeout_secs: u64,
    /// Maximum payer note size in bytes
    pub max_payer_note_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fetch_invoice_timeout_secs: DEFAULT_FETCH_INVOICE_TIMEOUT_SECS,
            key_resolution_timeout_secs: DEFAULT_KEY_RESOLUTION_TIMEOUT_SECS,
            max_payer_note_len: DEFAULT_MAX_PAYER_NOTE_LEN,
        }
    }
}

impl Settings {
    /// Invoice fetch bound
    pub fn fetch_invoice_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_invoice_timeout_secs)
    }

    /// Payer key resolution bound
    pub fn key_resolution_timeout(&self) -> Duration {
        Duration::from_secs(self.key_resolution_timeout_secs)
    }

    /// Set invoice fetch bound
    ///
    /// Only whole seconds are kept, sub-second parts are dropped.
    pub fn with_fetch_invoice_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_invoice_timeout_secs = timeout.as_secs();
        self
    }

    /// Set payer key resolution bound
    ///
    /// Only whole seconds are kept, sub-second parts are dropped.
    pub fn with_key_resolution_timeout(mut self, timeout: Duration) -> Self {
        self.key_resolution_timeout_secs = timeout.as_secs();
        self
    }

    /// Set maximum payer note size
    pub fn with_max_payer_note_len(mut self, len: usize) -> Self {
        self.max_payer_note_len = len;
        self
    }
}
