//! Offer payment errors

use thiserror::Error;

/// Offer Pay Error
#[derive(Debug, Error)]
pub enum Error {
    /// Payer key policy was not resolved in time
    #[error("Payer key policy is not resolved")]
    PayerKeyUnresolved,
    /// Operation timed out
    #[error("Timeout")]
    Timeout,
    /// Controller was shut down
    #[error("Cancelled")]
    Cancelled,
    /// Preference store error
    #[error("Preference store error: {0}")]
    Preference(String),
    /// Contact directory error
    #[error("Contact lookup error: {0}")]
    ContactLookup(String),
    /// Default key provider error
    #[error("Key provider error: {0}")]
    KeyProvider(String),
    /// Peer payment service error
    #[error("Peer error: {0}")]
    Peer(String),
    /// Payment attempt panicked
    #[error("Payment attempt panicked: {0}")]
    Panicked(String),
    /// Invalid amount
    #[error("Invalid Amount: {0}")]
    InvalidAmount(String),
    /// Could not parse bolt12 offer
    #[error("Could not parse bolt12 offer")]
    Bolt12Parse,
    /// Secp256k1 Error
    #[error(transparent)]
    Secp256k1(#[from] bitcoin::secp256k1::Error),
    /// AnyHow Error
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    /// Custom
    #[error("`{0}`")]
    Custom(String),
}
