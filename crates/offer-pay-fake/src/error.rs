//! Fake Peer Error

use thiserror::Error;

/// Fake Peer Error
#[derive(Debug, Error)]
pub enum Error {
    /// Peer connection dropped mid payment
    #[error("Peer disconnected")]
    PeerDisconnected,
    /// Offer could not be built
    #[error("Invalid offer")]
    InvalidOffer,
    /// Serde Error
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl From<Error> for offer_pay::Error {
    fn from(e: Error) -> Self {
        Self::Peer(e.to_string())
    }
}
