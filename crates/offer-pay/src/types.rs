//! Offer payment types

use std::fmt;

use bitcoin::hashes::sha256;
use bitcoin::secp256k1::rand::rngs::OsRng;
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use lightning::offers::offer::{Offer, OfferId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Amount;

/// Which payer key is revealed to the payee of an offer
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayerKeyPolicy {
    /// Key selection has not finished yet
    #[default]
    Unresolved,
    /// Use a fresh ephemeral key
    UseRandomKey,
    /// Use the node's stable offer payer key
    UseStableKey,
}

impl PayerKeyPolicy {
    /// Key selection has finished
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

impl fmt::Display for PayerKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => write!(f, "unresolved"),
            Self::UseRandomKey => write!(f, "random"),
            Self::UseStableKey => write!(f, "stable"),
        }
    }
}

/// Key material revealed as the sender identity of a payment
#[derive(Clone, PartialEq, Eq)]
pub struct PayerKey {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl PayerKey {
    /// Create [`PayerKey`] from a secret key
    pub fn new(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::signing_only();
        let public_key = secret_key.public_key(&secp);

        Self {
            secret_key,
            public_key,
        }
    }

    /// Generate a random ephemeral key
    pub fn random() -> Self {
        Self::new(SecretKey::new(&mut OsRng))
    }

    /// Secret key
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Public key
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }
}

impl fmt::Debug for PayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayerKey")
            .field("public_key", &format_args!("{}", self.public_key))
            .finish_non_exhaustive()
    }
}

/// Free text attached to an invoice request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayerNote(String);

impl PayerNote {
    /// Normalize a user message, blank messages carry no note
    pub fn from_message(message: &str) -> Option<Self> {
        if message.trim().is_empty() {
            None
        } else {
            Some(Self(message.to_owned()))
        }
    }

    /// Note text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the encoded note in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Note is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PayerNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A known contact
#[derive(Debug, Clone, PartialEq)]
pub struct ContactInfo {
    /// Contact id
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Offers published by this contact
    pub offers: Vec<Offer>,
}

impl ContactInfo {
    /// Create new [`ContactInfo`]
    pub fn new(name: impl Into<String>, offers: Vec<Offer>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            offers,
        }
    }

    /// Contact has published `offer`
    pub fn has_offer(&self, offer: &Offer) -> bool {
        let id = offer.id();
        self.offers.iter().any(|o| o.id() == id)
    }
}

/// Why the payment layer did not send a payment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFailureReason {
    /// Not enough outbound liquidity
    InsufficientBalance,
    /// No route was found
    NoRouteToRecipient,
    /// Recipient could not be reached
    RecipientUnreachable,
    /// All payment attempts failed
    RetryExhausted,
    /// Channels are not ready yet
    ChannelsInitializing,
    /// Invoice requires unsupported features
    FeaturesNotSupported,
    /// Unclassified failure
    Unknown(String),
}

impl fmt::Display for PaymentFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientBalance => write!(f, "insufficient balance"),
            Self::NoRouteToRecipient => write!(f, "no route to recipient"),
            Self::RecipientUnreachable => write!(f, "recipient unreachable"),
            Self::RetryExhausted => write!(f, "retry exhausted"),
            Self::ChannelsInitializing => write!(f, "channels initializing"),
            Self::FeaturesNotSupported => write!(f, "features not supported"),
            Self::Unknown(reason) => write!(f, "unknown: {reason}"),
        }
    }
}

/// Completed outgoing payment record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingPayment {
    /// Payment id
    pub id: Uuid,
    /// Amount received by the payee
    pub amount: Amount,
    /// Routing fees paid
    pub fees: Amount,
    /// Payment hash of the fetched invoice
    pub payment_hash: sha256::Hash,
    /// Payment preimage
    pub preimage: [u8; 32],
    /// Offer that was paid
    pub offer_id: OfferId,
    /// Payer key revealed to the payee
    pub payer_key: PublicKey,
    /// Payer note sent with the invoice request
    pub payer_note: Option<PayerNote>,
    /// Unix time the payment completed
    pub completed_at: u64,
}

/// Outcome of a single offer payment attempt reported by the peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferPaymentResult {
    /// No invoice was received for the offer
    InvoiceNotObtained,
    /// Invoice was fetched but the payment was not sent
    PaymentFailed {
        /// Failure classification
        reason: PaymentFailureReason,
    },
    /// Payment completed
    PaymentCompleted {
        /// Completed payment
        payment: OutgoingPayment,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_message_has_no_note() {
        assert_eq!(PayerNote::from_message(""), None);
        assert_eq!(PayerNote::from_message("   \n\t"), None);

        let note = PayerNote::from_message(" thanks for lunch ").unwrap();
        assert_eq!(note.as_str(), " thanks for lunch ");
    }

    #[test]
    fn test_payer_key_debug_hides_secret() {
        let key = PayerKey::random();
        let debug = format!("{:?}", key);

        assert!(debug.contains(&key.public_key().to_string()));
        assert!(!debug.contains(&key.secret_key().display_secret().to_string()));
    }

    #[test]
    fn test_random_keys_differ() {
        assert_ne!(PayerKey::random(), PayerKey::random());
    }

    #[test]
    fn test_policy_resolved() {
        assert!(!PayerKeyPolicy::Unresolved.is_resolved());
        assert!(PayerKeyPolicy::UseRandomKey.is_resolved());
        assert!(PayerKeyPolicy::UseStableKey.is_resolved());
    }

    #[test]
    fn test_failure_reason_serde() {
        let reason: PaymentFailureReason = serde_json::from_str("\"no_route_to_recipient\"").unwrap();
        assert_eq!(reason, PaymentFailureReason::NoRouteToRecipient);
    }
}
