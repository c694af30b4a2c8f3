//! Collaborators consumed by the offer payment controller
//!
//! Preferences, contacts, the node key and the lightning peer are owned by the host application.
//! The controller only reads from them through these traits.

use std::time::Duration;

use async_trait::async_trait;
use bitcoin::secp256k1::SecretKey;
use lightning::offers::offer::Offer;

use crate::types::{ContactInfo, OfferPaymentResult, PayerKey, PayerNote};
use crate::{Amount, Error};

/// Persisted user preferences
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Reveal the stable payer key when paying offers of known contacts
    async fn reveal_stable_key_to_contacts(&self) -> Result<bool, Error>;
}

/// Contact lookup
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Contact that published `offer`, if any
    async fn find_contact_for_offer(&self, offer: &Offer) -> Result<Option<ContactInfo>, Error>;
}

/// Node key used as the stable offer payer key
#[async_trait]
pub trait DefaultKeyProvider: Send + Sync {
    /// Stable payer key of the node's default offer
    async fn stable_payer_key(&self) -> Result<SecretKey, Error>;
}

/// Lightning peer able to pay offers
#[async_trait]
pub trait PeerPaymentService: Send + Sync {
    /// Fetch an invoice for `offer` and pay it
    ///
    /// The peer gives up on the invoice request after `fetch_invoice_timeout` and reports
    /// [`OfferPaymentResult::InvoiceNotObtained`].
    async fn pay_offer(
        &self,
        amount: Amount,
        offer: &Offer,
        payer_key: &PayerKey,
        payer_note: Option<&PayerNote>,
        fetch_invoice_timeout: Duration,
    ) -> Result<OfferPaymentResult, Error>;
}
