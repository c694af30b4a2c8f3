//! Offer Pay Fake LN Peer
//!
//! Used for testing where offer payments are answered without a lightning node.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

use std::cmp::max;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bitcoin::hashes::{sha256, Hash};
use bitcoin::secp256k1::rand::rngs::OsRng;
use bitcoin::secp256k1::rand::Rng;
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use lightning::offers::offer::{Offer, OfferBuilder};
use offer_pay::{
    Amount, OfferPaymentResult, OutgoingPayment, PayerKey, PayerNote, PaymentFailureReason,
    PeerPaymentService,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::time;
use tracing::instrument;
use uuid::Uuid;

pub mod error;
pub mod store;

pub use error::Error;
pub use store::{MemoryContacts, MemoryPreferences, StaticKeyProvider};

/// Outcome the fake peer reports for an offer
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FakeOutcome {
    /// Invoice fetched and paid
    #[default]
    Paid,
    /// No invoice received
    NoInvoice,
    /// Invoice fetched, payment failed
    Failed,
}

/// Struct for signaling how the fake peer responds via offer description
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeOfferDescription {
    /// Outcome of the payment
    #[serde(default)]
    pub outcome: FakeOutcome,
    /// Failure reason reported when the outcome is [`FakeOutcome::Failed`]
    #[serde(default)]
    pub reason: Option<PaymentFailureReason>,
    /// Should pay offer error
    #[serde(default)]
    pub pay_err: bool,
}

impl FakeOfferDescription {
    /// Read the description carried by `offer`, defaults when absent or not JSON
    pub fn from_offer(offer: &Offer) -> Self {
        offer
            .description()
            .and_then(|description| serde_json::from_str(&description.to_string()).ok())
            .unwrap_or_default()
    }
}

/// Fake Peer
#[derive(Clone)]
pub struct FakePeer {
    payment_delay: Duration,
    fee_percent: f32,
    min_fee: Amount,
    pay_offer_calls: Arc<AtomicUsize>,
    last_payer_key: Arc<Mutex<Option<PayerKey>>>,
    payments: Arc<RwLock<Vec<OutgoingPayment>>>,
}

impl std::fmt::Debug for FakePeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakePeer")
            .field("payment_delay", &self.payment_delay)
            .field("fee_percent", &self.fee_percent)
            .field("min_fee", &self.min_fee)
            .field("pay_offer_calls", &self.pay_offer_calls())
            .finish_non_exhaustive()
    }
}

impl Default for FakePeer {
    fn default() -> Self {
        Self::new(Duration::ZERO, 0.01, Amount::from(1000))
    }
}

impl FakePeer {
    /// Create new [`FakePeer`]
    pub fn new(payment_delay: Duration, fee_percent: f32, min_fee: Amount) -> Self {
        Self {
            payment_delay,
            fee_percent,
            min_fee,
            pay_offer_calls: Arc::new(AtomicUsize::new(0)),
            last_payer_key: Arc::new(Mutex::new(None)),
            payments: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Peer answering after `payment_delay`
    pub fn with_delay(payment_delay: Duration) -> Self {
        Self {
            payment_delay,
            ..Default::default()
        }
    }

    /// Number of `pay_offer` calls received
    pub fn pay_offer_calls(&self) -> usize {
        self.pay_offer_calls.load(Ordering::SeqCst)
    }

    /// Payer key of the latest call
    pub async fn last_payer_key(&self) -> Option<PayerKey> {
        self.last_payer_key.lock().await.clone()
    }

    /// Payments completed so far
    pub async fn payments(&self) -> Vec<OutgoingPayment> {
        self.payments.read().await.clone()
    }

    fn fee_for(&self, amount: Amount) -> Amount {
        let relative_fee = (self.fee_percent * amount.to_msat() as f32) as u64;
        Amount::from(max(relative_fee, self.min_fee.to_msat()))
    }
}

#[async_trait]
impl PeerPaymentService for FakePeer {
    #[instrument(skip_all, fields(offer_id = %offer.id()))]
    async fn pay_offer(
        &self,
        amount: Amount,
        offer: &Offer,
        payer_key: &PayerKey,
        payer_note: Option<&PayerNote>,
        fetch_invoice_timeout: Duration,
    ) -> Result<OfferPaymentResult, offer_pay::Error> {
        self.pay_offer_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payer_key.lock().await = Some(payer_key.clone());

        let description = FakeOfferDescription::from_offer(offer);

        if self.payment_delay > fetch_invoice_timeout {
            time::sleep(fetch_invoice_timeout).await;
            tracing::info!("No invoice within {:?}", fetch_invoice_timeout);
            return Ok(OfferPaymentResult::InvoiceNotObtained);
        }

        time::sleep(self.payment_delay).await;

        if description.pay_err {
            return Err(Error::PeerDisconnected.into());
        }

        let offer_amount = match offer.amount() {
            Some(lightning::offers::offer::Amount::Bitcoin { amount_msats }) => amount_msats,
            _ => 0,
        };

        if amount == Amount::ZERO || amount.to_msat() < offer_amount {
            tracing::warn!(
                "Payee rejects invoice request for {}, offer asks {} msat",
                amount,
                offer_amount
            );
            return Ok(OfferPaymentResult::InvoiceNotObtained);
        }

        match description.outcome {
            FakeOutcome::NoInvoice => Ok(OfferPaymentResult::InvoiceNotObtained),
            FakeOutcome::Failed => Ok(OfferPaymentResult::PaymentFailed {
                reason: description
                    .reason
                    .unwrap_or(PaymentFailureReason::RetryExhausted),
            }),
            FakeOutcome::Paid => {
                let mut rng = OsRng;
                let mut preimage = [0u8; 32];
                rng.fill(&mut preimage);

                let payment = OutgoingPayment {
                    id: Uuid::new_v4(),
                    amount,
                    fees: self.fee_for(amount),
                    payment_hash: sha256::Hash::hash(&preimage),
                    preimage,
                    offer_id: offer.id(),
                    payer_key: payer_key.public_key(),
                    payer_note: payer_note.cloned(),
                    completed_at: unix_time(),
                };

                tracing::info!("Paid {} for offer, payment {}", amount, payment.id);
                self.payments.write().await.push(payment.clone());

                Ok(OfferPaymentResult::PaymentCompleted { payment })
            }
        }
    }
}

/// Create fake offer signed by a random node key
///
/// The description is the JSON encoding of `description`.
pub fn create_fake_offer(
    amount_msat: Option<u64>,
    description: &FakeOfferDescription,
) -> Result<Offer, Error> {
    let secret_key = SecretKey::new(&mut OsRng);
    let secp_ctx = Secp256k1::new();

    let offer_builder = OfferBuilder::new(secret_key.public_key(&secp_ctx))
        .description(serde_json::to_string(description)?);

    let offer_builder = match amount_msat {
        Some(amount_msat) => offer_builder.amount_msats(amount_msat),
        None => offer_builder,
    };

    offer_builder.build().map_err(|_| Error::InvalidOffer)
}

/// Seconds since unix epoch
pub fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
