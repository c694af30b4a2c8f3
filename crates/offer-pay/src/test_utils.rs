//! Test collaborators for unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bitcoin::hashes::{sha256, Hash};
use bitcoin::secp256k1::rand::rngs::OsRng;
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use lightning::offers::offer::{Offer, OfferBuilder};
use tokio::sync::Mutex;

use crate::service::{ContactDirectory, DefaultKeyProvider, PeerPaymentService, PreferenceStore};
use crate::types::{ContactInfo, OfferPaymentResult, OutgoingPayment, PayerKey, PayerNote};
use crate::{Amount, Error};

/// Offer signed by a random node key
pub fn test_offer() -> Offer {
    let secp = Secp256k1::new();
    let secret_key = SecretKey::new(&mut OsRng);

    OfferBuilder::new(secret_key.public_key(&secp))
        .description("test offer".to_string())
        .build()
        .expect("valid offer")
}

pub struct TestPreferences {
    reveal: bool,
    fail: bool,
}

impl TestPreferences {
    pub fn new(reveal: bool) -> Self {
        Self {
            reveal,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            reveal: true,
            fail: true,
        }
    }
}

#[async_trait]
impl PreferenceStore for TestPreferences {
    async fn reveal_stable_key_to_contacts(&self) -> Result<bool, Error> {
        if self.fail {
            return Err(Error::Preference("store closed".to_string()));
        }
        Ok(self.reveal)
    }
}

#[derive(Default)]
pub struct TestContacts {
    contacts: Vec<ContactInfo>,
    fail: AtomicBool,
    /// Delay before answering a lookup
    pub delay: Option<Duration>,
    pub lookups: Arc<AtomicUsize>,
}

impl TestContacts {
    pub fn with(contacts: Vec<ContactInfo>) -> Self {
        Self {
            contacts,
            ..Default::default()
        }
    }

    pub fn fail_lookup(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContactDirectory for TestContacts {
    async fn find_contact_for_offer(&self, offer: &Offer) -> Result<Option<ContactInfo>, Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::ContactLookup("directory unavailable".to_string()));
        }

        Ok(self.contacts.iter().find(|c| c.has_offer(offer)).cloned())
    }
}

pub struct TestKeyProvider {
    pub key: SecretKey,
    fail: bool,
}

impl TestKeyProvider {
    pub fn new() -> Self {
        Self {
            key: SecretKey::new(&mut OsRng),
            fail: false,
        }
    }

    /// Provider whose key store is locked
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl DefaultKeyProvider for TestKeyProvider {
    async fn stable_payer_key(&self) -> Result<SecretKey, Error> {
        if self.fail {
            return Err(Error::KeyProvider("locked".to_string()));
        }
        Ok(self.key)
    }
}

/// What [`TestPeer`] does when asked to pay
#[derive(Debug, Clone)]
pub enum PeerBehavior {
    Pay,
    Respond(OfferPaymentResult),
    Fail,
    Panic,
}

pub struct TestPeer {
    behavior: PeerBehavior,
    delay: Option<Duration>,
    pub calls: Arc<AtomicUsize>,
    pub last_payer_key: Arc<Mutex<Option<PayerKey>>>,
}

impl TestPeer {
    pub fn new(behavior: PeerBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            last_payer_key: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl PeerPaymentService for TestPeer {
    async fn pay_offer(
        &self,
        amount: Amount,
        offer: &Offer,
        payer_key: &PayerKey,
        payer_note: Option<&PayerNote>,
        _fetch_invoice_timeout: Duration,
    ) -> Result<OfferPaymentResult, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payer_key.lock().await = Some(payer_key.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            PeerBehavior::Pay => Ok(OfferPaymentResult::PaymentCompleted {
                payment: test_payment(amount, offer, payer_key, payer_note),
            }),
            PeerBehavior::Respond(result) => Ok(result.clone()),
            PeerBehavior::Fail => Err(Error::Peer("peer disconnected".to_string())),
            PeerBehavior::Panic => panic!("peer exploded"),
        }
    }
}

pub fn test_payment(
    amount: Amount,
    offer: &Offer,
    payer_key: &PayerKey,
    payer_note: Option<&PayerNote>,
) -> OutgoingPayment {
    let preimage = [7u8; 32];

    OutgoingPayment {
        id: uuid::Uuid::new_v4(),
        amount,
        fees: Amount::from(1000),
        payment_hash: sha256::Hash::hash(&preimage),
        preimage,
        offer_id: offer.id(),
        payer_key: payer_key.public_key(),
        payer_note: payer_note.cloned(),
        completed_at: 1_700_000_000,
    }
}
