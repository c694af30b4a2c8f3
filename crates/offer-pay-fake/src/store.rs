//! In-memory preference, contact and key stores

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bitcoin::secp256k1::rand::rngs::OsRng;
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use lightning::offers::offer::Offer;
use offer_pay::{ContactDirectory, ContactInfo, DefaultKeyProvider, PreferenceStore};
use tokio::sync::RwLock;

/// Preferences held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    reveal_stable_key_to_contacts: Arc<AtomicBool>,
}

impl MemoryPreferences {
    /// Create new [`MemoryPreferences`]
    pub fn new(reveal_stable_key_to_contacts: bool) -> Self {
        Self {
            reveal_stable_key_to_contacts: Arc::new(AtomicBool::new(
                reveal_stable_key_to_contacts,
            )),
        }
    }

    /// Update the reveal-to-contacts flag
    pub fn set_reveal_stable_key_to_contacts(&self, reveal: bool) {
        self.reveal_stable_key_to_contacts
            .store(reveal, Ordering::SeqCst);
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn reveal_stable_key_to_contacts(&self) -> Result<bool, offer_pay::Error> {
        Ok(self.reveal_stable_key_to_contacts.load(Ordering::SeqCst))
    }
}

/// Contacts held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryContacts {
    contacts: Arc<RwLock<Vec<ContactInfo>>>,
    fail_lookup: Arc<AtomicBool>,
}

impl MemoryContacts {
    /// Create new [`MemoryContacts`]
    pub fn new(contacts: Vec<ContactInfo>) -> Self {
        Self {
            contacts: Arc::new(RwLock::new(contacts)),
            fail_lookup: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a contact
    pub async fn add_contact(&self, contact: ContactInfo) {
        self.contacts.write().await.push(contact);
    }

    /// Make every lookup fail
    pub fn set_fail_lookup(&self, fail: bool) {
        self.fail_lookup.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContactDirectory for MemoryContacts {
    async fn find_contact_for_offer(
        &self,
        offer: &Offer,
    ) -> Result<Option<ContactInfo>, offer_pay::Error> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(offer_pay::Error::ContactLookup(
                "contact store unavailable".to_string(),
            ));
        }

        Ok(self
            .contacts
            .read()
            .await
            .iter()
            .find(|contact| contact.has_offer(offer))
            .cloned())
    }
}

/// Fixed stable payer key
#[derive(Clone)]
pub struct StaticKeyProvider {
    secret_key: SecretKey,
}

impl std::fmt::Debug for StaticKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticKeyProvider")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl StaticKeyProvider {
    /// Create new [`StaticKeyProvider`]
    pub fn new(secret_key: SecretKey) -> Self {
        Self { secret_key }
    }

    /// Provider with a random key
    pub fn random() -> Self {
        Self::new(SecretKey::new(&mut OsRng))
    }

    /// Public key of the stable payer key
    pub fn public_key(&self) -> PublicKey {
        self.secret_key.public_key(&Secp256k1::signing_only())
    }
}

#[async_trait]
impl DefaultKeyProvider for StaticKeyProvider {
    async fn stable_payer_key(&self) -> Result<SecretKey, offer_pay::Error> {
        Ok(self.secret_key)
    }
}
