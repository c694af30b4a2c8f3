//! Payer key selection
//!
//! The stable payer key links a payment to the node identity, so it is only revealed when the
//! user opted in and the offer was published by a known contact. Every other case, including a
//! failing lookup, uses a random key.

use std::sync::Arc;

use lightning::offers::offer::Offer;
use tracing::instrument;

use crate::service::{ContactDirectory, PreferenceStore};
use crate::types::PayerKeyPolicy;

/// Resolves the [`PayerKeyPolicy`] for an offer
#[derive(Clone)]
pub struct PayerKeySelector {
    preferences: Arc<dyn PreferenceStore>,
    contacts: Arc<dyn ContactDirectory>,
}

impl std::fmt::Debug for PayerKeySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayerKeySelector").finish_non_exhaustive()
    }
}

impl PayerKeySelector {
    /// Create new [`PayerKeySelector`]
    pub fn new(preferences: Arc<dyn PreferenceStore>, contacts: Arc<dyn ContactDirectory>) -> Self {
        Self {
            preferences,
            contacts,
        }
    }

    /// Select the payer key policy for `offer`
    ///
    /// Never returns [`PayerKeyPolicy::Unresolved`].
    #[instrument(skip_all, fields(offer_id = %offer.id()))]
    pub async fn select(&self, offer: &Offer) -> PayerKeyPolicy {
        let reveal_to_contacts = match self.preferences.reveal_stable_key_to_contacts().await {
            Ok(reveal) => reveal,
            Err(err) => {
                tracing::warn!("Could not read payer key preference, using random key: {}", err);
                false
            }
        };

        if !reveal_to_contacts {
            return PayerKeyPolicy::UseRandomKey;
        }

        match self.contacts.find_contact_for_offer(offer).await {
            Ok(Some(contact)) => {
                tracing::debug!("Offer belongs to contact {}, using stable key", contact.id);
                PayerKeyPolicy::UseStableKey
            }
            Ok(None) => PayerKeyPolicy::UseRandomKey,
            Err(err) => {
                tracing::warn!("Contact lookup failed, using random key: {}", err);
                PayerKeyPolicy::UseRandomKey
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_offer, TestContacts, TestPreferences};
    use crate::types::ContactInfo;

    fn selector(preferences: TestPreferences, contacts: TestContacts) -> PayerKeySelector {
        PayerKeySelector::new(Arc::new(preferences), Arc::new(contacts))
    }

    #[tokio::test]
    async fn test_preference_off_always_random() {
        let offer = test_offer();
        let contacts = TestContacts::with(vec![ContactInfo::new("alice", vec![offer.clone()])]);

        let policy = selector(TestPreferences::new(false), contacts)
            .select(&offer)
            .await;
        assert_eq!(policy, PayerKeyPolicy::UseRandomKey);

        let policy = selector(TestPreferences::new(false), TestContacts::default())
            .select(&offer)
            .await;
        assert_eq!(policy, PayerKeyPolicy::UseRandomKey);
    }

    #[tokio::test]
    async fn test_preference_off_skips_contact_lookup() {
        let contacts = TestContacts::default();
        let lookups = contacts.lookups.clone();

        selector(TestPreferences::new(false), contacts)
            .select(&test_offer())
            .await;

        assert_eq!(lookups.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_known_contact_uses_stable_key() {
        let offer = test_offer();
        let contacts = TestContacts::with(vec![
            ContactInfo::new("bob", vec![test_offer()]),
            ContactInfo::new("alice", vec![test_offer(), offer.clone()]),
        ]);

        let policy = selector(TestPreferences::new(true), contacts)
            .select(&offer)
            .await;

        assert_eq!(policy, PayerKeyPolicy::UseStableKey);
    }

    #[tokio::test]
    async fn test_unknown_offer_uses_random_key() {
        let contacts = TestContacts::with(vec![ContactInfo::new("bob", vec![test_offer()])]);

        let policy = selector(TestPreferences::new(true), contacts)
            .select(&test_offer())
            .await;

        assert_eq!(policy, PayerKeyPolicy::UseRandomKey);
    }

    #[tokio::test]
    async fn test_lookup_failure_uses_random_key() {
        let offer = test_offer();
        let contacts = TestContacts::with(vec![ContactInfo::new("alice", vec![offer.clone()])]);
        contacts.fail_lookup();

        let policy = selector(TestPreferences::new(true), contacts)
            .select(&offer)
            .await;

        assert_eq!(policy, PayerKeyPolicy::UseRandomKey);
    }

    #[tokio::test]
    async fn test_preference_failure_uses_random_key() {
        let offer = test_offer();
        let contacts = TestContacts::with(vec![ContactInfo::new("alice", vec![offer.clone()])]);

        let policy = selector(TestPreferences::failing(), contacts)
            .select(&offer)
            .await;

        assert_eq!(policy, PayerKeyPolicy::UseRandomKey);
    }
}
