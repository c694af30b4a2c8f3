//! Offer payment controller
//!
//! Drives one offer through key selection, invoice fetch and payment, publishing every
//! transition on a [`watch`] channel.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use lightning::offers::offer::Offer;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::key_selector::PayerKeySelector;
use crate::service::{ContactDirectory, DefaultKeyProvider, PeerPaymentService, PreferenceStore};
use crate::settings::Settings;
use crate::state::{Completed, Failure, OfferPaymentState};
use crate::task::spawn_cancellable;
use crate::types::{PayerKey, PayerKeyPolicy, PayerNote};
use crate::{Amount, Error};

/// State machine paying a single BOLT12 offer
///
/// Payer key selection starts in the background as soon as the controller is created. Dropping
/// the controller cancels it together with any attempt still in flight.
pub struct OfferPaymentController {
    offer: Offer,
    settings: Settings,
    state: Arc<watch::Sender<OfferPaymentState>>,
    policy: watch::Receiver<PayerKeyPolicy>,
    key_provider: Arc<dyn DefaultKeyProvider>,
    peer: Arc<dyn PeerPaymentService>,
    handle: Handle,
    cancel: CancellationToken,
}

impl std::fmt::Debug for OfferPaymentController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfferPaymentController")
            .field("offer_id", &self.offer.id())
            .field("settings", &self.settings)
            .field("state", &*self.state.borrow())
            .field("policy", &*self.policy.borrow())
            .finish_non_exhaustive()
    }
}

impl OfferPaymentController {
    /// Create new [`OfferPaymentController`] and start payer key selection
    ///
    /// Must be called from within a Tokio runtime. Later calls to
    /// [`send_offer`](Self::send_offer) may come from any thread.
    pub fn new(
        offer: Offer,
        preferences: Arc<dyn PreferenceStore>,
        contacts: Arc<dyn ContactDirectory>,
        key_provider: Arc<dyn DefaultKeyProvider>,
        peer: Arc<dyn PeerPaymentService>,
        settings: Settings,
    ) -> Self {
        let handle = Handle::current();
        let cancel = CancellationToken::new();
        let (state, _) = watch::channel(OfferPaymentState::Init);
        let (policy_tx, policy) = watch::channel(PayerKeyPolicy::Unresolved);

        let selector = PayerKeySelector::new(preferences, contacts);
        let selection_offer = offer.clone();
        spawn_cancellable(&handle, cancel.child_token(), async move {
            let resolved = selector.select(&selection_offer).await;
            tracing::debug!("Payer key policy resolved: {}", resolved);
            policy_tx.send_replace(resolved);
        });

        Self {
            offer,
            settings,
            state: Arc::new(state),
            policy,
            key_provider,
            peer,
            handle,
            cancel,
        }
    }

    /// Offer this controller was created for
    pub fn offer(&self) -> &Offer {
        &self.offer
    }

    /// Controller settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current state
    pub fn state(&self) -> OfferPaymentState {
        self.state.borrow().clone()
    }

    /// Subscribe to state transitions
    ///
    /// The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<OfferPaymentState> {
        self.state.subscribe()
    }

    /// Current payer key policy
    pub fn payer_key_policy(&self) -> PayerKeyPolicy {
        *self.policy.borrow()
    }

    /// Pay `offer`
    ///
    /// Returns `false` without doing anything when an attempt is already fetching an invoice or
    /// the controller has been shut down. Otherwise the state moves to [`OfferPaymentState::FetchingInvoice`] before this returns
    /// and the attempt continues in the background until it reaches a terminal state.
    #[instrument(skip(self, message, offer))]
    pub fn send_offer(&self, amount: Amount, message: &str, offer: &Offer) -> bool {
        if self.cancel.is_cancelled() {
            tracing::debug!("Ignoring send, controller is shut down");
            return false;
        }

        let accepted = self.state.send_if_modified(|state| {
            if state.is_fetching() {
                return false;
            }
            *state = OfferPaymentState::FetchingInvoice;
            true
        });

        if !accepted {
            tracing::debug!("Ignoring send, invoice request already in flight");
            return false;
        }

        let attempt = PaymentAttempt {
            amount,
            message: message.to_owned(),
            offer: offer.clone(),
            settings: self.settings.clone(),
            policy: self.policy.clone(),
            key_provider: self.key_provider.clone(),
            peer: self.peer.clone(),
        };

        let state = self.state.clone();
        let cancel = self.cancel.child_token();
        let task_cancel = cancel.clone();

        spawn_cancellable(&self.handle, cancel, async move {
            let completed = attempt.run().await;

            // A cancelled controller publishes nothing more
            if task_cancel.is_cancelled() {
                return;
            }

            state.send_replace(completed.into());
        });

        true
    }

    /// Wait until the state is terminal
    ///
    /// Returns immediately when the state is already terminal, so without a send in flight this
    /// yields the outcome of the previous attempt. Call it after [`send_offer`](Self::send_offer)
    /// to wait for that send.
    pub async fn wait_for_completion(
        &self,
        timeout: Duration,
    ) -> Result<OfferPaymentState, Error> {
        let mut receiver = self.state.subscribe();

        let completed = tokio::time::timeout(timeout, async move {
            let state = receiver
                .wait_for(OfferPaymentState::is_complete)
                .await
                .map(|state| state.clone());
            state
        })
        .await
        .map_err(|_| Error::Timeout)?;

        completed.map_err(|_| Error::Cancelled)
    }

    /// Cancel key selection and any attempt in flight
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for OfferPaymentController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Everything a single send needs, detached from the controller
struct PaymentAttempt {
    amount: Amount,
    message: String,
    offer: Offer,
    settings: Settings,
    policy: watch::Receiver<PayerKeyPolicy>,
    key_provider: Arc<dyn DefaultKeyProvider>,
    peer: Arc<dyn PeerPaymentService>,
}

impl PaymentAttempt {
    /// Run the attempt, folding errors and panics into a terminal state
    async fn run(self) -> Completed {
        match AssertUnwindSafe(self.execute()).catch_unwind().await {
            Ok(Ok(completed)) => completed,
            Ok(Err(err)) => {
                tracing::error!("Error when paying offer: {}", err);
                Completed::from(err)
            }
            Err(panic) => {
                let message = panic_message(&*panic);
                tracing::error!("Offer payment attempt panicked: {}", message);
                Completed::from(Error::Panicked(message))
            }
        }
    }

    #[instrument(skip_all, fields(amount = %self.amount, offer_id = %self.offer.id()))]
    async fn execute(self) -> Result<Completed, Error> {
        let payer_note = PayerNote::from_message(&self.message);

        if let Some(note) = &payer_note {
            if note.len() > self.settings.max_payer_note_len {
                tracing::warn!(
                    "Payer note is {} bytes, max is {}",
                    note.len(),
                    self.settings.max_payer_note_len
                );
                return Ok(Completed::Failed(Failure::PayerNoteTooLong));
            }
        }

        let policy =
            wait_for_policy(self.policy, self.settings.key_resolution_timeout()).await?;

        let payer_key = match policy {
            PayerKeyPolicy::UseRandomKey => PayerKey::random(),
            PayerKeyPolicy::UseStableKey => {
                PayerKey::new(self.key_provider.stable_payer_key().await?)
            }
            PayerKeyPolicy::Unresolved => return Err(Error::PayerKeyUnresolved),
        };

        tracing::info!(
            "Sending amount={} key={} payer_note={:?}",
            self.amount,
            policy,
            payer_note.as_ref().map(PayerNote::as_str)
        );

        let result = self
            .peer
            .pay_offer(
                self.amount,
                &self.offer,
                &payer_key,
                payer_note.as_ref(),
                self.settings.fetch_invoice_timeout(),
            )
            .await?;

        tracing::debug!("Offer payment result: {:?}", result);

        Ok(result.into())
    }
}

/// Wait for payer key selection, bounded by `bound`
async fn wait_for_policy(
    mut policy: watch::Receiver<PayerKeyPolicy>,
    bound: Duration,
) -> Result<PayerKeyPolicy, Error> {
    let resolved = tokio::time::timeout(bound, async move {
        let resolved = policy
            .wait_for(PayerKeyPolicy::is_resolved)
            .await
            .map(|policy| *policy);
        resolved
    })
    .await;

    match resolved {
        Ok(Ok(policy)) => Ok(policy),
        Ok(Err(_)) => {
            tracing::warn!("Payer key selection stopped before resolving");
            Err(Error::PayerKeyUnresolved)
        }
        Err(_) => {
            tracing::warn!("Payer key selection did not finish within {:?}", bound);
            Err(Error::PayerKeyUnresolved)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
