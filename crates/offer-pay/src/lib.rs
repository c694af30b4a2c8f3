//! Paying BOLT12 offers
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod amount;
pub mod controller;
pub mod error;
pub mod key_selector;
pub mod service;
pub mod settings;
pub mod state;
pub mod task;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

// re-exporting external crates
pub use bitcoin;
pub use lightning;

pub use self::amount::Amount;
pub use self::controller::OfferPaymentController;
pub use self::error::Error;
pub use self::key_selector::PayerKeySelector;
pub use self::service::{ContactDirectory, DefaultKeyProvider, PeerPaymentService, PreferenceStore};
pub use self::settings::Settings;
pub use self::state::{Completed, Failure, OfferPaymentState};
pub use self::types::{
    ContactInfo, OfferPaymentResult, OutgoingPayment, PayerKey, PayerKeyPolicy, PayerNote,
    PaymentFailureReason,
};
