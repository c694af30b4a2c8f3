//! Observable state of an offer payment

use std::fmt;
use std::sync::Arc;

use crate::types::{OfferPaymentResult, OutgoingPayment, PaymentFailureReason};
use crate::Error;

/// Offer payment state
#[derive(Debug, Clone, Default)]
pub enum OfferPaymentState {
    /// Nothing sent yet
    #[default]
    Init,
    /// Invoice request in flight
    FetchingInvoice,
    /// Attempt finished
    Complete(Completed),
}

/// Terminal outcome of an attempt
#[derive(Debug, Clone)]
pub enum Completed {
    /// Payment was sent
    Sent {
        /// Completed payment
        payment: OutgoingPayment,
    },
    /// Payment was not sent
    Failed(Failure),
}

/// Failed attempt
#[derive(Debug, Clone)]
pub enum Failure {
    /// No invoice could be fetched for the offer
    CouldNotGetInvoice,
    /// Invoice was fetched but the payment failed
    PaymentNotSent {
        /// Failure classification from the payment layer
        reason: PaymentFailureReason,
    },
    /// Payer note exceeds the allowed length
    PayerNoteTooLong,
    /// Unexpected error
    Error {
        /// Cause
        cause: Arc<Error>,
    },
}

impl OfferPaymentState {
    /// Invoice request is in flight
    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::FetchingInvoice)
    }

    /// Attempt finished
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Attempt finished without sending
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Complete(Completed::Failed(_)))
    }

    /// Sent payment, if any
    pub fn payment(&self) -> Option<&OutgoingPayment> {
        match self {
            Self::Complete(Completed::Sent { payment }) => Some(payment),
            _ => None,
        }
    }
}

impl From<OfferPaymentResult> for Completed {
    fn from(result: OfferPaymentResult) -> Self {
        match result {
            OfferPaymentResult::InvoiceNotObtained => Self::Failed(Failure::CouldNotGetInvoice),
            OfferPaymentResult::PaymentFailed { reason } => {
                Self::Failed(Failure::PaymentNotSent { reason })
            }
            OfferPaymentResult::PaymentCompleted { payment } => Self::Sent { payment },
        }
    }
}

impl From<Error> for Completed {
    fn from(err: Error) -> Self {
        Self::Failed(Failure::Error {
            cause: Arc::new(err),
        })
    }
}

impl From<Completed> for OfferPaymentState {
    fn from(completed: Completed) -> Self {
        Self::Complete(completed)
    }
}

impl fmt::Display for OfferPaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::FetchingInvoice => write!(f, "fetching invoice"),
            Self::Complete(Completed::Sent { payment }) => {
                write!(f, "sent {} (payment {})", payment.amount, payment.id)
            }
            Self::Complete(Completed::Failed(failure)) => match failure {
                Failure::CouldNotGetInvoice => write!(f, "failed: could not get invoice"),
                Failure::PaymentNotSent { reason } => write!(f, "failed: payment not sent, {reason}"),
                Failure::PayerNoteTooLong => write!(f, "failed: payer note too long"),
                Failure::Error { cause } => write!(f, "failed: {cause}"),
            },
        }
    }
}
