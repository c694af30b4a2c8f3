use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clap::Args;
use offer_pay::bitcoin::hex::DisplayHex;
use offer_pay::lightning::offers::offer::Offer;
use offer_pay::{Amount, Completed, OfferPaymentController, OfferPaymentState};
use offer_pay_fake::{MemoryContacts, MemoryPreferences};

use crate::config::Settings;

#[derive(Args)]
pub struct PaySubCommand {
    /// BOLT12 offer
    #[arg(long)]
    offer: String,
    /// Amount to pay in millisatoshi
    #[arg(long)]
    amount_msat: u64,
    /// Note for the payee
    #[arg(long, default_value = "")]
    message: String,
}

pub async fn pay(settings: &Settings, sub_command_args: &PaySubCommand) -> Result<()> {
    let offer = Offer::from_str(sub_command_args.offer.trim())
        .map_err(|_| anyhow!("Invalid offer"))?;
    let amount = Amount::from(sub_command_args.amount_msat);

    let contacts = MemoryContacts::new(
        settings
            .contacts
            .iter()
            .map(|contact| contact.to_contact_info())
            .collect(),
    );

    let controller = OfferPaymentController::new(
        offer.clone(),
        Arc::new(MemoryPreferences::new(
            settings.privacy.reveal_stable_key_to_contacts,
        )),
        Arc::new(contacts),
        Arc::new(settings.privacy.key_provider()?),
        Arc::new(settings.fake_peer.peer()),
        settings.payment.clone(),
    );

    let mut receiver = controller.subscribe();
    println!("State: {}", *receiver.borrow_and_update());

    if !controller.send_offer(amount, &sub_command_args.message, &offer) {
        bail!("Payment already in flight");
    }

    let state = loop {
        let state = receiver.borrow_and_update().clone();
        println!("State: {state}");

        if state.is_complete() {
            break state;
        }

        receiver
            .changed()
            .await
            .map_err(|_| anyhow!("Controller stopped"))?;
    };

    println!("Payer key policy: {}", controller.payer_key_policy());

    match state {
        OfferPaymentState::Complete(Completed::Sent { payment }) => {
            println!("Paid {} with {} fees", payment.amount, payment.fees);
            println!("Payment hash: {}", payment.payment_hash);
            println!("Payment preimage: {}", payment.preimage.as_hex());
            Ok(())
        }
        other => bail!("Payment not completed: {other}"),
    }
}
