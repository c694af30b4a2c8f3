use anyhow::{anyhow, Result};
use clap::Args;
use offer_pay::PaymentFailureReason;
use offer_pay_fake::{create_fake_offer, FakeOfferDescription, FakeOutcome};
use serde::de::DeserializeOwned;

#[derive(Args)]
pub struct CreateOfferSubCommand {
    /// Minimum amount the offer asks for
    #[arg(long)]
    amount_msat: Option<u64>,
    /// How the fake peer answers: paid, no_invoice or failed
    #[arg(long, default_value = "paid", value_parser = parse_snake_case::<FakeOutcome>)]
    outcome: FakeOutcome,
    /// Failure reason reported for a failed outcome
    #[arg(long, value_parser = parse_reason)]
    reason: Option<PaymentFailureReason>,
    /// Make the fake peer error mid payment
    #[arg(long)]
    pay_err: bool,
}

pub fn create_offer(sub_command_args: &CreateOfferSubCommand) -> Result<()> {
    let description = FakeOfferDescription {
        outcome: sub_command_args.outcome,
        reason: sub_command_args.reason.clone(),
        pay_err: sub_command_args.pay_err,
    };

    let offer = create_fake_offer(sub_command_args.amount_msat, &description)?;

    println!("{offer}");
    Ok(())
}

fn parse_snake_case<T: DeserializeOwned>(value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| anyhow!("Unknown value: {value}"))
}

fn parse_reason(value: &str) -> Result<PaymentFailureReason> {
    Ok(parse_snake_case(value).unwrap_or(PaymentFailureReason::Unknown(value.to_string())))
}
