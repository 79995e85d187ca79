use liquex_core::util::unix_millis_now;
use liquex_core::TransferDraft;

use crate::cli::GlobalArgs;
use crate::commands::common::open_app;
use crate::error::CliError;

pub fn run_transfer(
    global: &GlobalArgs,
    recipient: String,
    amount: f64,
    reason: Option<String>,
    description: Option<String>,
) -> Result<(), CliError> {
    let now_ms = unix_millis_now();
    let mut app = open_app(global, now_ms)?;
    let (transfer, transaction) = app.transfer(
        TransferDraft {
            recipient,
            amount,
            reason,
            description,
        },
        now_ms,
    )?;

    println!(
        "Sent ${:.2} to {} ({:.0}m away)",
        transfer.amount, transfer.recipient, transfer.distance_m
    );
    println!("{}", transaction.id);
    Ok(())
}
