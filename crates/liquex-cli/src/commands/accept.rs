use liquex_core::util::unix_millis_now;
use liquex_core::RequestId;

use crate::cli::GlobalArgs;
use crate::commands::common::open_app;
use crate::error::CliError;

pub fn run_accept(global: &GlobalArgs, id: RequestId) -> Result<(), CliError> {
    let now_ms = unix_millis_now();
    let mut app = open_app(global, now_ms)?;
    let transaction = app.accept_request(id, now_ms)?;

    println!(
        "{}  ${:.2} to {}",
        transaction.id, transaction.amount, transaction.requester
    );
    Ok(())
}
