use liquex_core::util::unix_millis_now;

use crate::cli::GlobalArgs;
use crate::commands::common::{format_transfer_line, open_app, print_json, print_lines};
use crate::error::CliError;

pub fn run_transfers(global: &GlobalArgs, as_json: bool) -> Result<(), CliError> {
    let now_ms = unix_millis_now();
    let app = open_app(global, now_ms)?;
    let mut transfers = app.registry().proximity_transfers();
    transfers.reverse();

    if as_json {
        return print_json(&transfers);
    }
    if transfers.is_empty() {
        println!("No transfers yet");
        return Ok(());
    }
    print_lines(
        transfers
            .iter()
            .map(|transfer| format_transfer_line(transfer, now_ms)),
    );
    Ok(())
}
