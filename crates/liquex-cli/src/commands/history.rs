use liquex_core::util::unix_millis_now;

use crate::cli::GlobalArgs;
use crate::commands::common::{format_transaction_line, open_app, print_json, print_lines};
use crate::error::CliError;

pub fn run_history(global: &GlobalArgs, limit: usize, as_json: bool) -> Result<(), CliError> {
    let now_ms = unix_millis_now();
    let app = open_app(global, now_ms)?;
    let history = app.history().into_iter().take(limit).collect::<Vec<_>>();

    if as_json {
        return print_json(&history);
    }
    if history.is_empty() {
        println!("No transactions yet");
        return Ok(());
    }
    print_lines(
        history
            .iter()
            .map(|transaction| format_transaction_line(transaction, now_ms)),
    );
    Ok(())
}
