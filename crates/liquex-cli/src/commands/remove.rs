use liquex_core::util::unix_millis_now;
use liquex_core::RequestId;

use crate::cli::GlobalArgs;
use crate::commands::common::open_app;
use crate::error::CliError;

pub fn run_remove(global: &GlobalArgs, id: RequestId) -> Result<(), CliError> {
    let now_ms = unix_millis_now();
    let mut app = open_app(global, now_ms)?;
    app.remove_request(id, now_ms)?;

    println!("Removed request {id}");
    Ok(())
}
