use liquex_core::util::unix_millis_now;

use crate::cli::GlobalArgs;
use crate::commands::common::{format_meetup_lines, open_app, print_json, print_lines};
use crate::error::CliError;

pub fn run_meetups(global: &GlobalArgs, as_json: bool) -> Result<(), CliError> {
    let app = open_app(global, unix_millis_now())?;
    let spots = app.safe_meetup_spots();

    if as_json {
        print_json(&spots)
    } else {
        print_lines(format_meetup_lines(&spots));
        Ok(())
    }
}
