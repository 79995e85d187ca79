use crate::cli::GlobalArgs;
use crate::commands::common::{format_analytics_lines, open_synced_app, print_json, print_lines};
use crate::error::CliError;

pub fn run_analytics(global: &GlobalArgs, as_json: bool) -> Result<(), CliError> {
    let (app, _) = open_synced_app(global)?;
    let analytics = app.analytics();

    if as_json {
        print_json(&analytics)
    } else {
        print_lines(format_analytics_lines(&analytics));
        Ok(())
    }
}
