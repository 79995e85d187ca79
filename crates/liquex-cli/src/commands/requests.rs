use crate::cli::GlobalArgs;
use crate::commands::common::{
    format_request_lines, open_synced_app, print_json, print_lines, request_to_list_item,
};
use crate::error::CliError;

pub fn run_requests(global: &GlobalArgs, limit: usize, as_json: bool) -> Result<(), CliError> {
    let (app, now_ms) = open_synced_app(global)?;
    let mut views = app.outstanding_requests(now_ms);
    let total = views.len();
    views.truncate(limit);

    if as_json {
        let items = views
            .iter()
            .map(|view| request_to_list_item(view, now_ms))
            .collect::<Vec<_>>();
        return print_json(&items);
    }

    print_lines(format_request_lines(&views, now_ms));
    if total > views.len() {
        println!("... {} more", total - views.len());
    }
    Ok(())
}
