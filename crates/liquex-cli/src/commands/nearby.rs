use crate::cli::GlobalArgs;
use crate::commands::common::{
    format_neighbour_lines, neighbour_to_list_item, open_synced_app, print_json, print_lines,
};
use crate::error::CliError;

pub fn run_nearby(global: &GlobalArgs, as_json: bool) -> Result<(), CliError> {
    let (app, _) = open_synced_app(global)?;
    let radius_m = app.proximity().radius_m();
    let neighbours = app.nearby_users();

    if as_json {
        let items = neighbours
            .iter()
            .map(|nearby| neighbour_to_list_item(nearby, radius_m))
            .collect::<Vec<_>>();
        print_json(&items)
    } else {
        print_lines(format_neighbour_lines(&neighbours, radius_m));
        Ok(())
    }
}
