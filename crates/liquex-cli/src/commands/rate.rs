use liquex_core::util::unix_millis_now;

use crate::cli::GlobalArgs;
use crate::commands::common::open_app;
use crate::error::CliError;

pub fn run_rate(
    global: &GlobalArgs,
    username: &str,
    rating: u8,
    comment: Option<String>,
) -> Result<(), CliError> {
    let now_ms = unix_millis_now();
    let mut app = open_app(global, now_ms)?;
    app.rate_user(username, rating, comment, now_ms)?;

    match app.average_rating(username) {
        Some(average) => println!("{username} is now rated {average:.1}"),
        None => println!("Rated {username}"),
    }
    Ok(())
}
