use liquex_core::models::Notification;
use liquex_core::util::unix_millis_now;
use serde::Serialize;

use crate::cli::GlobalArgs;
use crate::commands::common::{format_notification_lines, open_app, print_json, print_lines};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SyncSummary {
    added: usize,
    removed: usize,
    skipped: usize,
    outstanding: usize,
    notifications: Vec<Notification>,
}

/// Merge pending updates immediately, ignoring the sync threshold
pub fn run_sync(global: &GlobalArgs, as_json: bool) -> Result<(), CliError> {
    let now_ms = unix_millis_now();
    let mut app = open_app(global, now_ms)?;
    let outcome = app.force_sync(now_ms)?;
    let merge = outcome.merge.unwrap_or_default();
    let summary = SyncSummary {
        added: merge.added.len(),
        removed: merge.removed.len(),
        skipped: merge.skipped,
        outstanding: app.badge_count(),
        notifications: outcome.notifications,
    };

    if as_json {
        return print_json(&summary);
    }

    println!(
        "Synced: {} added, {} removed, {} outstanding",
        summary.added, summary.removed, summary.outstanding
    );
    print_lines(format_notification_lines(&summary.notifications));
    Ok(())
}
