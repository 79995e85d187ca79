use std::time::Duration;

use liquex_core::simulation::{EventSource, RandomSource};
use liquex_core::util::unix_millis_now;
use tokio::time::{Instant, MissedTickBehavior};

use crate::cli::GlobalArgs;
use crate::commands::common::{format_notification_lines, open_app, print_lines, App};
use crate::error::CliError;

/// Drive sync and the simulated neighbourhood until Ctrl-C or `duration_secs`.
///
/// Ticks are fed wall-clock time; the driver's own agenda decides what fires.
pub async fn run_simulation(
    global: &GlobalArgs,
    duration_secs: Option<u64>,
    tick_ms: u64,
    seed: Option<u64>,
) -> Result<(), CliError> {
    if tick_ms == 0 {
        return Err(CliError::InvalidTickInterval);
    }

    let now_ms = unix_millis_now();
    let mut app = open_app(global, now_ms)?;
    let source: Box<dyn EventSource + Send> = match seed {
        Some(seed) => Box::new(RandomSource::seeded(seed)),
        None => Box::new(RandomSource::from_entropy()),
    };
    app.start_simulation(source, now_ms)?;
    println!(
        "Simulating around {} ({} outstanding requests), Ctrl-C to stop",
        global.user,
        app.badge_count()
    );

    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = duration_secs.map(|secs| Instant::now() + Duration::from_secs(secs));
    let stop = wait_until(deadline);
    tokio::pin!(stop);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => tick_once(&mut app)?,
            result = &mut ctrl_c => {
                result?;
                break;
            }
            () = &mut stop => break,
        }
    }

    app.logout();
    println!("Simulation stopped");
    Ok(())
}

fn tick_once(app: &mut App) -> Result<(), CliError> {
    let report = app.tick(unix_millis_now())?;
    for action in &report.fired {
        tracing::debug!(?action, "Fired");
    }
    print_lines(format_notification_lines(&report.notifications));
    if report.requests_changed {
        println!("{} outstanding requests", app.badge_count());
    }
    Ok(())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
