//! Liquex CLI - request and send money to people nearby
//!
//! Every invocation logs in, does one thing against the local registry and
//! exits; `liquex run` keeps the simulated neighbourhood going.

mod cli;
mod commands;
mod error;
#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::accept::run_accept;
use crate::commands::analytics::run_analytics;
use crate::commands::completions::run_completions;
use crate::commands::history::run_history;
use crate::commands::meetups::run_meetups;
use crate::commands::nearby::run_nearby;
use crate::commands::raise::{run_raise, RaiseArgs};
use crate::commands::rate::run_rate;
use crate::commands::remove::run_remove;
use crate::commands::requests::run_requests;
use crate::commands::run::run_simulation;
use crate::commands::sync::run_sync;
use crate::commands::transfer::run_transfer;
use crate::commands::transfers::run_transfers;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("liquex=info".parse().unwrap())
                .add_directive("liquex_core=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let global = &cli.global;

    match cli.command {
        Some(Commands::Nearby { json }) => run_nearby(global, json)?,
        Some(Commands::Requests { limit, json }) => run_requests(global, limit, json)?,
        Some(Commands::Raise {
            amount,
            kind,
            urgency,
            category,
            description,
        }) => run_raise(
            global,
            RaiseArgs {
                amount,
                kind,
                urgency,
                category,
                description,
            },
        )?,
        Some(Commands::Remove { id }) => run_remove(global, id)?,
        Some(Commands::Transfer {
            recipient,
            amount,
            reason,
            description,
        }) => run_transfer(global, recipient, amount, reason, description)?,
        Some(Commands::Accept { id }) => run_accept(global, id)?,
        Some(Commands::Sync { json }) => run_sync(global, json)?,
        Some(Commands::Run {
            duration,
            tick_ms,
            seed,
        }) => run_simulation(global, duration, tick_ms, seed).await?,
        Some(Commands::History { limit, json }) => run_history(global, limit, json)?,
        Some(Commands::Analytics { json }) => run_analytics(global, json)?,
        Some(Commands::Meetups { json }) => run_meetups(global, json)?,
        Some(Commands::Transfers { json }) => run_transfers(global, json)?,
        Some(Commands::Rate {
            username,
            rating,
            comment,
        }) => run_rate(global, &username, rating, comment)?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None => {
            Cli::command().print_help().map_err(CliError::Io)?;
            println!();
        }
    }

    Ok(())
}
