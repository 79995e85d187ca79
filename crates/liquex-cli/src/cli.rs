use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use liquex_core::models::{RequestKind, Urgency};
use liquex_core::RequestId;

#[derive(Parser)]
#[command(name = "liquex")]
#[command(about = "Request and send money to people nearby")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Optional path to local database file
    #[arg(long, value_name = "PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Optional path to a JSON config file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Username to act as
    #[arg(long, default_value = "demo", global = true)]
    pub user: String,

    /// Current latitude; the configured fallback is used when omitted
    #[arg(long, requires = "lng", allow_negative_numbers = true, global = true)]
    pub lat: Option<f64>,

    /// Current longitude
    #[arg(long, requires = "lat", allow_negative_numbers = true, global = true)]
    pub lng: Option<f64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List users within the proximity radius
    Nearby {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List outstanding requests from other users, nearest first
    #[command(alias = "ls")]
    Requests {
        /// Number of requests to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Raise a new request at the current location
    Raise {
        /// Amount asked for
        amount: f64,
        /// money, service or goods
        #[arg(long)]
        kind: RequestKind,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        urgency: Urgency,
        /// Free-form category, e.g. food or transport
        #[arg(long)]
        category: String,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },
    /// Withdraw one of your requests
    Remove {
        /// Request ID
        id: RequestId,
    },
    /// Send money to a nearby user
    Transfer {
        /// Recipient username
        recipient: String,
        /// Amount to send
        amount: f64,
        /// Why the money is sent
        #[arg(long)]
        reason: Option<String>,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },
    /// Accept another user's request
    Accept {
        /// Request ID
        id: RequestId,
    },
    /// Merge updates from other devices now
    Sync {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the neighbourhood simulation until Ctrl-C
    Run {
        /// Stop after this many seconds
        #[arg(long, value_name = "SECONDS")]
        duration: Option<u64>,
        /// Milliseconds between ticks
        #[arg(long, default_value = "1000")]
        tick_ms: u64,
        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show transaction history, newest first
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize outstanding requests by kind and urgency
    Analytics {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Suggest safe meet-up spots, nearest first
    Meetups {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List proximity transfers
    Transfers {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rate another user from 1 to 5
    Rate {
        /// Username to rate
        username: String,
        /// Rating, 1-5
        rating: u8,
        /// Optional comment
        #[arg(long)]
        comment: Option<String>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output file path (prints to stdout when omitted)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
