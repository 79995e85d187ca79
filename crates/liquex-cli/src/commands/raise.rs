use liquex_core::models::{RequestKind, Urgency};
use liquex_core::util::unix_millis_now;
use liquex_core::RequestDraft;

use crate::cli::GlobalArgs;
use crate::commands::common::open_app;
use crate::error::CliError;

pub struct RaiseArgs {
    pub amount: f64,
    pub kind: RequestKind,
    pub urgency: Urgency,
    pub category: String,
    pub description: Option<String>,
}

impl From<RaiseArgs> for RequestDraft {
    fn from(args: RaiseArgs) -> Self {
        Self {
            amount: args.amount,
            kind: Some(args.kind),
            urgency: Some(args.urgency),
            category: Some(args.category),
            description: args.description,
        }
    }
}

pub fn run_raise(global: &GlobalArgs, args: RaiseArgs) -> Result<(), CliError> {
    let now_ms = unix_millis_now();
    let mut app = open_app(global, now_ms)?;
    let request = app.raise_request(args.into(), now_ms)?;

    println!("{}", request.id);
    Ok(())
}
