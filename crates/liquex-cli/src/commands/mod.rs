pub mod accept;
pub mod analytics;
pub mod common;
pub mod completions;
pub mod history;
pub mod meetups;
pub mod nearby;
pub mod raise;
pub mod rate;
pub mod remove;
pub mod requests;
pub mod run;
pub mod sync;
pub mod transfer;
pub mod transfers;
