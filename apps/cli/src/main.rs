//! contactsync CLI: vendor contact sync and campaign dispatch for Brevo.
//!
//! Upserts a CSV export of tender winners into Brevo, links them to a fresh
//! list and sends the configured campaign, either once or on a daily schedule.

mod commands;
mod schedule;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
