//! SiteCMS CLI: inspect and edit the marketing site's content sections.
//!
//! Every edit goes through the same editor session the TUI uses, so the
//! store only ever receives whole-record saves.

mod commands;

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
