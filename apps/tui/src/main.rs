//! SiteCMS TUI: interactive editor for the marketing site's sections.
//!
//! Provides an editor tab with a schema-driven form per section and an
//! overview of saved sections, built with `ratatui` + `crossterm`.

mod app;
mod screens;
mod widgets;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use color_eyre::eyre::Result;
use sitecms_shared::{config_dir, load_config, resolve_database_path};
use sitecms_storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing(&config_dir()?)?;

    let config = load_config()?;
    let db_override = std::env::var("SITECMS_DB").ok();
    let db_path = resolve_database_path(&config, db_override.as_deref())?;
    let storage = Arc::new(Storage::open(&db_path).await?);
    tracing::info!(path = %db_path.display(), "tui started");

    app::run(config, storage)
}

/// Log to a file; the terminal belongs to the UI.
fn init_tracing(dir: &Path) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    std::fs::create_dir_all(dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("sitecms-tui.log"))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sitecms=info"));

    fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
