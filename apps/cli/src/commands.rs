//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use sitecms_core::{
    CollapseState, Edit, Editor, EditorStatus, FieldPath, SECTIONS, Widget, render, run_load,
    run_save, schema_for, section_name,
};
use sitecms_core::published::{load_published, render_preview};
use sitecms_shared::{
    AppConfig, ContentRecord, ContentStore, init_config, load_config, resolve_database_path,
};
use sitecms_storage::Storage;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SiteCMS: edit the marketing site's section content from the terminal.
#[derive(Parser)]
#[command(
    name = "sitecms",
    version,
    about = "Edit and inspect the content sections of the agency website.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Content database path (overrides the config file).
    #[arg(long, env = "SITECMS_DB", global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// List editable sections.
    Sections,

    /// Print the field schema of a section as JSON.
    Schema {
        /// Section identifier (e.g. hero, services).
        section: String,
    },

    /// Show the stored record of a section.
    Show {
        section: String,
    },

    /// Set one text or select field, then save the section.
    Set {
        section: String,
        /// Field path, e.g. `title` or `services[0].features[1]`.
        path: String,
        /// New value. For select fields, one of the listed options (empty clears).
        value: String,
    },

    /// Append an empty entry to a list field, then save.
    Append {
        section: String,
        /// Path of the list field, e.g. `services` or `services[0].features`.
        path: String,
    },

    /// Remove the entry at `index` from a list field, then save.
    Remove {
        section: String,
        path: String,
        index: usize,
    },

    /// Replace a section's record with the JSON object in `file`.
    Import {
        section: String,
        file: PathBuf,
    },

    /// Delete a section's stored record. The site then shows it empty.
    Delete {
        section: String,
    },

    /// Print a section's record as JSON.
    Export {
        section: String,
    },

    /// Print a plain-text preview of a section as the site shows it.
    Preview {
        section: String,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "sitecms=info",
        1 => "sitecms=debug",
        _ => "sitecms=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let db = cli.db.as_deref();
    match cli.command {
        Command::Sections => cmd_sections(),
        Command::Schema { section } => cmd_schema(&section),
        Command::Show { section } => cmd_show(db, &section).await,
        Command::Set {
            section,
            path,
            value,
        } => cmd_set(db, &section, &path, &value).await,
        Command::Append { section, path } => {
            let edit = Edit::append(path.parse()?);
            cmd_edit(db, &section, edit).await
        }
        Command::Remove {
            section,
            path,
            index,
        } => {
            let edit = Edit::remove(path.parse()?, index);
            cmd_edit(db, &section, edit).await
        }
        Command::Import { section, file } => cmd_import(db, &section, &file).await,
        Command::Delete { section } => cmd_delete(db, &section).await,
        Command::Export { section } => cmd_export(db, &section).await,
        Command::Preview { section } => cmd_preview(db, &section).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Store access
// ---------------------------------------------------------------------------

fn database_path(db: Option<&str>) -> Result<(AppConfig, PathBuf)> {
    let config = load_config()?;
    let path = resolve_database_path(&config, db)?;
    Ok((config, path))
}

async fn open_store(db: Option<&str>) -> Result<(AppConfig, Arc<dyn ContentStore>)> {
    let (config, path) = database_path(db)?;
    debug!(path = %path.display(), "opening content store");
    let store: Arc<dyn ContentStore> = Arc::new(Storage::open(&path).await?);
    Ok((config, store))
}

async fn open_store_readonly(db: Option<&str>) -> Result<Arc<dyn ContentStore>> {
    let (_, path) = database_path(db)?;
    if !path.exists() {
        return Err(eyre!(
            "no content database at '{}'. Save a section first or pass --db.",
            path.display()
        ));
    }
    Ok(Arc::new(Storage::open_readonly(&path).await?))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_sections() -> Result<()> {
    for section in SECTIONS {
        println!(
            "  {section:<10} {:<16} {} fields",
            section_name(section),
            schema_for(section).len()
        );
    }
    Ok(())
}

fn cmd_schema(section: &str) -> Result<()> {
    let schema = schema_for(section);
    if schema.is_empty() {
        return Err(eyre!("unknown section '{section}'"));
    }
    println!("{}", serde_json::to_string_pretty(schema)?);
    Ok(())
}

async fn cmd_show(db: Option<&str>, section: &str) -> Result<()> {
    let store = open_store_readonly(db).await?;
    match store.get(section).await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("Section '{section}' has not been saved yet."),
    }
    Ok(())
}

async fn cmd_set(db: Option<&str>, section: &str, path: &str, value: &str) -> Result<()> {
    let path: FieldPath = path.parse()?;
    let (config, store) = open_store(db).await?;

    // Selects take an option index; everything else takes the raw text.
    let record = store.get(section).await?.unwrap_or_default();
    let edit = match select_options(section, &record, &path) {
        Some(_) if value.is_empty() => Edit::select(path, None),
        Some(options) => {
            let index = options.iter().position(|o| *o == value).ok_or_else(|| {
                eyre!("'{value}' is not an option; choose one of: {}", options.join(", "))
            })?;
            Edit::select(path, Some(index))
        }
        None => Edit::set_text(path, value),
    };

    edit_and_save(&config, store, section, edit).await
}

async fn cmd_edit(db: Option<&str>, section: &str, edit: Edit) -> Result<()> {
    let (config, store) = open_store(db).await?;
    edit_and_save(&config, store, section, edit).await
}

/// Options of the select control at `path`, if that control is a select.
fn select_options(
    section: &str,
    record: &ContentRecord,
    path: &FieldPath,
) -> Option<&'static [&'static str]> {
    render(schema_for(section), record, &CollapseState::new())
        .into_iter()
        .find(|c| &c.path == path)
        .and_then(|c| match c.widget {
            Widget::Select { options, .. } => Some(options),
            _ => None,
        })
}

/// Drive one editor session: load, apply `edit`, save.
async fn edit_and_save(
    config: &AppConfig,
    store: Arc<dyn ContentStore>,
    section: &str,
    edit: Edit,
) -> Result<()> {
    let mut editor = Editor::new(config.editor.success_display());
    let spinner = CliProgress::new();

    spinner.set(format!("Loading {}", section_name(section)));
    let event = run_load(store.as_ref(), editor.select(section)).await;
    editor.handle(event, Instant::now());
    if let Some(err) = editor.session().and_then(|s| s.error()) {
        spinner.finish();
        return Err(eyre!("{err}"));
    }

    editor.apply(&edit)?;
    info!(section, path = %edit.path, "applied edit");

    spinner.set(format!("Saving {}", section_name(section)));
    let ticket = editor.begin_save()?;
    let event = run_save(store.as_ref(), ticket).await;
    editor.handle(event, Instant::now());
    spinner.finish();

    let session = editor
        .session()
        .ok_or_else(|| eyre!("editor session vanished"))?;
    match session.status() {
        EditorStatus::SaveSucceeded { .. } => {
            println!("  {} saved.", section_name(section));
            Ok(())
        }
        EditorStatus::Failed(err) => Err(eyre!("{err}")),
        other => Err(eyre!("unexpected editor state: {other:?}")),
    }
}

async fn cmd_import(db: Option<&str>, section: &str, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;
    let record: ContentRecord = serde_json::from_str(&content)
        .map_err(|e| eyre!("'{}' is not a content record: {e}", file.display()))?;

    let schema = schema_for(section);
    if schema.is_empty() {
        warn!(section, "importing into a section with no editor schema");
    }
    for (key, _) in record.iter() {
        if !schema.iter().any(|f| f.name == key) {
            debug!(section, field = %key, "imported field is not in the schema");
        }
    }

    let (_, store) = open_store(db).await?;
    let spinner = CliProgress::new();
    spinner.set(format!("Importing {}", section_name(section)));
    let result = store.put(section, &record).await;
    spinner.finish();
    result?;

    info!(section, fields = record.len(), "section imported");
    println!("  Imported {} field(s) into {section}.", record.len());
    Ok(())
}

async fn cmd_delete(db: Option<&str>, section: &str) -> Result<()> {
    let (_, path) = database_path(db)?;
    let storage = Storage::open(&path).await?;
    if storage.delete_section(section).await? {
        info!(section, "section deleted");
        println!("  Deleted {section}.");
    } else {
        println!("  Section '{section}' has no stored record.");
    }
    Ok(())
}

async fn cmd_export(db: Option<&str>, section: &str) -> Result<()> {
    let store = open_store_readonly(db).await?;
    let record = store.get(section).await?.unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn cmd_preview(db: Option<&str>, section: &str) -> Result<()> {
    let store = open_store_readonly(db).await?;
    let record = load_published(store.as_ref(), section).await;
    print!("{}", render_preview(section, &record));
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress spinner
// ---------------------------------------------------------------------------

/// Spinner shown while a store call is in flight.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn set(&self, msg: String) {
        self.spinner.set_message(msg);
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_set_command() {
        let cli = Cli::try_parse_from([
            "sitecms",
            "--db",
            "/tmp/site.db",
            "set",
            "services",
            "services[0].title",
            "Branding",
        ])
        .expect("parse");
        assert_eq!(cli.db.as_deref(), Some("/tmp/site.db"));
        match cli.command {
            Command::Set {
                section,
                path,
                value,
            } => {
                assert_eq!(section, "services");
                assert_eq!(path, "services[0].title");
                assert_eq!(value, "Branding");
            }
            _ => panic!("expected set"),
        }
    }

    #[test]
    fn cli_parses_delete_command() {
        let cli = Cli::try_parse_from(["sitecms", "delete", "cta"]).expect("parse");
        assert!(matches!(cli.command, Command::Delete { section } if section == "cta"));
    }

    #[test]
    fn select_options_found_for_nested_select() {
        let record = ContentRecord::new().with(
            "services",
            vec![ContentRecord::new().with("icon", "Code")],
        );
        let path: FieldPath = "services[0].icon".parse().unwrap();
        let options = select_options("services", &record, &path).expect("select");
        assert!(options.contains(&"Rocket"));

        let title: FieldPath = "services[0].title".parse().unwrap();
        assert!(select_options("services", &record, &title).is_none());
    }
}
