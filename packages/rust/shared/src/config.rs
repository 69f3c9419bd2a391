//! Application configuration for SiteCMS.
//!
//! User config lives at `~/.sitecms/sitecms.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiteCmsError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sitecms.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sitecms";

// ---------------------------------------------------------------------------
// Config structs (matching sitecms.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Content store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Admin editor behaviour.
    #[serde(default)]
    pub editor: EditorConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the local content database. `~` expands to the home directory.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "~/.sitecms/content.db".into()
}

/// `[editor]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// How long the "Saved!" state stays visible before reverting to ready.
    #[serde(default = "default_success_display_ms")]
    pub success_display_ms: u64,

    /// Section opened when the admin dashboard starts.
    #[serde(default = "default_section")]
    pub default_section: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            success_display_ms: default_success_display_ms(),
            default_section: default_section(),
        }
    }
}

impl EditorConfig {
    /// The success display window as a [`Duration`].
    pub fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }
}

fn default_success_display_ms() -> u64 {
    3000
}
fn default_section() -> String {
    "hero".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sitecms/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SiteCmsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sitecms/sitecms.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SiteCmsError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SiteCmsError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SiteCmsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SiteCmsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SiteCmsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| SiteCmsError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

/// Resolve the database path: an explicit override wins over the config value.
pub fn resolve_database_path(config: &AppConfig, cli_override: Option<&str>) -> Result<PathBuf> {
    expand_home(cli_override.unwrap_or(&config.store.database_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("database_path"));
        assert!(toml_str.contains("success_display_ms = 3000"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.editor.success_display_ms, 3000);
        assert_eq!(parsed.editor.default_section, "hero");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[store]
database_path = "/tmp/site/content.db"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.store.database_path, "/tmp/site/content.db");
        assert_eq!(config.editor.success_display(), Duration::from_secs(3));
    }

    #[test]
    fn cli_override_beats_config() {
        let config = AppConfig::default();
        let path = resolve_database_path(&config, Some("/var/lib/sitecms.db")).expect("resolve");
        assert_eq!(path, PathBuf::from("/var/lib/sitecms.db"));
    }

    #[test]
    fn home_is_expanded() {
        let path = expand_home("~/.sitecms/content.db").expect("expand");
        assert!(path.ends_with(".sitecms/content.db"));
        assert!(!path.to_string_lossy().starts_with('~'));
    }
}
