//! Shared types, error model, configuration, and the content store trait.
//!
//! This crate is the foundation depended on by all other SiteCMS crates.
//! It provides:
//! - [`SiteCmsError`], the unified error type
//! - Domain types ([`ContentRecord`], [`FieldValue`])
//! - The [`ContentStore`] capability
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod store;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EditorConfig, StoreConfig, config_dir, config_file_path, expand_home, init_config,
    load_config, load_config_from, resolve_database_path,
};
pub use error::{Result, SiteCmsError};
pub use store::ContentStore;
pub use types::{ContentRecord, FieldValue};
