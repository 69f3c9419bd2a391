//! Editing core for SiteCMS.
//!
//! This crate holds the section schema registry, the schema-driven form
//! model, the editor session state machine, and the helpers that run editor
//! work against an injected [`sitecms_shared::ContentStore`].

pub mod driver;
pub mod form;
pub mod published;
pub mod schema;
pub mod session;

pub use driver::{EditorEvent, run_load, run_save, spawn_load, spawn_save};
pub use form::{CollapseState, Control, Edit, EditAction, FieldPath, Widget, apply, render};
pub use schema::{FieldDescriptor, FieldKind, SECTIONS, schema_for, section_name};
pub use session::{
    Editor, EditorError, EditorSession, EditorStatus, LoadTicket, SaveTicket, SessionEpoch,
};
