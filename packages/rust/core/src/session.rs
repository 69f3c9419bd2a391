//! Editor session state machine.
//!
//! One [`Editor`] owns at most one [`EditorSession`]. Store calls are not made
//! here: the editor hands out [`LoadTicket`]s and [`SaveTicket`]s, the caller
//! runs them against a store (see [`crate::driver`]), and feeds the outcome
//! back. Every ticket carries the [`SessionEpoch`] it was issued under, and
//! outcomes for an older epoch are dropped. In-flight calls are never
//! cancelled, only ignored.
//!
//! ```text
//! Loading ──ok──▶ Ready ──save──▶ Saving ──ok──▶ SaveSucceeded ──window──▶ Ready
//!    │                ▲              │
//!    └──err──▶ Failed ┴──────◀──err──┘
//! ```

use std::time::{Duration, Instant};

use sitecms_shared::{ContentRecord, Result};
use tracing::{debug, info, warn};

use crate::form::{self, Edit};
use crate::schema::{FieldDescriptor, schema_for};

/// Identity of one session. Increases every time a section is (re)loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionEpoch(u64);

/// Why an attempt failed or was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    /// The section could not be loaded. The working copy stays empty.
    #[error("Failed to load content: {0}")]
    Fetch(String),

    /// The store rejected the write. The working copy is kept for a retry.
    #[error("Failed to save content: {0}")]
    Save(String),

    /// A load or save is already in flight for this session.
    #[error("a load or save is already in progress")]
    Busy,

    /// No section is selected.
    #[error("no section selected")]
    NoSession,

    /// The edit does not fit the section schema.
    #[error("{0}")]
    Invalid(String),
}

/// Where a session is in its load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorStatus {
    Loading,
    Ready,
    Saving,
    /// Shown until the success display window has passed.
    SaveSucceeded { at: Instant },
    /// A load or save failed. Stays until the next save attempt or section change.
    Failed(EditorError),
}

impl EditorStatus {
    /// Short label for status bars and buttons.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "Loading...",
            Self::Ready => "Save Changes",
            Self::Saving => "Saving...",
            Self::SaveSucceeded { .. } => "Saved!",
            Self::Failed(EditorError::Fetch(_)) => "Load failed",
            Self::Failed(_) => "Save failed",
        }
    }
}

/// The working state for one selected section.
#[derive(Debug, Clone)]
pub struct EditorSession {
    epoch: SessionEpoch,
    section: String,
    working: ContentRecord,
    /// Last record known to match the store.
    baseline: ContentRecord,
    /// Snapshot sent by the in-flight save.
    pending: Option<ContentRecord>,
    status: EditorStatus,
}

impl EditorSession {
    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn schema(&self) -> &'static [FieldDescriptor] {
        schema_for(&self.section)
    }

    /// The in-memory, possibly unsaved record.
    pub fn working_copy(&self) -> &ContentRecord {
        &self.working
    }

    pub fn status(&self) -> &EditorStatus {
        &self.status
    }

    /// The error currently shown, if any.
    pub fn error(&self) -> Option<&EditorError> {
        match &self.status {
            EditorStatus::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the working copy differs from what was last loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.working != self.baseline
    }

    /// Whether a save may start now. Saving is blocked while a call is in flight.
    pub fn can_save(&self) -> bool {
        !matches!(self.status, EditorStatus::Loading | EditorStatus::Saving)
    }
}

/// Ticket for loading a section; run it with `ContentStore::get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub epoch: SessionEpoch,
    pub section: String,
}

/// Ticket for saving a section; run it with `ContentStore::put`.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTicket {
    pub epoch: SessionEpoch,
    pub section: String,
    pub record: ContentRecord,
}

/// Coordinates the single active editor session.
#[derive(Debug)]
pub struct Editor {
    last_epoch: u64,
    session: Option<EditorSession>,
    success_display: Duration,
}

impl Editor {
    /// Create an editor whose "saved" state reverts after `success_display`.
    pub fn new(success_display: Duration) -> Self {
        Self {
            last_epoch: 0,
            session: None,
            success_display,
        }
    }

    pub fn session(&self) -> Option<&EditorSession> {
        self.session.as_ref()
    }

    /// Select `section`, discarding the current session and its unsaved edits.
    pub fn select(&mut self, section: &str) -> LoadTicket {
        self.last_epoch += 1;
        let epoch = SessionEpoch(self.last_epoch);

        if let Some(old) = &self.session {
            if old.is_dirty() {
                info!(section = %old.section, "discarding unsaved edits");
            }
        }

        self.session = Some(EditorSession {
            epoch,
            section: section.to_string(),
            working: ContentRecord::new(),
            baseline: ContentRecord::new(),
            pending: None,
            status: EditorStatus::Loading,
        });
        debug!(section, epoch = epoch.0, "session started");

        LoadTicket {
            epoch,
            section: section.to_string(),
        }
    }

    /// Start a fresh load of the current section.
    pub fn reload(&mut self) -> Option<LoadTicket> {
        let section = self.session.as_ref()?.section.clone();
        Some(self.select(&section))
    }

    /// Feed back the outcome of a [`LoadTicket`]. Returns whether it was applied.
    pub fn finish_load(
        &mut self,
        epoch: SessionEpoch,
        result: Result<Option<ContentRecord>>,
    ) -> bool {
        let Some(session) = self.current_mut(epoch) else {
            debug!(epoch = epoch.0, "dropping stale load result");
            return false;
        };
        if session.status != EditorStatus::Loading {
            return false;
        }

        match result {
            Ok(found) => {
                let record = found.unwrap_or_default();
                session.working = record.clone();
                session.baseline = record;
                session.status = EditorStatus::Ready;
            }
            Err(e) => {
                warn!(section = %session.section, error = %e, "failed to load content");
                session.status = EditorStatus::Failed(EditorError::Fetch(e.to_string()));
            }
        }
        true
    }

    /// Begin saving the working copy. Refused while a load or save is in flight.
    pub fn begin_save(&mut self) -> std::result::Result<SaveTicket, EditorError> {
        let session = self.session.as_mut().ok_or(EditorError::NoSession)?;
        if !session.can_save() {
            return Err(EditorError::Busy);
        }

        session.status = EditorStatus::Saving;
        session.pending = Some(session.working.clone());

        Ok(SaveTicket {
            epoch: session.epoch,
            section: session.section.clone(),
            record: session.working.clone(),
        })
    }

    /// Feed back the outcome of a [`SaveTicket`]. Returns whether it was applied.
    pub fn finish_save(&mut self, epoch: SessionEpoch, result: Result<()>, now: Instant) -> bool {
        let Some(session) = self.current_mut(epoch) else {
            debug!(epoch = epoch.0, "dropping stale save result");
            return false;
        };
        if session.status != EditorStatus::Saving {
            return false;
        }

        let sent = session.pending.take();
        match result {
            Ok(()) => {
                if let Some(sent) = sent {
                    session.baseline = sent;
                }
                info!(section = %session.section, "content saved");
                session.status = EditorStatus::SaveSucceeded { at: now };
            }
            Err(e) => {
                warn!(section = %session.section, error = %e, "failed to save content");
                session.status = EditorStatus::Failed(EditorError::Save(e.to_string()));
            }
        }
        true
    }

    /// Revert an expired "saved" state to ready. Returns whether anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let window = self.success_display;
        match self.session.as_mut() {
            Some(session) => match session.status {
                EditorStatus::SaveSucceeded { at } if now.duration_since(at) >= window => {
                    session.status = EditorStatus::Ready;
                    true
                }
                _ => false,
            },
            None => false,
        }
    }

    /// Apply one form edit to the working copy.
    pub fn apply(&mut self, edit: &Edit) -> std::result::Result<(), EditorError> {
        let session = self.session.as_mut().ok_or(EditorError::NoSession)?;
        if session.status == EditorStatus::Loading {
            return Err(EditorError::Busy);
        }
        session.working = form::apply(session.schema(), &session.working, edit)
            .map_err(|e| EditorError::Invalid(e.to_string()))?;
        Ok(())
    }

    fn current_mut(&mut self, epoch: SessionEpoch) -> Option<&mut EditorSession> {
        self.session.as_mut().filter(|s| s.epoch == epoch)
    }
}

#[cfg(test)]
mod tests {
    use sitecms_shared::SiteCmsError;

    use super::*;
    use crate::form::FieldPath;

    const WINDOW: Duration = Duration::from_secs(3);

    fn loaded(section: &str, record: Option<ContentRecord>) -> Editor {
        let mut editor = Editor::new(WINDOW);
        let ticket = editor.select(section);
        assert!(editor.finish_load(ticket.epoch, Ok(record)));
        editor
    }

    fn status(editor: &Editor) -> &EditorStatus {
        editor.session().unwrap().status()
    }

    #[test]
    fn select_starts_loading_with_empty_copy() {
        let mut editor = Editor::new(WINDOW);
        let ticket = editor.select("hero");
        assert_eq!(ticket.section, "hero");
        assert_eq!(status(&editor), &EditorStatus::Loading);
        assert!(editor.session().unwrap().working_copy().is_empty());
        assert!(!editor.session().unwrap().can_save());
    }

    #[test]
    fn absent_record_loads_as_empty() {
        let editor = loaded("about", None);
        assert_eq!(status(&editor), &EditorStatus::Ready);
        assert!(editor.session().unwrap().working_copy().is_empty());
    }

    #[test]
    fn fetch_error_exposes_message_and_allows_editing() {
        let mut editor = Editor::new(WINDOW);
        let ticket = editor.select("hero");
        editor.finish_load(ticket.epoch, Err(SiteCmsError::storage("offline")));

        let session = editor.session().unwrap();
        assert!(matches!(session.error(), Some(EditorError::Fetch(m)) if m.contains("offline")));
        assert!(session.working_copy().is_empty());
        assert!(session.can_save());

        editor
            .apply(&Edit::set_text(FieldPath::field("title"), "Typed anyway"))
            .unwrap();
        assert!(editor.begin_save().is_ok());
    }

    #[test]
    fn hero_edit_save_and_revert_scenario() {
        let mut editor = loaded("hero", Some(ContentRecord::new().with("title", "Old")));
        assert_eq!(editor.session().unwrap().working_copy().text("title"), "Old");

        editor
            .apply(&Edit::set_text(FieldPath::field("title"), "New"))
            .unwrap();
        assert!(editor.session().unwrap().is_dirty());

        let ticket = editor.begin_save().unwrap();
        assert_eq!(ticket.record, ContentRecord::new().with("title", "New"));
        assert_eq!(status(&editor), &EditorStatus::Saving);

        let t0 = Instant::now();
        assert!(editor.finish_save(ticket.epoch, Ok(()), t0));
        assert_eq!(status(&editor), &EditorStatus::SaveSucceeded { at: t0 });
        assert!(!editor.session().unwrap().is_dirty());

        assert!(!editor.tick(t0 + Duration::from_secs(1)));
        assert!(editor.tick(t0 + WINDOW));
        assert_eq!(status(&editor), &EditorStatus::Ready);
    }

    #[test]
    fn second_save_while_saving_is_blocked() {
        let mut editor = loaded("cta", None);
        let _first = editor.begin_save().unwrap();
        assert_eq!(editor.begin_save(), Err(EditorError::Busy));
    }

    #[test]
    fn failed_save_keeps_working_copy_for_retry() {
        let mut editor = loaded("hero", None);
        editor
            .apply(&Edit::set_text(FieldPath::field("subtitle"), "Draft"))
            .unwrap();
        let ticket = editor.begin_save().unwrap();
        editor.finish_save(
            ticket.epoch,
            Err(SiteCmsError::storage("permission denied")),
            Instant::now(),
        );

        let session = editor.session().unwrap();
        assert!(matches!(session.error(), Some(EditorError::Save(_))));
        assert_eq!(session.working_copy().text("subtitle"), "Draft");
        assert!(session.is_dirty());

        let retry = editor.begin_save().unwrap();
        assert_eq!(retry.record.text("subtitle"), "Draft");
        assert!(editor.session().unwrap().error().is_none());
    }

    #[test]
    fn stale_save_does_not_touch_new_session() {
        let mut editor = loaded("hero", None);
        editor
            .apply(&Edit::set_text(FieldPath::field("title"), "Hero draft"))
            .unwrap();
        let pending = editor.begin_save().unwrap();

        let load = editor.select("about");
        editor.finish_load(load.epoch, Ok(Some(ContentRecord::new().with("title", "About"))));

        assert!(!editor.finish_save(pending.epoch, Ok(()), Instant::now()));
        assert!(!editor.finish_save(
            pending.epoch,
            Err(SiteCmsError::storage("late failure")),
            Instant::now()
        ));
        let session = editor.session().unwrap();
        assert_eq!(session.section(), "about");
        assert_eq!(session.working_copy().text("title"), "About");
        assert_eq!(session.status(), &EditorStatus::Ready);
    }

    #[test]
    fn stale_load_is_ignored() {
        let mut editor = Editor::new(WINDOW);
        let first = editor.select("hero");
        let second = editor.select("services");
        assert!(first.epoch < second.epoch);

        assert!(!editor.finish_load(first.epoch, Ok(Some(ContentRecord::new().with("title", "x")))));
        assert_eq!(status(&editor), &EditorStatus::Loading);
        assert!(editor.finish_load(second.epoch, Ok(None)));
    }

    #[test]
    fn edits_rejected_while_loading() {
        let mut editor = Editor::new(WINDOW);
        assert_eq!(
            editor.apply(&Edit::set_text(FieldPath::field("title"), "x")),
            Err(EditorError::NoSession)
        );
        editor.select("hero");
        assert_eq!(
            editor.apply(&Edit::set_text(FieldPath::field("title"), "x")),
            Err(EditorError::Busy)
        );
    }

    #[test]
    fn invalid_edit_reports_schema_mismatch() {
        let mut editor = loaded("hero", None);
        let err = editor
            .apply(&Edit::set_text(FieldPath::field("projects"), "x"))
            .unwrap_err();
        assert!(matches!(err, EditorError::Invalid(m) if m.contains("projects")));
    }

    #[test]
    fn reload_issues_new_epoch_for_same_section() {
        let mut editor = loaded("work", None);
        let before = editor.session().unwrap().epoch();
        let ticket = editor.reload().unwrap();
        assert_eq!(ticket.section, "work");
        assert!(ticket.epoch > before);
        assert_eq!(status(&editor), &EditorStatus::Loading);
    }

    #[test]
    fn status_labels() {
        assert_eq!(EditorStatus::Saving.label(), "Saving...");
        assert_eq!(
            EditorStatus::Failed(EditorError::Fetch("x".into())).label(),
            "Load failed"
        );
        assert_eq!(
            EditorStatus::Failed(EditorError::Save("x".into())).label(),
            "Save failed"
        );
    }
}
