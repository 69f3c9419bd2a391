//! Runs editor tickets against an injected [`ContentStore`].
//!
//! Front-ends spawn loads and saves as tokio tasks and receive the outcomes
//! as [`EditorEvent`]s on a channel, then hand them to [`Editor::handle`].
//! Nothing is cancelled when the section changes; the editor drops outcomes
//! for old epochs.

use std::sync::Arc;
use std::time::Instant;

use sitecms_shared::{ContentRecord, ContentStore, Result};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::session::{Editor, LoadTicket, SaveTicket, SessionEpoch};

/// Outcome of a store call, tagged with the session it was made for.
#[derive(Debug)]
pub enum EditorEvent {
    Loaded {
        epoch: SessionEpoch,
        result: Result<Option<ContentRecord>>,
    },
    Saved {
        epoch: SessionEpoch,
        result: Result<()>,
    },
}

/// Perform the `get` for a load ticket.
#[instrument(skip_all, fields(section = %ticket.section))]
pub async fn run_load(store: &dyn ContentStore, ticket: LoadTicket) -> EditorEvent {
    let result = store.get(&ticket.section).await;
    EditorEvent::Loaded {
        epoch: ticket.epoch,
        result,
    }
}

/// Perform the whole-record `put` for a save ticket.
#[instrument(skip_all, fields(section = %ticket.section))]
pub async fn run_save(store: &dyn ContentStore, ticket: SaveTicket) -> EditorEvent {
    let result = store.put(&ticket.section, &ticket.record).await;
    EditorEvent::Saved {
        epoch: ticket.epoch,
        result,
    }
}

/// Run a load in the background and post its outcome to `events`.
pub fn spawn_load(
    store: Arc<dyn ContentStore>,
    ticket: LoadTicket,
    events: UnboundedSender<EditorEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let event = run_load(store.as_ref(), ticket).await;
        // The receiver is gone only when the front-end is shutting down.
        let _ = events.send(event);
    })
}

/// Run a save in the background and post its outcome to `events`.
pub fn spawn_save(
    store: Arc<dyn ContentStore>,
    ticket: SaveTicket,
    events: UnboundedSender<EditorEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let event = run_save(store.as_ref(), ticket).await;
        let _ = events.send(event);
    })
}

impl Editor {
    /// Apply a store outcome. Returns whether it changed the active session.
    pub fn handle(&mut self, event: EditorEvent, now: Instant) -> bool {
        match event {
            EditorEvent::Loaded { epoch, result } => self.finish_load(epoch, result),
            EditorEvent::Saved { epoch, result } => self.finish_save(epoch, result, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use sitecms_shared::SiteCmsError;
    use sitecms_storage::MemoryStore;
    use tokio::sync::{Mutex, mpsc, oneshot};

    use super::*;
    use crate::form::{CollapseState, Edit, FieldPath, render};
    use crate::session::EditorStatus;

    /// Store whose `put` blocks until the test releases it.
    struct GatedStore {
        inner: MemoryStore,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl ContentStore for GatedStore {
        async fn get(&self, section: &str) -> Result<Option<ContentRecord>> {
            self.inner.get(section).await
        }

        async fn put(&self, section: &str, record: &ContentRecord) -> Result<()> {
            let gate = self.gate.lock().await.take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.inner.put(section, record).await
        }
    }

    /// Store that fails every call.
    struct BrokenStore;

    #[async_trait]
    impl ContentStore for BrokenStore {
        async fn get(&self, _section: &str) -> Result<Option<ContentRecord>> {
            Err(SiteCmsError::storage("connection refused"))
        }

        async fn put(&self, _section: &str, _record: &ContentRecord) -> Result<()> {
            Err(SiteCmsError::storage("connection refused"))
        }
    }

    fn services_record() -> ContentRecord {
        ContentRecord::new()
            .with("title", "What we do")
            .with("description", "Design and build")
            .with(
                "services",
                vec![
                    ContentRecord::new()
                        .with("icon", "Palette")
                        .with("title", "UI Design")
                        .with("features", vec!["Wireframes".to_string()]),
                    ContentRecord::new()
                        .with("icon", "Rocket")
                        .with("title", "Launch")
                        .with("features", Vec::<String>::new()),
                ],
            )
    }

    #[tokio::test]
    async fn zero_edit_roundtrip_persists_identical_record() {
        let store = MemoryStore::with_records([("services", services_record())]);
        let mut editor = Editor::new(Duration::from_secs(3));

        let ticket = editor.select("services");
        let event = run_load(&store, ticket).await;
        assert!(editor.handle(event, Instant::now()));

        let session = editor.session().unwrap();
        let _controls = render(session.schema(), session.working_copy(), &CollapseState::new());

        let save = editor.begin_save().unwrap();
        let event = run_save(&store, save).await;
        assert!(editor.handle(event, Instant::now()));

        assert_eq!(store.get("services").await.unwrap(), Some(services_record()));
    }

    #[tokio::test]
    async fn hero_scenario_through_store() {
        let store = MemoryStore::with_records([("hero", ContentRecord::new().with("title", "Old"))]);
        let mut editor = Editor::new(Duration::from_millis(3000));

        let event = run_load(&store, editor.select("hero")).await;
        editor.handle(event, Instant::now());
        editor
            .apply(&Edit::set_text(FieldPath::field("title"), "New"))
            .unwrap();

        let event = run_save(&store, editor.begin_save().unwrap()).await;
        let saved_at = Instant::now();
        editor.handle(event, saved_at);
        assert!(matches!(
            editor.session().unwrap().status(),
            EditorStatus::SaveSucceeded { .. }
        ));

        editor.tick(saved_at + Duration::from_secs(3));
        assert_eq!(editor.session().unwrap().status(), &EditorStatus::Ready);
        assert_eq!(
            store.get("hero").await.unwrap(),
            Some(ContentRecord::new().with("title", "New"))
        );
    }

    #[tokio::test]
    async fn pending_save_cannot_touch_newly_selected_section() {
        let (release, gate) = oneshot::channel();
        let store: Arc<dyn ContentStore> = Arc::new(GatedStore {
            inner: MemoryStore::with_records([(
                "about",
                ContentRecord::new().with("title", "About us"),
            )]),
            gate: Mutex::new(Some(gate)),
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut editor = Editor::new(Duration::from_secs(3));

        // Load hero, edit, start a save that hangs.
        spawn_load(store.clone(), editor.select("hero"), tx.clone());
        let event = rx.recv().await.unwrap();
        editor.handle(event, Instant::now());
        editor
            .apply(&Edit::set_text(FieldPath::field("title"), "Hero draft"))
            .unwrap();
        let save = spawn_save(store.clone(), editor.begin_save().unwrap(), tx.clone());

        // Switch to about while the save is still pending.
        spawn_load(store.clone(), editor.select("about"), tx.clone());
        let event = rx.recv().await.unwrap();
        assert!(editor.handle(event, Instant::now()));

        release.send(()).unwrap();
        save.await.unwrap();
        let late = rx.recv().await.unwrap();
        assert!(matches!(late, EditorEvent::Saved { .. }));
        assert!(!editor.handle(late, Instant::now()));

        let session = editor.session().unwrap();
        assert_eq!(session.section(), "about");
        assert_eq!(session.working_copy().text("title"), "About us");
        assert_eq!(session.status(), &EditorStatus::Ready);

        // The old save still reached the store.
        assert_eq!(
            store.get("hero").await.unwrap().unwrap().text("title"),
            "Hero draft"
        );
    }

    #[tokio::test]
    async fn broken_store_surfaces_fetch_and_save_errors() {
        let store = BrokenStore;
        let mut editor = Editor::new(Duration::from_secs(3));

        let event = run_load(&store, editor.select("cta")).await;
        editor.handle(event, Instant::now());
        let err = editor.session().unwrap().error().cloned().unwrap();
        assert_eq!(err.to_string(), "Failed to load content: storage error: connection refused");

        let event = run_save(&store, editor.begin_save().unwrap()).await;
        editor.handle(event, Instant::now());
        assert_eq!(
            editor.session().unwrap().status().label(),
            "Save failed"
        );
    }
}
