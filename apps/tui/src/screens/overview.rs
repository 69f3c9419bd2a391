//! "Overview" screen: saved sections with timestamps and a live preview.

use std::sync::Arc;

use chrono::Local;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState, Wrap};
use sitecms_core::published::{load_published, render_preview};
use sitecms_core::section_name;
use sitecms_shared::Result;
use sitecms_storage::{Storage, StoredSection};
use tokio::sync::oneshot;
use tracing::warn;

/// One saved section with its rendered preview.
struct Entry {
    stored: StoredSection,
    preview: String,
}

pub(crate) struct OverviewScreen {
    storage: Arc<Storage>,
    entries: Vec<Entry>,
    selected: usize,
    pending: Option<oneshot::Receiver<Result<Vec<Entry>>>>,
    status: String,
}

impl OverviewScreen {
    pub(crate) fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            entries: Vec::new(),
            selected: 0,
            pending: None,
            status: "Press 'r' to refresh.".to_string(),
        }
    }

    /// Start listing saved sections in the background.
    pub(crate) fn refresh(&mut self) {
        if self.pending.is_some() {
            return;
        }
        let (tx, rx) = oneshot::channel();
        let storage = self.storage.clone();
        tokio::spawn(async move {
            let _ = tx.send(collect_entries(&storage).await);
        });
        self.pending = Some(rx);
        self.status = "Reading saved sections...".to_string();
    }

    /// Take the refresh result once it has arrived.
    pub(crate) fn poll(&mut self) {
        let Some(rx) = self.pending.as_mut() else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.pending = None;
                self.status = "Refresh was interrupted.".to_string();
                return;
            }
        };
        self.pending = None;

        match result {
            Ok(entries) => {
                self.status = format!("{} saved section(s).", entries.len());
                self.entries = entries;
                self.selected = self.selected.min(self.entries.len().saturating_sub(1));
            }
            Err(e) => {
                warn!(error = %e, "listing saved sections failed");
                self.status = format!("Failed to list sections: {e}");
            }
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Min(1),    // Table + preview
                Constraint::Length(1), // Status
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[0]);

        if self.entries.is_empty() {
            let empty = Paragraph::new(
                "No sections saved yet.\n\nOpen one in the 'Editor' tab and press Ctrl-S.",
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Saved Sections "));
            f.render_widget(empty, chunks[0]);
        } else {
            let rows: Vec<Row> = self
                .entries
                .iter()
                .map(|entry| {
                    let when = entry
                        .stored
                        .updated_at
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string();
                    Row::new(vec![
                        section_name(&entry.stored.section).to_string(),
                        entry.stored.section.clone(),
                        when,
                    ])
                })
                .collect();

            let table = Table::new(
                rows,
                [
                    Constraint::Percentage(40),
                    Constraint::Percentage(20),
                    Constraint::Percentage(40),
                ],
            )
            .header(
                Row::new(vec!["Section", "Id", "Last saved"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .row_highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Saved Sections ({}) ", self.entries.len())),
            );
            let mut state = TableState::default().with_selected(Some(self.selected));
            f.render_stateful_widget(table, columns[0], &mut state);

            let preview = self
                .entries
                .get(self.selected)
                .map(|e| e.preview.as_str())
                .unwrap_or("");
            let preview = Paragraph::new(preview)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(" Preview "));
            f.render_widget(preview, columns[1]);
        }

        let status = Paragraph::new(self.status.as_str())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(status, chunks[1]);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) {
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.entries.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }
    }
}

async fn collect_entries(storage: &Storage) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for stored in storage.list_sections().await? {
        let record = load_published(storage, &stored.section).await;
        entries.push(Entry {
            preview: render_preview(&stored.section, &record),
            stored,
        });
    }
    Ok(entries)
}
