//! "Editor" screen: section sidebar plus the schema-driven form.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use sitecms_core::{
    CollapseState, Control, Edit, EditAction, Editor, EditorEvent, EditorStatus, FieldPath, SECTIONS, Widget,
    render, section_name, spawn_load, spawn_save,
};
use sitecms_shared::ContentStore;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::widgets::status_style;

/// Which pane takes navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Sidebar,
    Form,
}

/// Text being typed into one control.
struct TextInput {
    path: FieldPath,
    buffer: String,
    multiline: bool,
}

pub(crate) struct EditorScreen {
    editor: Editor,
    store: Arc<dyn ContentStore>,
    events_tx: UnboundedSender<EditorEvent>,
    events_rx: UnboundedReceiver<EditorEvent>,
    collapse: CollapseState,
    /// Highlighted row in the sidebar.
    sidebar: usize,
    /// Highlighted control in the form.
    cursor: usize,
    focus: Focus,
    input: Option<TextInput>,
    notice: String,
    /// Section whose unsaved edits were dropped by the last switch.
    discarded: Option<String>,
}

impl EditorScreen {
    pub(crate) fn new(
        store: Arc<dyn ContentStore>,
        success_display: Duration,
        default_section: &str,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let sidebar = SECTIONS
            .iter()
            .position(|s| *s == default_section)
            .unwrap_or(0);

        let mut screen = Self {
            editor: Editor::new(success_display),
            store,
            events_tx,
            events_rx,
            collapse: CollapseState::new(),
            sidebar,
            cursor: 0,
            focus: Focus::Sidebar,
            input: None,
            notice: "Enter opens a section · Esc returns to the list".to_string(),
            discarded: None,
        };
        screen.open_section(sidebar);
        screen
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.input.is_some()
    }

    /// Drain finished loads and saves, then expire the success flash.
    pub(crate) fn poll(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            if self.editor.handle(event, Instant::now()) {
                self.after_event();
            }
        }
        self.editor.tick(Instant::now());
    }

    fn after_event(&mut self) {
        let Some(session) = self.editor.session() else {
            return;
        };
        let notice = match session.status() {
            EditorStatus::Ready => format!("Loaded {}.", section_name(session.section())),
            EditorStatus::SaveSucceeded { .. } => {
                format!("{} saved.", section_name(session.section()))
            }
            EditorStatus::Failed(err) => err.to_string(),
            _ => return,
        };
        self.notice = match self.discarded.take() {
            Some(name) => format!("Discarded unsaved changes to {name}. {notice}"),
            None => notice,
        };
        let len = self.controls().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    fn open_section(&mut self, index: usize) {
        let Some(section) = SECTIONS.get(index) else {
            return;
        };
        self.note_discard();
        self.input = None;
        self.collapse.clear();
        self.cursor = 0;

        let ticket = self.editor.select(section);
        debug!(section, "loading section");
        spawn_load(self.store.clone(), ticket, self.events_tx.clone());
    }

    fn reload(&mut self) {
        self.note_discard();
        self.input = None;
        self.collapse.clear();
        if let Some(ticket) = self.editor.reload() {
            spawn_load(self.store.clone(), ticket, self.events_tx.clone());
        }
    }

    /// Remember a dirty session about to be replaced, for the next notice.
    fn note_discard(&mut self) {
        self.discarded = self
            .editor
            .session()
            .filter(|current| current.is_dirty())
            .map(|current| section_name(current.section()).to_string());
        if let Some(name) = &self.discarded {
            self.notice = format!("Discarded unsaved changes to {name}.");
        }
    }

    fn save(&mut self) {
        self.input = None;
        match self.editor.begin_save() {
            Ok(ticket) => {
                spawn_save(self.store.clone(), ticket, self.events_tx.clone());
            }
            Err(err) => self.notice = err.to_string(),
        }
    }

    fn apply(&mut self, edit: Option<Edit>) {
        let Some(edit) = edit else {
            return;
        };
        match self.editor.apply(&edit) {
            Ok(()) => {
                if let EditAction::Remove(index) = edit.action {
                    self.collapse.removed(&edit.path, index);
                }
            }
            Err(err) => self.notice = err.to_string(),
        }
        let len = self.controls().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn controls(&self) -> Vec<Control> {
        match self.editor.session() {
            Some(session) => render(session.schema(), session.working_copy(), &self.collapse),
            None => Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    pub(crate) fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if code == KeyCode::Char('s') && modifiers.contains(KeyModifiers::CONTROL) {
            self.save();
            return;
        }

        if self.input.is_some() {
            self.handle_input_key(code);
            return;
        }

        match self.focus {
            Focus::Sidebar => self.handle_sidebar_key(code),
            Focus::Form => self.handle_form_key(code),
        }
    }

    fn handle_input_key(&mut self, code: KeyCode) {
        let Some(input) = self.input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.input = None;
                return;
            }
            KeyCode::Enter if !input.multiline => {
                self.input = None;
                return;
            }
            KeyCode::Enter => input.buffer.push('\n'),
            KeyCode::Backspace => {
                input.buffer.pop();
            }
            KeyCode::Char(c) => input.buffer.push(c),
            _ => return,
        }
        let edit = Edit::set_text(input.path.clone(), input.buffer.clone());
        self.apply(Some(edit));
    }

    fn handle_sidebar_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.sidebar = self.sidebar.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.sidebar + 1 < SECTIONS.len() {
                    self.sidebar += 1;
                }
            }
            KeyCode::Enter | KeyCode::Right => {
                let already_open = self
                    .editor
                    .session()
                    .is_some_and(|s| s.section() == SECTIONS[self.sidebar]);
                if !already_open {
                    self.open_section(self.sidebar);
                }
                self.focus = Focus::Form;
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        let controls = self.controls();
        let current = controls.get(self.cursor);

        match code {
            KeyCode::Esc => self.focus = Focus::Sidebar,
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < controls.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Enter => {
                let Some(control) = current else {
                    return;
                };
                match &control.widget {
                    Widget::Text { value, multiline } => {
                        self.input = Some(TextInput {
                            path: control.path.clone(),
                            buffer: value.clone(),
                            multiline: *multiline,
                        });
                    }
                    Widget::ListEntry { value, .. } => {
                        self.input = Some(TextInput {
                            path: control.path.clone(),
                            buffer: value.clone(),
                            multiline: false,
                        });
                    }
                    Widget::Select { .. } => self.apply(control.cycle_select(true)),
                    Widget::Group { .. } => self.collapse.toggle(&control.path),
                    Widget::Append { .. } => self.apply(control.append()),
                    Widget::ListHeader { .. } => {}
                }
            }
            KeyCode::Char(' ') => {
                if let Some(control) = current {
                    if matches!(control.widget, Widget::Group { .. }) {
                        self.collapse.toggle(&control.path);
                    }
                }
            }
            KeyCode::Left => self.apply(current.and_then(|c| c.cycle_select(false))),
            KeyCode::Right => self.apply(current.and_then(|c| c.cycle_select(true))),
            KeyCode::Char('a') => {
                let edit = current.and_then(|c| match c.widget {
                    Widget::ListHeader { .. } => Some(Edit::append(c.path.clone())),
                    _ => c.append(),
                });
                self.apply(edit);
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                self.apply(current.and_then(Control::remove));
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(22), // Sections
                Constraint::Min(1),     // Form
            ])
            .split(area);

        self.draw_sidebar(f, columns[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(1),    // Controls
                Constraint::Length(3), // Notice
            ])
            .split(columns[1]);

        self.draw_header(f, rows[0]);
        self.draw_form(f, rows[1]);

        let hint = if self.input.is_some() {
            "Type to edit · Enter/Esc to finish · Ctrl-S to save"
        } else {
            "Enter edit/toggle · ←/→ choose · a add · d remove · r reload · Ctrl-S save"
        };
        let notice = Paragraph::new(self.notice.as_str())
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(format!(" {hint} ")));
        f.render_widget(notice, rows[2]);
    }

    fn draw_sidebar(&self, f: &mut Frame, area: Rect) {
        let open = self.editor.session().map(|s| s.section());
        let items: Vec<ListItem> = SECTIONS
            .iter()
            .enumerate()
            .map(|(i, section)| {
                let style = if i == self.sidebar && self.focus == Focus::Sidebar {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else if open == Some(*section) {
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let prefix = if i == self.sidebar { "▸ " } else { "  " };
                ListItem::new(format!("{prefix}{}", section_name(section))).style(style)
            })
            .collect();

        let border = if self.focus == Focus::Sidebar {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Sections ")
                .border_style(border),
        );
        f.render_widget(list, area);
    }

    fn draw_header(&self, f: &mut Frame, area: Rect) {
        let line = match self.editor.session() {
            Some(session) => {
                let mut spans = vec![
                    Span::styled(
                        section_name(session.section()).to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        format!("[{}]", session.status().label()),
                        status_style(session.status()),
                    ),
                ];
                if session.is_dirty() {
                    spans.push(Span::styled(
                        "  ● unsaved",
                        Style::default().fg(Color::Yellow),
                    ));
                }
                Line::from(spans)
            }
            None => Line::from("No section selected"),
        };
        let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        f.render_widget(header, area);
    }

    fn draw_form(&self, f: &mut Frame, area: Rect) {
        let border = if self.focus == Focus::Form {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Content ")
            .border_style(border);

        let controls = self.controls();
        if controls.is_empty() {
            let empty = Paragraph::new(match self.editor.session().map(|s| s.status()) {
                Some(EditorStatus::Loading) => "Loading content...",
                _ => "This section has no editable fields.",
            })
            .alignment(Alignment::Center)
            .block(block);
            f.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = controls
            .iter()
            .map(|control| {
                let typing = self
                    .input
                    .as_ref()
                    .filter(|input| input.path == control.path)
                    .map(|input| input.buffer.as_str());
                ListItem::new(control_line(control, typing))
            })
            .collect();

        let mut state = ListState::default();
        if self.focus == Focus::Form {
            state.select(Some(self.cursor));
        }
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::Cyan));
        f.render_stateful_widget(list, area, &mut state);
    }
}

/// One display line for a control, showing `typing` in place of its value.
fn control_line(control: &Control, typing: Option<&str>) -> String {
    let pad = "  ".repeat(control.depth);
    match &control.widget {
        Widget::Text { value, multiline } => {
            let shown = typing.unwrap_or(value);
            let cursor = if typing.is_some() { "▏" } else { "" };
            if *multiline {
                // Only the line being typed fits; earlier lines are counted.
                let last = shown.lines().last().unwrap_or("");
                let more = shown.lines().count().saturating_sub(1);
                if more > 0 {
                    format!("{pad}{}: (+{more} lines) {last}{cursor}", control.label)
                } else {
                    format!("{pad}{}: {last}{cursor}", control.label)
                }
            } else {
                format!("{pad}{}: {shown}{cursor}", control.label)
            }
        }
        Widget::Select { options, selected } => {
            let shown = selected
                .and_then(|i| options.get(i))
                .copied()
                .unwrap_or("(none)");
            format!("{pad}{}: < {shown} >", control.label)
        }
        Widget::ListHeader { len, max_items } => match max_items {
            Some(max) => format!("{pad}{} ({len}/{max})", control.label),
            None => format!("{pad}{} ({len})", control.label),
        },
        Widget::ListEntry { value, .. } => {
            let shown = typing.unwrap_or(value);
            let cursor = if typing.is_some() { "▏" } else { "" };
            format!("{pad}• {shown}{cursor}")
        }
        Widget::Group {
            index,
            collapsed,
            summary,
        } => {
            let marker = if *collapsed { "▸" } else { "▾" };
            format!("{pad}{marker} {} #{}: {summary}", control.label, index + 1)
        }
        Widget::Append { enabled } => {
            if *enabled {
                format!("{pad}+ Add {}", control.label)
            } else {
                format!("{pad}  {} is full", control.label)
            }
        }
    }
}
