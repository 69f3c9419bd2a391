//! TUI screen definitions.
//!
//! Each screen corresponds to a tab in the TUI and encapsulates its
//! own state and rendering logic.

mod editor;
mod overview;

use std::fmt;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;

pub(crate) use editor::EditorScreen;
pub(crate) use overview::OverviewScreen;

/// Screen identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScreenId {
    Editor,
    Overview,
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Editor => write!(f, "Editor"),
            Self::Overview => write!(f, "Overview"),
        }
    }
}

/// State of every screen; only the active one draws and takes keys.
pub(crate) struct Screens {
    pub editor: EditorScreen,
    pub overview: OverviewScreen,
}

impl Screens {
    /// Whether the screen has an active text input field.
    pub(crate) fn is_editing(&self, id: ScreenId) -> bool {
        match id {
            ScreenId::Editor => self.editor.is_editing(),
            ScreenId::Overview => false,
        }
    }

    /// Called when `id` becomes the active tab.
    pub(crate) fn activate(&mut self, id: ScreenId) {
        if id == ScreenId::Overview {
            self.overview.refresh();
        }
    }

    /// Pick up finished background work on every screen.
    pub(crate) fn poll(&mut self) {
        self.editor.poll();
        self.overview.poll();
    }

    pub(crate) fn draw(&self, id: ScreenId, f: &mut Frame, area: Rect) {
        match id {
            ScreenId::Editor => self.editor.draw(f, area),
            ScreenId::Overview => self.overview.draw(f, area),
        }
    }

    pub(crate) fn handle_key(&mut self, id: ScreenId, code: KeyCode, modifiers: KeyModifiers) {
        match id {
            ScreenId::Editor => self.editor.handle_key(code, modifiers),
            ScreenId::Overview => self.overview.handle_key(code, modifiers),
        }
    }
}
