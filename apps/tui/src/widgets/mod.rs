//! Reusable TUI widgets.

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use sitecms_core::EditorStatus;

/// Bottom status bar.
pub(crate) fn status_bar(msg: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" {msg}"))
        .style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White),
        )
}

/// Colour for the save indicator of an editor session.
pub(crate) fn status_style(status: &EditorStatus) -> Style {
    match status {
        EditorStatus::SaveSucceeded { .. } => {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        }
        EditorStatus::Failed(_) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        EditorStatus::Loading | EditorStatus::Saving => Style::default().fg(Color::Yellow),
        EditorStatus::Ready => Style::default().fg(Color::Cyan),
    }
}
