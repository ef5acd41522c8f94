mod quiz;
mod result;
mod welcome;

use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph},
};

use crate::app::{App, Screen};
use crate::storage::SyncStatus;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    frame.render_widget(Block::default().bg(Color::Reset), area);

    let [body, status_bar] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);

    match app.screen() {
        Screen::Welcome => welcome::render(frame, body, app),
        Screen::Quiz => quiz::render(frame, body, app),
        Screen::Result => result::render(frame, body, app),
    }

    render_status_bar(frame, status_bar, app);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let [message_area, sync_area] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(24)]).areas(area);

    if let Some(status) = app.status() {
        let color = if status.is_error { Color::Red } else { Color::Cyan };
        let widget = Paragraph::new(format!(" {}", status.text)).fg(color);
        frame.render_widget(widget, message_area);
    }

    let sync = app.sync_status();
    let color = match sync {
        SyncStatus::Synced => Color::DarkGray,
        SyncStatus::Pending => Color::Yellow,
        SyncStatus::Error(_) => Color::Red,
    };
    let label = match sync {
        SyncStatus::Error(_) => "● save failed".to_string(),
        other => format!("● {other}"),
    };
    let widget = Paragraph::new(label)
        .alignment(Alignment::Right)
        .fg(color);
    frame.render_widget(widget, sync_area);
}

/// Colour for a percentage score.
pub(crate) fn grade_color(percentage: u32) -> Color {
    match percentage {
        90.. => Color::Green,
        70..=89 => Color::Cyan,
        50..=69 => Color::Yellow,
        _ => Color::Red,
    }
}
