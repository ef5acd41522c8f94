use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::app::App;
use crate::models::{GameHistory, percentage};

use super::grade_color;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(7),
        Constraint::Fill(1),
        Constraint::Length(2),
    ])
    .margin(1)
    .split(area);

    render_score_summary(frame, chunks[1], app);
    render_history(frame, chunks[2], app.controller().history(), app.history_scroll());
    render_controls(frame, chunks[3]);
}

fn render_score_summary(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.state();
    let percentage = state.percentage();
    let is_record = state.score > 0 && state.score == state.high_score;

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "RESULTS",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "{} / {}  ({}%)",
                state.score,
                state.total_questions(),
                percentage
            ),
            Style::default().fg(grade_color(percentage)).bold(),
        )),
    ];
    if is_record {
        content.push(Line::from("New high score!".fg(Color::Yellow)));
    } else {
        content.push(Line::from(
            format!("High score {}", state.high_score).fg(Color::DarkGray),
        ));
    }

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn render_history(frame: &mut Frame, area: Rect, history: &[GameHistory], scroll: usize) {
    let lines: Vec<Line> = history
        .iter()
        .rev()
        .map(|entry| {
            let pct = percentage(entry.score, entry.total_questions);
            Line::from(vec![
                Span::styled(
                    format!(" {} ", entry.date.format("%Y-%m-%d %H:%M")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:>6} ", entry.difficulty.as_str()),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!("{:>3}/{:<3} ", entry.score, entry.total_questions),
                    Style::default().fg(grade_color(pct)),
                ),
                Span::styled(
                    entry.category.clone().unwrap_or_default(),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .title("History")
                .padding(Padding::horizontal(1)),
        )
        .scroll((scroll as u16, 0));
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("j/k scroll  ·  r play again  ·  q quit")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
