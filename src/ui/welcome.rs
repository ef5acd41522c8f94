use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::account::Account;
use crate::app::{App, Focus};
use crate::models::Difficulty;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(5),
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    render_title(frame, chunks[0], app);

    let [difficulty_area, category_area] =
        Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)])
            .areas(chunks[1]);

    let difficulties: Vec<String> = Difficulty::ALL.iter().map(|d| capitalize(d.as_str())).collect();
    render_choice_list(
        frame,
        difficulty_area,
        "Difficulty",
        &difficulties,
        app.difficulty_cursor(),
        app.focus() == Focus::Difficulty,
    );
    render_choice_list(
        frame,
        category_area,
        "Category",
        app.categories(),
        app.category_cursor(),
        app.focus() == Focus::Category,
    );

    render_account(frame, chunks[2], app);
    render_controls(frame, chunks[3], app);
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.state();
    let content = vec![
        Line::from(Span::styled(
            "TRIVIA QUIZ",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(
            format!(
                "High score {}  ·  Games played {}",
                state.high_score, state.games_played
            )
            .fg(Color::DarkGray),
        ),
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn render_choice_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    items: &[String],
    selected: usize,
    focused: bool,
) {
    let lines: Vec<Line> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let is_selected = index == selected;
            let style = match (is_selected, focused) {
                (true, true) => Style::default().fg(Color::Cyan).bold(),
                (true, false) => Style::default().fg(Color::White),
                _ => Style::default().fg(Color::Gray),
            };
            let marker = if is_selected { ">" } else { " " };
            Line::from(Span::styled(format!(" {marker} {item}"), style))
        })
        .collect();

    let border = if focused { Color::Cyan } else { Color::DarkGray };
    let widget = Paragraph::new(lines).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(border)
            .padding(Padding::vertical(1)),
    );
    frame.render_widget(widget, area);
}

fn render_account(frame: &mut Frame, area: Rect, app: &App) {
    let line = match app.factory().map(|f| f.account()) {
        None => Line::from("Bundled questions".fg(Color::DarkGray)),
        Some(account) => {
            let who = account
                .user()
                .map(|u| u.name)
                .unwrap_or_else(|| "Signed out".to_string());
            let credits = account
                .credits_remaining()
                .map_or_else(|| "unlimited".to_string(), |c| c.to_string());
            let source = if app.use_ai() {
                Span::styled("AI questions", Style::default().fg(Color::Green).bold())
            } else {
                Span::styled("Bundled questions", Style::default().fg(Color::DarkGray))
            };
            Line::from(vec![
                source,
                Span::styled(
                    format!("  ·  {who}  ·  {} plan  ·  {credits} credits", account.plan_name()),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
    };

    let mut lines = vec![line];
    if app.is_generating() {
        lines.push(Line::from(Span::styled(
            "Generating questions...",
            Style::default().fg(Color::Yellow),
        )));
    }

    let widget = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect, app: &App) {
    let text = if app.is_generating() {
        "esc cancel  ·  q quit"
    } else if app.ai_available() {
        "j/k choose  ·  tab switch  ·  enter start  ·  g ai  ·  u upgrade  ·  q quit"
    } else {
        "j/k choose  ·  tab switch  ·  enter start  ·  q quit"
    };
    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
