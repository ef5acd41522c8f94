use ratatui::{
    prelude::*,
    widgets::{Gauge, Paragraph, Wrap},
};

use crate::app::App;
use crate::models::{GameState, Question};

const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(question) = app.current_question() else {
        return;
    };
    let state = app.state();

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    render_progress(frame, chunks[0], state);
    render_meta(frame, chunks[1], question, state.score);
    render_question_text(frame, chunks[2], &question.text);
    render_options(frame, chunks[3], question, state, app.option_cursor());
    render_feedback(frame, chunks[4], question, state);
    render_controls(frame, chunks[5], state.answered);
}

fn render_progress(frame: &mut Frame, area: Rect, state: &GameState) {
    let label = format!(
        "{}/{}",
        state.current_question_index + 1,
        state.total_questions()
    );
    let widget = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(state.progress())
        .label(label);
    frame.render_widget(widget, area);
}

fn render_meta(frame: &mut Frame, area: Rect, question: &Question, score: usize) {
    let line = Line::from(vec![
        Span::styled(
            format!("{} · {}", question.category, question.difficulty),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("   score {score}"),
            Style::default().fg(Color::Green),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_question_text(frame: &mut Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(widget, area);
}

fn render_options(
    frame: &mut Frame,
    area: Rect,
    question: &Question,
    state: &GameState,
    cursor: usize,
) {
    let chosen = state.selected_answer.index();
    let mut lines: Vec<Line> = Vec::with_capacity(question.options.len() * 2);

    for (index, option) in question.options.iter().enumerate() {
        let style = if state.answered {
            if question.is_correct(index) {
                Style::default().fg(Color::Green).bold()
            } else if chosen == Some(index) {
                Style::default().fg(Color::Red).bold()
            } else {
                Style::default().fg(Color::DarkGray)
            }
        } else if index == cursor {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = match (state.answered, chosen == Some(index), index == cursor) {
            (true, true, _) => "*",
            (false, _, true) => ">",
            _ => " ",
        };

        lines.push(Line::from(vec![
            Span::styled(format!(" {marker} "), style),
            Span::styled(format!("{}. ", OPTION_LABELS[index]), style),
            Span::styled(option.as_str(), style),
        ]));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_feedback(frame: &mut Frame, area: Rect, question: &Question, state: &GameState) {
    let mut lines = Vec::new();

    if let Some(image) = &question.image {
        lines.push(Line::from(Span::styled(
            format!("hint: {image}"),
            Style::default().fg(Color::Magenta),
        )));
    }

    if state.answered {
        let correct = state
            .selected_answer
            .index()
            .is_some_and(|i| question.is_correct(i));
        let verdict = if correct {
            Span::styled("Correct!", Style::default().fg(Color::Green).bold())
        } else {
            Span::styled(
                format!("Wrong, the answer was {}", question.correct_option()),
                Style::default().fg(Color::Red).bold(),
            )
        };
        lines.push(Line::from(verdict));
        if let Some(explanation) = &question.explanation {
            lines.push(Line::from(explanation.as_str().fg(Color::Gray)));
        }
    }

    let widget = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect, answered: bool) {
    let text = if answered {
        "enter next  ·  x abandon  ·  q quit"
    } else {
        "j/k navigate  ·  1-4 answer  ·  enter select  ·  x abandon  ·  q quit"
    };
    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
