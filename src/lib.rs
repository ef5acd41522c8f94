//! # trivia-quiz
//!
//! A terminal trivia game: pick a difficulty and category, answer shuffled
//! multiple-choice questions, and keep a persistent high score and history.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use trivia_quiz::{BundledQuestions, GameController, MemoryStore, Quiz, QuizError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QuizError> {
//!     let controller = GameController::new(
//!         Arc::new(BundledQuestions),
//!         Arc::new(MemoryStore::new()),
//!     );
//!     Quiz::new(controller, None).run().await
//! }
//! ```

pub mod account;
pub mod ai;
mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod game;
pub mod models;
pub mod storage;
pub mod terminal;
mod ui;

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub use account::{Account, AccountSettings, LocalAccount, UserProfile};
pub use ai::{GeneratorConfig, ImageHintGenerator, QuestionFactory, QuestionGenerator};
pub use app::{App, Focus, GenerationRequest, Screen, StatusMessage};
pub use config::{Settings, load_settings};
pub use data::{BundledQuestions, JsonFileQuestions, QuestionSource, StaticQuestions};
pub use error::{ConfigError, GameError, GenerationError, LoadError, QuizError};
pub use game::{Advance, GameController, GenerationTicket};
pub use models::{Difficulty, GameHistory, GameState, Phase, Question};
pub use storage::{FileStore, KeyValueStore, MemoryStore, SyncStatus};

type Generated = (GenerationTicket, Result<Vec<Question>, GenerationError>);

/// What the event loop should do after a key press.
#[derive(Debug)]
enum Control {
    Continue,
    Quit,
    Generate(GenerationRequest),
}

/// A quiz instance that can be run in the terminal.
pub struct Quiz {
    app: App,
}

impl Quiz {
    /// `factory` enables AI-generated question sets.
    pub fn new(controller: GameController, factory: Option<QuestionFactory>) -> Self {
        Self {
            app: App::new(controller, factory),
        }
    }

    /// Runs the quiz in the terminal until the player quits.
    ///
    /// Question generation runs on spawned tasks; results come back over a
    /// channel and are applied between frames.
    pub async fn run(mut self) -> Result<(), QuizError> {
        let mut tui = terminal::Tui::enter()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Generated>();
        info!("quiz started");

        loop {
            while let Ok((ticket, result)) = rx.try_recv() {
                self.app.on_generated(ticket, result);
            }

            tui.draw(|frame| ui::render(frame, &self.app))?;

            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match handle_input(&mut self.app, key.code) {
                Control::Continue => {}
                Control::Quit => break,
                Control::Generate(request) => spawn_generation(&self.app, request, tx.clone()),
            }
        }

        info!(
            games_played = self.app.state().games_played,
            high_score = self.app.state().high_score,
            "quiz closed"
        );
        Ok(())
    }

    /// Get a reference to the underlying app for custom handling.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a mutable reference to the underlying app for custom handling.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }
}

fn spawn_generation(app: &App, request: GenerationRequest, tx: mpsc::UnboundedSender<Generated>) {
    let Some(factory) = app.factory().cloned() else {
        let _ = tx.send((request.ticket, Err(GenerationError::Disabled)));
        return;
    };
    debug!(ticket = ?request.ticket, difficulty = %request.difficulty, "spawning generation");
    tokio::spawn(async move {
        let result = factory
            .generate(request.difficulty, request.category)
            .await;
        // The receiver is gone once the loop has exited.
        let _ = tx.send((request.ticket, result));
    });
}

fn handle_input(app: &mut App, key: KeyCode) -> Control {
    if matches!(key, KeyCode::Char('q') | KeyCode::Char('Q')) {
        return Control::Quit;
    }
    match app.screen() {
        Screen::Welcome => handle_welcome_input(app, key),
        Screen::Quiz => {
            handle_quiz_input(app, key);
            Control::Continue
        }
        Screen::Result => {
            handle_result_input(app, key);
            Control::Continue
        }
    }
}

fn handle_welcome_input(app: &mut App, key: KeyCode) -> Control {
    match key {
        KeyCode::Up | KeyCode::Char('k') => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_down(),
        KeyCode::Tab | KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') => {
            app.toggle_focus()
        }
        KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_ai(),
        KeyCode::Char('u') | KeyCode::Char('U') => app.request_upgrade(),
        KeyCode::Esc | KeyCode::Char('x') if app.is_generating() => app.quit_game(),
        KeyCode::Enter => {
            if let Some(request) = app.start_selected() {
                return Control::Generate(request);
            }
        }
        _ => {}
    }
    Control::Continue
}

fn handle_quiz_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Up | KeyCode::Char('k') => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_down(),
        KeyCode::Enter | KeyCode::Char(' ') => app.confirm(),
        KeyCode::Char(c @ '1'..='4') => app.answer(c as usize - '1' as usize),
        KeyCode::Char(c @ 'a'..='d') => app.answer(c as usize - 'a' as usize),
        KeyCode::Char('x') | KeyCode::Esc => app.quit_game(),
        _ => {}
    }
}

fn handle_result_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Up | KeyCode::Char('k') => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_down(),
        KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Enter => app.restart(),
        _ => {}
    }
}
