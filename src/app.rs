use tracing::{debug, info, warn};

use crate::account::Account;
use crate::ai::QuestionFactory;
use crate::data::{QuestionSource, categories};
use crate::error::GenerationError;
use crate::game::{Advance, GameController, GenerationTicket};
use crate::models::{ALL_CATEGORIES, Difficulty, GameState, NUM_OPTIONS, Phase, Question};
use crate::storage::SyncStatus;

/// Screen to render, derived from the game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Quiz,
    Result,
}

/// Which list the arrow keys move on the welcome screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Difficulty,
    Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// A question set the event loop should generate in the background.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub ticket: GenerationTicket,
    pub difficulty: Difficulty,
    pub category: Option<String>,
}

pub struct App {
    controller: GameController,
    factory: Option<QuestionFactory>,
    categories: Vec<String>,
    focus: Focus,
    difficulty_cursor: usize,
    category_cursor: usize,
    option_cursor: usize,
    use_ai: bool,
    pending: Option<GenerationTicket>,
    status: Option<StatusMessage>,
    history_scroll: usize,
}

impl App {
    pub fn new(controller: GameController, factory: Option<QuestionFactory>) -> Self {
        let mut category_list = vec![ALL_CATEGORIES.to_string()];
        match controller.source().load() {
            Ok(pool) => category_list.extend(categories(&pool)),
            Err(e) => warn!(error = %e, "could not list categories"),
        }

        let state = controller.state();
        let difficulty_cursor = state
            .selected_difficulty
            .and_then(|d| Difficulty::ALL.iter().position(|x| *x == d))
            .unwrap_or(0);
        let category_cursor = state
            .selected_category
            .as_ref()
            .and_then(|c| category_list.iter().position(|x| x == c))
            .unwrap_or(0);

        Self {
            controller,
            factory,
            categories: category_list,
            focus: Focus::Difficulty,
            difficulty_cursor,
            category_cursor,
            option_cursor: 0,
            use_ai: false,
            pending: None,
            status: None,
            history_scroll: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        match self.controller.phase() {
            Phase::Idle | Phase::Selecting => Screen::Welcome,
            Phase::Playing | Phase::Answered => Screen::Quiz,
            Phase::Finished => Screen::Result,
        }
    }

    pub fn state(&self) -> &GameState {
        self.controller.state()
    }

    pub fn controller(&self) -> &GameController {
        &self.controller
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.controller.state().current_question()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.controller.sync_status()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn difficulty_cursor(&self) -> usize {
        self.difficulty_cursor
    }

    pub fn category_cursor(&self) -> usize {
        self.category_cursor
    }

    pub fn option_cursor(&self) -> usize {
        self.option_cursor
    }

    pub fn history_scroll(&self) -> usize {
        self.history_scroll
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn is_generating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn ai_available(&self) -> bool {
        self.factory.is_some()
    }

    pub fn use_ai(&self) -> bool {
        self.use_ai
    }

    pub fn factory(&self) -> Option<&QuestionFactory> {
        self.factory.as_ref()
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Difficulty => Focus::Category,
            Focus::Category => Focus::Difficulty,
        };
    }

    pub fn toggle_ai(&mut self) {
        if self.factory.is_none() {
            self.set_error("AI generation is not configured".to_string());
            return;
        }
        self.use_ai = !self.use_ai;
    }

    pub fn move_up(&mut self) {
        match self.screen() {
            Screen::Welcome => match self.focus {
                Focus::Difficulty => {
                    self.difficulty_cursor = wrap_prev(self.difficulty_cursor, Difficulty::ALL.len())
                }
                Focus::Category => {
                    self.category_cursor = wrap_prev(self.category_cursor, self.categories.len())
                }
            },
            Screen::Quiz => self.option_cursor = wrap_prev(self.option_cursor, NUM_OPTIONS),
            Screen::Result => self.history_scroll = self.history_scroll.saturating_sub(1),
        }
    }

    pub fn move_down(&mut self) {
        match self.screen() {
            Screen::Welcome => match self.focus {
                Focus::Difficulty => {
                    self.difficulty_cursor = wrap_next(self.difficulty_cursor, Difficulty::ALL.len())
                }
                Focus::Category => {
                    self.category_cursor = wrap_next(self.category_cursor, self.categories.len())
                }
            },
            Screen::Quiz => self.option_cursor = wrap_next(self.option_cursor, NUM_OPTIONS),
            Screen::Result => {
                let max_scroll = self.controller.history().len().saturating_sub(1);
                self.history_scroll = (self.history_scroll + 1).min(max_scroll);
            }
        }
    }

    /// Applies the highlighted filters and starts a game. Returns a request
    /// when the questions must be generated first.
    pub fn start_selected(&mut self) -> Option<GenerationRequest> {
        if self.pending.is_some() {
            return None;
        }
        let difficulty = Difficulty::ALL[self.difficulty_cursor];
        let category = self
            .categories
            .get(self.category_cursor)
            .cloned()
            .unwrap_or_else(|| ALL_CATEGORIES.to_string());

        let applied = self
            .controller
            .select_difficulty(difficulty)
            .and_then(|()| self.controller.select_category(category.clone()));
        if let Err(e) = applied {
            self.set_error(e.to_string());
            return None;
        }

        if self.use_ai {
            let ticket = self.controller.begin_generation();
            self.pending = Some(ticket);
            self.set_info("Generating questions...".to_string());
            return Some(GenerationRequest {
                ticket,
                difficulty,
                category: Some(category),
            });
        }

        match self.controller.start_game() {
            Ok(()) => {
                self.option_cursor = 0;
                self.status = None;
            }
            Err(e) => self.set_error(e.to_string()),
        }
        None
    }

    /// Applies a finished generation. Results for superseded requests are
    /// dropped.
    pub fn on_generated(
        &mut self,
        ticket: GenerationTicket,
        result: Result<Vec<Question>, GenerationError>,
    ) {
        if self.pending != Some(ticket) || !self.controller.is_current(ticket) {
            debug!(?ticket, "ignoring generation result for a superseded request");
            return;
        }
        self.pending = None;

        let questions = match result {
            Ok(questions) => questions,
            Err(e) => {
                warn!(error = %e, "question generation failed");
                self.set_error(e.user_message());
                return;
            }
        };

        match self.controller.start_with_questions(ticket, questions) {
            Ok(()) => {
                self.option_cursor = 0;
                self.status = None;
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Answers with the highlighted option, or moves on once answered.
    pub fn confirm(&mut self) {
        if self.controller.state().answered {
            self.advance();
        } else {
            self.answer(self.option_cursor);
        }
    }

    pub fn answer(&mut self, index: usize) {
        if index < NUM_OPTIONS {
            self.option_cursor = index;
        }
        self.controller.select_answer(index);
    }

    fn advance(&mut self) {
        match self.controller.advance() {
            Ok(Advance::NextQuestion) => self.option_cursor = 0,
            Ok(Advance::Finished { score, total }) => {
                self.history_scroll = 0;
                self.set_info(format!("Finished with {score}/{total}"));
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Abandons the current session and any pending generation.
    pub fn quit_game(&mut self) {
        self.pending = None;
        self.controller.quit();
        self.option_cursor = 0;
        self.status = None;
    }

    pub fn restart(&mut self) {
        self.pending = None;
        self.controller.restart();
        self.option_cursor = 0;
        self.status = None;
    }

    pub fn request_upgrade(&mut self) {
        let Some(factory) = &self.factory else {
            self.set_error("AI generation is not configured".to_string());
            return;
        };
        match factory.account().request_upgrade() {
            Some(url) => self.set_info(format!("Manage your plan at {url}")),
            None => self.set_error("No upgrade link configured".to_string()),
        }
        info!("upgrade requested from app");
    }

    fn set_info(&mut self, text: String) {
        self.status = Some(StatusMessage {
            text,
            is_error: false,
        });
    }

    fn set_error(&mut self, text: String) {
        self.status = Some(StatusMessage {
            text,
            is_error: true,
        });
    }
}

fn wrap_next(index: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (index + 1) % len }
}

fn wrap_prev(index: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (index + len - 1) % len }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::account::{AccountSettings, LocalAccount};
    use crate::ai::QuestionGenerator;
    use crate::data::BundledQuestions;
    use crate::storage::{KeyValueStore, MemoryStore};

    struct NeverCalled;

    #[async_trait::async_trait]
    impl QuestionGenerator for NeverCalled {
        async fn generate(
            &self,
            _difficulty: Difficulty,
            _category: Option<&str>,
            _count: usize,
        ) -> Result<Vec<Question>, GenerationError> {
            unreachable!("generation runs in the event loop")
        }
    }

    fn app(with_ai: bool) -> App {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let controller = GameController::with_seed(Arc::new(BundledQuestions), store, 3);
        let factory = with_ai.then(|| {
            QuestionFactory::new(
                Arc::new(NeverCalled),
                None,
                Arc::new(LocalAccount::new(AccountSettings {
                    user: Some("sam".to_string()),
                    upgrade_url: Some("https://example.com/plans".to_string()),
                    ..AccountSettings::default()
                })),
                5,
            )
        });
        App::new(controller, factory)
    }

    #[test]
    fn test_categories_start_with_all() {
        let app = app(false);
        assert_eq!(app.categories()[0], ALL_CATEGORIES);
        assert_eq!(app.categories().len(), 6);
    }

    #[test]
    fn test_play_through_bundled_easy_game() {
        let mut app = app(false);
        assert_eq!(app.screen(), Screen::Welcome);
        assert!(app.start_selected().is_none());
        assert_eq!(app.screen(), Screen::Quiz);
        assert_eq!(app.state().total_questions(), 15);

        while app.screen() == Screen::Quiz {
            let correct = app.current_question().unwrap().correct_answer;
            app.answer(correct);
            app.confirm();
        }

        assert_eq!(app.screen(), Screen::Result);
        assert_eq!(app.state().score, 15);
        assert_eq!(app.state().percentage(), 100);

        app.restart();
        assert_eq!(app.screen(), Screen::Welcome);
        assert_eq!(app.state().high_score, 15);
    }

    #[test]
    fn test_cursor_wraps() {
        let mut app = app(false);
        app.move_up();
        assert_eq!(app.difficulty_cursor(), Difficulty::ALL.len() - 1);
        app.toggle_focus();
        app.move_up();
        assert_eq!(app.category_cursor(), app.categories().len() - 1);
        app.move_down();
        assert_eq!(app.category_cursor(), 0);
    }

    #[test]
    fn test_ai_toggle_requires_configuration() {
        let mut app = app(false);
        app.toggle_ai();
        assert!(!app.use_ai());
        assert!(app.status().unwrap().is_error);
    }

    #[test]
    fn test_generation_result_after_quit_is_discarded() {
        let mut app = app(true);
        app.toggle_ai();
        let request = app.start_selected().unwrap();
        assert!(app.is_generating());

        app.quit_game();
        app.on_generated(request.ticket, Ok(Vec::new()));
        assert_eq!(app.screen(), Screen::Welcome);
        assert!(app.state().questions.is_empty());
    }

    #[test]
    fn test_generation_failure_reports_cause() {
        let mut app = app(true);
        app.toggle_ai();
        let request = app.start_selected().unwrap();

        app.on_generated(request.ticket, Err(GenerationError::InsufficientCredits));
        assert!(!app.is_generating());
        assert_eq!(app.screen(), Screen::Welcome);
        let status = app.status().unwrap();
        assert!(status.is_error);
        assert!(status.text.contains("credits"));
    }

    #[test]
    fn test_generated_questions_start_game() {
        let mut app = app(true);
        app.toggle_ai();
        let request = app.start_selected().unwrap();
        let generated: Vec<Question> = BundledQuestions
            .load()
            .unwrap()
            .into_iter()
            .filter(|q| q.difficulty == request.difficulty)
            .take(4)
            .collect();

        app.on_generated(request.ticket, Ok(generated));
        assert_eq!(app.screen(), Screen::Quiz);
        assert_eq!(app.state().total_questions(), 4);
    }

    #[test]
    fn test_upgrade_link_is_shown() {
        let mut app = app(true);
        app.request_upgrade();
        assert!(app.status().unwrap().text.contains("example.com/plans"));
    }
}
