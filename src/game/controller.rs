use std::sync::Arc;

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::data::QuestionSource;
use crate::error::GameError;
use crate::models::{
    ALL_CATEGORIES, AnswerSelection, Difficulty, GameHistory, GameState, NUM_OPTIONS, Phase,
    Question, append_history,
};
use crate::storage::{self, GAME_STATE_KEY, HISTORY_KEY, KeyValueStore, SyncStatus};

use super::pool::build_session;

/// Identifies one request for generated questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket(u64);

/// What `advance` led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextQuestion,
    Finished { score: usize, total: usize },
}

/// Owns the [`GameState`] and applies every transition to it.
///
/// Each operation builds the next state from the current one and swaps it in
/// whole, then hands it to the store. A failed operation leaves the state
/// untouched.
pub struct GameController {
    state: GameState,
    history: Vec<GameHistory>,
    source: Arc<dyn QuestionSource>,
    store: Arc<dyn KeyValueStore>,
    rng: StdRng,
    generation: u64,
}

impl GameController {
    pub fn new(source: Arc<dyn QuestionSource>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_rng(source, store, StdRng::from_os_rng())
    }

    pub fn with_seed(
        source: Arc<dyn QuestionSource>,
        store: Arc<dyn KeyValueStore>,
        seed: u64,
    ) -> Self {
        Self::with_rng(source, store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        source: Arc<dyn QuestionSource>,
        store: Arc<dyn KeyValueStore>,
        rng: StdRng,
    ) -> Self {
        let mut state = storage::load_or(&*store, GAME_STATE_KEY, GameState::default());
        if !state.is_consistent() {
            warn!("stored game state is inconsistent, resetting session");
            state = state.reset();
        }
        let history = storage::load_or(&*store, HISTORY_KEY, Vec::new());
        debug!(
            games_played = state.games_played,
            high_score = state.high_score,
            "restored game state"
        );

        Self {
            state,
            history,
            source,
            store,
            rng,
            generation: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn history(&self) -> &[GameHistory] {
        &self.history
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.store.sync_status()
    }

    pub fn source(&self) -> &dyn QuestionSource {
        self.source.as_ref()
    }

    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> Result<(), GameError> {
        self.ensure_selectable("change difficulty")?;
        let next = GameState {
            selected_difficulty: Some(difficulty),
            ..self.state.clone()
        };
        self.commit(next);
        Ok(())
    }

    pub fn select_category(&mut self, category: impl Into<String>) -> Result<(), GameError> {
        self.ensure_selectable("change category")?;
        let next = GameState {
            selected_category: Some(category.into()),
            ..self.state.clone()
        };
        self.commit(next);
        Ok(())
    }

    /// Starts a session from the question source using the selected filters.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        self.ensure_selectable("start a new game")?;
        let difficulty = self.state.selected_difficulty.ok_or(GameError::NoDifficulty)?;
        let pool = self.source.load()?;
        self.start_from_pool(difficulty, &pool)
    }

    /// Reserves a ticket for an asynchronous question request. Any earlier
    /// ticket stops being current.
    pub fn begin_generation(&mut self) -> GenerationTicket {
        self.generation += 1;
        GenerationTicket(self.generation)
    }

    pub fn is_current(&self, ticket: GenerationTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Starts a session from generated questions, unless the request was
    /// superseded by a restart or a newer request.
    pub fn start_with_questions(
        &mut self,
        ticket: GenerationTicket,
        pool: Vec<Question>,
    ) -> Result<(), GameError> {
        if !self.is_current(ticket) {
            debug!(?ticket, "discarding stale generated questions");
            return Err(GameError::StaleGeneration);
        }
        self.ensure_selectable("start a new game")?;
        let difficulty = self.state.selected_difficulty.ok_or(GameError::NoDifficulty)?;
        self.start_from_pool(difficulty, &pool)
    }

    fn start_from_pool(
        &mut self,
        difficulty: Difficulty,
        pool: &[Question],
    ) -> Result<(), GameError> {
        let category = self.state.selected_category.as_deref();
        let questions = build_session(pool, difficulty, category, &mut self.rng);
        if questions.is_empty() {
            return Err(GameError::EmptyPool {
                difficulty,
                category: category.unwrap_or(ALL_CATEGORIES).to_string(),
            });
        }

        info!(
            %difficulty,
            category = category.unwrap_or(ALL_CATEGORIES),
            count = questions.len(),
            "game started"
        );
        let next = GameState {
            current_question_index: 0,
            score: 0,
            questions,
            answered: false,
            selected_answer: AnswerSelection::NoSelection,
            started: true,
            last_played: Some(Utc::now()),
            ..self.state.clone()
        };
        self.commit(next);
        Ok(())
    }

    /// Records an answer for the current question. Returns `false` when the
    /// call was ignored: no game, already answered, or index out of range.
    pub fn select_answer(&mut self, answer: usize) -> bool {
        if self.state.answered || answer >= NUM_OPTIONS {
            return false;
        }
        let Some(question) = self.state.current_question() else {
            return false;
        };

        let correct = question.is_correct(answer);
        debug!(
            question = self.state.current_question_index,
            answer, correct, "answer selected"
        );
        let next = GameState {
            answered: true,
            selected_answer: AnswerSelection::Selected(answer),
            score: self.state.score + usize::from(correct),
            ..self.state.clone()
        };
        self.commit(next);
        true
    }

    pub fn advance(&mut self) -> Result<Advance, GameError> {
        if !self.state.started {
            return Err(GameError::NotPlaying);
        }
        if !self.state.answered {
            return Err(GameError::NotAnswered);
        }

        let total = self.state.questions.len();
        let next_index = self.state.current_question_index + 1;
        if next_index < total {
            let next = GameState {
                current_question_index: next_index,
                answered: false,
                selected_answer: AnswerSelection::NoSelection,
                ..self.state.clone()
            };
            self.commit(next);
            return Ok(Advance::NextQuestion);
        }

        let score = self.state.score;
        let next = GameState {
            current_question_index: total,
            started: false,
            games_played: self.state.games_played + 1,
            high_score: self.state.high_score.max(score),
            ..self.state.clone()
        };
        info!(score, total, high_score = next.high_score, "game finished");
        self.record_history(&next);
        self.commit(next);
        Ok(Advance::Finished { score, total })
    }

    /// Clears the session and filters. Always succeeds; any pending
    /// generation result will be discarded.
    pub fn restart(&mut self) {
        self.generation += 1;
        let next = self.state.reset();
        self.commit(next);
    }

    pub fn quit(&mut self) {
        debug!("quitting session");
        self.restart();
    }

    fn ensure_selectable(&self, action: &'static str) -> Result<(), GameError> {
        if self.state.started {
            return Err(GameError::InvalidTransition { action });
        }
        Ok(())
    }

    fn record_history(&mut self, finished: &GameState) {
        let Some(difficulty) = finished.selected_difficulty else {
            return;
        };
        let entry = GameHistory::new(
            Utc::now(),
            finished.score,
            finished.questions.len(),
            difficulty,
            finished.selected_category.clone(),
        );
        append_history(&mut self.history, entry);
        storage::save(self.store.as_ref(), HISTORY_KEY, &self.history);
    }

    fn commit(&mut self, next: GameState) {
        debug_assert!(next.is_consistent());
        self.state = next;
        storage::save(self.store.as_ref(), GAME_STATE_KEY, &self.state);
    }
}
