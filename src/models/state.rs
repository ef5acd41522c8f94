use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::question::{Difficulty, Question};

/// The answer picked for the current question, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum AnswerSelection {
    #[default]
    NoSelection,
    Selected(usize),
}

impl AnswerSelection {
    pub fn index(self) -> Option<usize> {
        match self {
            AnswerSelection::NoSelection => None,
            AnswerSelection::Selected(index) => Some(index),
        }
    }
}

/// Screen the game is on, derived from [`GameState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No game and no filters chosen.
    Idle,
    /// Filters chosen, game not started.
    Selecting,
    /// A question is waiting for an answer.
    Playing,
    /// The current question has been answered.
    Answered,
    /// The last session ran to its final question.
    Finished,
}

/// Persisted state of the quiz.
///
/// Replaced wholesale by every controller operation; `games_played` and
/// `high_score` survive a restart.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub current_question_index: usize,
    pub score: usize,
    pub questions: Vec<Question>,
    pub answered: bool,
    pub selected_answer: AnswerSelection,
    pub started: bool,
    pub selected_difficulty: Option<Difficulty>,
    pub selected_category: Option<String>,
    pub last_played: Option<DateTime<Utc>>,
    pub games_played: u32,
    pub high_score: usize,
}

impl GameState {
    pub fn phase(&self) -> Phase {
        if self.started {
            if self.answered {
                Phase::Answered
            } else {
                Phase::Playing
            }
        } else if !self.questions.is_empty()
            && self.current_question_index >= self.questions.len()
        {
            Phase::Finished
        } else if self.selected_difficulty.is_some() || self.selected_category.is_some() {
            Phase::Selecting
        } else {
            Phase::Idle
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.started {
            self.questions.get(self.current_question_index)
        } else {
            None
        }
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Fraction of the session reached, counting the current question.
    pub fn progress(&self) -> f64 {
        let total = self.questions.len();
        if total == 0 {
            return 0.0;
        }
        ((self.current_question_index + 1) as f64 / total as f64).min(1.0)
    }

    /// Score as a whole-number percentage of the question count.
    pub fn percentage(&self) -> u32 {
        percentage(self.score, self.questions.len())
    }

    /// Clears the session, keeping lifetime statistics.
    pub fn reset(&self) -> GameState {
        GameState {
            last_played: self.last_played,
            games_played: self.games_played,
            high_score: self.high_score,
            ..GameState::default()
        }
    }

    /// Whether the state could have been produced by the controller.
    pub fn is_consistent(&self) -> bool {
        let total = self.questions.len();
        if self.current_question_index > total {
            return false;
        }
        if self.started {
            let answered = usize::from(self.answered);
            self.current_question_index < total
                && self.score <= self.current_question_index + answered
                && self.answered == self.selected_answer.index().is_some()
        } else {
            self.score <= total
        }
    }
}

pub fn percentage(score: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (score as f64 / total as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::sample;

    fn playing(total: usize) -> GameState {
        GameState {
            questions: (0..total)
                .map(|i| sample(&format!("q{i}"), "Geography", Difficulty::Easy, 0))
                .collect(),
            started: true,
            selected_difficulty: Some(Difficulty::Easy),
            ..GameState::default()
        }
    }

    #[test]
    fn test_phase_transitions() {
        let mut state = GameState::default();
        assert_eq!(state.phase(), Phase::Idle);

        state.selected_difficulty = Some(Difficulty::Easy);
        assert_eq!(state.phase(), Phase::Selecting);

        let mut state = playing(2);
        assert_eq!(state.phase(), Phase::Playing);

        state.answered = true;
        state.selected_answer = AnswerSelection::Selected(1);
        assert_eq!(state.phase(), Phase::Answered);

        state.started = false;
        state.current_question_index = 2;
        assert_eq!(state.phase(), Phase::Finished);
    }

    #[test]
    fn test_progress_and_percentage() {
        let mut state = playing(4);
        assert_eq!(state.progress(), 0.25);

        state.current_question_index = 3;
        assert_eq!(state.progress(), 1.0);

        state.current_question_index = 4;
        assert_eq!(state.progress(), 1.0);

        state.score = 1;
        assert_eq!(state.percentage(), 25);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_reset_keeps_statistics() {
        let mut state = playing(3);
        state.games_played = 4;
        state.high_score = 9;
        state.score = 2;
        state.selected_category = Some("Geography".to_string());

        let reset = state.reset();
        assert_eq!(reset.games_played, 4);
        assert_eq!(reset.high_score, 9);
        assert_eq!(reset.score, 0);
        assert!(reset.questions.is_empty());
        assert!(reset.selected_category.is_none());
        assert_eq!(reset.phase(), Phase::Idle);
    }

    #[test]
    fn test_state_round_trips_with_missing_fields() {
        let state: GameState = serde_json::from_str(r#"{"high_score": 7}"#).unwrap();
        assert_eq!(state.high_score, 7);
        assert_eq!(state.selected_answer, AnswerSelection::NoSelection);
    }
}
