mod history;
mod question;
mod state;

pub use history::{GameHistory, HISTORY_LIMIT, append_history};
pub use question::{ALL_CATEGORIES, Difficulty, InvalidQuestion, NUM_OPTIONS, Question};
pub use state::{AnswerSelection, GameState, Phase, percentage};

#[cfg(test)]
pub(crate) use question::sample;
