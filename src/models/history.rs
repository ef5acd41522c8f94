use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::Difficulty;

/// Number of history entries kept in the store.
pub const HISTORY_LIMIT: usize = 50;

/// One finished session. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameHistory {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub score: usize,
    pub total_questions: usize,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub category: Option<String>,
}

impl GameHistory {
    pub fn new(
        date: DateTime<Utc>,
        score: usize,
        total_questions: usize,
        difficulty: Difficulty,
        category: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            score,
            total_questions,
            difficulty,
            category,
        }
    }
}

/// Appends an entry, dropping the oldest ones past [`HISTORY_LIMIT`].
pub fn append_history(history: &mut Vec<GameHistory>, entry: GameHistory) {
    history.push(entry);
    if history.len() > HISTORY_LIMIT {
        let excess = history.len() - HISTORY_LIMIT;
        history.drain(..excess);
    }
}
