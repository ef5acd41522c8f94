use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::{Difficulty, Question};

/// Questions matching the difficulty and, unless it is "All Categories",
/// the category. Order is preserved.
pub fn filter_pool(
    pool: &[Question],
    difficulty: Difficulty,
    category: Option<&str>,
) -> Vec<Question> {
    pool.iter()
        .filter(|q| q.matches(difficulty, category))
        .cloned()
        .collect()
}

/// Filters then shuffles (Fisher-Yates) so repeated plays differ.
pub fn build_session<R: Rng + ?Sized>(
    pool: &[Question],
    difficulty: Difficulty,
    category: Option<&str>,
    rng: &mut R,
) -> Vec<Question> {
    let mut questions = filter_pool(pool, difficulty, category);
    questions.shuffle(rng);
    questions
}
