use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use trivia_quiz::{
    Advance, BundledQuestions, Difficulty, FileStore, GameController, GameError, KeyValueStore,
    MemoryStore, Phase, SyncStatus,
};

fn controller(seed: u64) -> GameController {
    GameController::with_seed(Arc::new(BundledQuestions), Arc::new(MemoryStore::new()), seed)
}

/// Answers every question correctly and returns the final advance.
fn play_perfect_game(controller: &mut GameController) -> Advance {
    loop {
        let correct = controller
            .state()
            .current_question()
            .map(|q| q.correct_answer)
            .expect("a question is showing");
        assert!(controller.select_answer(correct));
        let step = controller.advance().expect("answered question advances");
        if let Advance::Finished { .. } = step {
            return step;
        }
    }
}

fn session_texts(controller: &GameController) -> BTreeSet<String> {
    controller
        .state()
        .questions
        .iter()
        .map(|q| q.text.clone())
        .collect()
}

#[test]
fn test_easy_all_categories_perfect_game() {
    let mut controller = controller(11);
    controller.select_difficulty(Difficulty::Easy).unwrap();
    controller.select_category("All Categories").unwrap();
    controller.start_game().unwrap();

    assert_eq!(controller.state().total_questions(), 15);
    assert_eq!(controller.phase(), Phase::Playing);

    let finished = play_perfect_game(&mut controller);

    assert_eq!(finished, Advance::Finished { score: 15, total: 15 });
    assert_eq!(controller.phase(), Phase::Finished);
    assert_eq!(controller.state().percentage(), 100);
    assert_eq!(controller.state().high_score, 15);
    assert_eq!(controller.state().games_played, 1);
    assert_eq!(controller.history().len(), 1);
}

#[test]
fn test_hard_category_session_only_draws_matching_questions() {
    let mut controller = controller(5);
    controller.select_difficulty(Difficulty::Hard).unwrap();
    controller.select_category("Science and Technology").unwrap();
    controller.start_game().unwrap();

    let questions = &controller.state().questions;
    assert_eq!(questions.len(), 3);
    assert!(questions.iter().all(|q| {
        q.difficulty == Difficulty::Hard && q.category == "Science and Technology"
    }));
}

#[test]
fn test_restart_then_start_draws_from_the_same_pool() {
    let mut controller = controller(21);
    controller.select_difficulty(Difficulty::Medium).unwrap();
    controller.select_category("Geography").unwrap();
    controller.start_game().unwrap();
    let first = session_texts(&controller);
    play_perfect_game(&mut controller);

    controller.restart();
    assert_eq!(controller.phase(), Phase::Idle);
    assert_eq!(controller.state().games_played, 1);

    controller.select_difficulty(Difficulty::Medium).unwrap();
    controller.select_category("Geography").unwrap();
    controller.start_game().unwrap();

    assert_eq!(session_texts(&controller), first);
    assert_eq!(controller.state().score, 0);
}

#[test]
fn test_unknown_category_is_rejected_without_changing_state() {
    let mut controller = controller(1);
    controller.select_difficulty(Difficulty::Easy).unwrap();
    controller.select_category("Cooking").unwrap();

    let err = controller.start_game().unwrap_err();

    assert!(matches!(err, GameError::EmptyPool { .. }));
    assert_eq!(controller.phase(), Phase::Selecting);
    assert!(controller.state().questions.is_empty());
}

#[test]
fn test_generation_result_after_quit_is_discarded() {
    let mut controller = controller(2);
    controller.select_difficulty(Difficulty::Easy).unwrap();
    let ticket = controller.begin_generation();

    controller.quit();
    let generated = controller.state().questions.clone();
    let err = controller.start_with_questions(ticket, generated).unwrap_err();

    assert!(matches!(err, GameError::StaleGeneration));
    assert!(!controller.state().started);
}

#[tokio::test]
async fn test_progress_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    {
        let store = Arc::new(FileStore::open(&path).unwrap());
        let mut controller =
            GameController::with_seed(Arc::new(BundledQuestions), store.clone(), 8);
        controller.select_difficulty(Difficulty::Hard).unwrap();
        controller.start_game().unwrap();
        play_perfect_game(&mut controller);
        assert_eq!(store.flush(Duration::from_secs(2)).await, SyncStatus::Synced);
    }

    let store = Arc::new(FileStore::open(&path).unwrap());
    assert_eq!(store.sync_status(), SyncStatus::Synced);
    let controller = GameController::with_seed(Arc::new(BundledQuestions), store, 8);

    assert_eq!(controller.state().games_played, 1);
    assert_eq!(controller.state().high_score, 15);
    assert_eq!(controller.history().len(), 1);
    assert_eq!(controller.phase(), Phase::Finished);
}
