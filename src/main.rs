use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trivia_quiz::data::categories;
use trivia_quiz::models::ALL_CATEGORIES;
use trivia_quiz::{
    BundledQuestions, Difficulty, FileStore, GameController, JsonFileQuestions, LocalAccount,
    Question, QuestionFactory, QuestionSource, Quiz, Settings, SyncStatus, load_settings,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON file to load the questions from (bundled set when omitted)
    #[arg(short, long)]
    questions: Option<PathBuf>,

    /// Config file (defaults to ./trivia.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File used to persist the game state and history
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Preselect a difficulty: easy, medium or hard
    #[arg(short, long)]
    difficulty: Option<Difficulty>,

    /// Preselect a category
    #[arg(long)]
    category: Option<String>,

    /// Start with AI question generation switched on
    #[arg(short, long)]
    generate: bool,

    /// Where to write logs
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.questions {
            settings.questions = Some(path.clone());
        }
        if let Some(path) = &self.store {
            settings.store_path = path.clone();
        }
        if let Some(path) = &self.log_file {
            settings.log_file = path.clone();
        }
        if let Some(difficulty) = self.difficulty {
            settings.difficulty = Some(difficulty);
        }
        if let Some(category) = &self.category {
            settings.category = Some(category.clone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    args.apply(&mut settings);

    init_logging(&settings.log_file)?;
    info!(store = %settings.store_path.display(), "starting trivia quiz");

    let source: Arc<dyn QuestionSource> = match &settings.questions {
        Some(path) => Arc::new(JsonFileQuestions::new(path)),
        None => Arc::new(BundledQuestions),
    };
    // Fail before touching the terminal if the question file is unusable.
    let pool = source.load().context("failed to load questions")?;

    let store = Arc::new(
        FileStore::open(&settings.store_path)
            .with_context(|| format!("failed to open {}", settings.store_path.display()))?,
    );

    let factory = if settings.ai.is_usable() {
        let account = Arc::new(LocalAccount::new(settings.account.clone()));
        Some(
            QuestionFactory::from_config(settings.ai.clone(), account)
                .context("failed to set up question generation")?,
        )
    } else {
        if args.generate {
            warn!("--generate ignored: no AI API key configured");
        }
        None
    };

    let mut controller = GameController::new(source, store.clone());
    if let Some(difficulty) = settings.difficulty {
        if let Err(e) = controller.select_difficulty(difficulty) {
            warn!(error = %e, "preselected difficulty not applied");
        }
    }
    if let Some(category) = settings.category.clone() {
        if !is_known_category(&pool, &category) {
            warn!(%category, "preselected category has no questions, ignoring it");
        } else if let Err(e) = controller.select_category(category) {
            warn!(error = %e, "preselected category not applied");
        }
    }

    let mut quiz = Quiz::new(controller, factory);
    if args.generate && quiz.app().ai_available() {
        quiz.app_mut().toggle_ai();
    }
    quiz.run().await?;

    if let SyncStatus::Error(e) = store.flush(Duration::from_secs(2)).await {
        warn!(error = %e, "last save did not complete");
        eprintln!("Warning: progress may not have been saved: {e}");
    }
    Ok(())
}

fn is_known_category(pool: &[Question], category: &str) -> bool {
    category == ALL_CATEGORIES || categories(pool).iter().any(|c| c == category)
}

/// Logs go to a file so they never draw over the terminal UI.
fn init_logging(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
