//! Error types shared across the crate.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::models::{Difficulty, InvalidQuestion};

/// Errors loading a question pool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse questions: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question {index} is invalid: {reason}")]
    Invalid {
        index: usize,
        #[source]
        reason: InvalidQuestion,
    },
    #[error("question source contains no questions")]
    Empty,
}

/// Errors from the game session controller. State is never changed when one
/// of these is returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GameError {
    #[error("cannot {action} while a game is in progress")]
    InvalidTransition { action: &'static str },
    #[error("select a difficulty before starting")]
    NoDifficulty,
    #[error("no {difficulty} questions available for {category}")]
    EmptyPool {
        difficulty: Difficulty,
        category: String,
    },
    #[error("question source unavailable: {0}")]
    Source(#[from] LoadError),
    #[error("the current question has not been answered")]
    NotAnswered,
    #[error("no game is in progress")]
    NotPlaying,
    #[error("generated questions belong to a superseded request")]
    StaleGeneration,
}

/// Errors from AI question generation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("AI generation is not configured")]
    Disabled,
    #[error("sign in to generate questions")]
    SignedOut,
    #[error("not enough credits to generate questions")]
    InsufficientCredits,
    #[error("rate limited, retry in {}s", .retry_after.map_or(0, |d| d.as_secs()))]
    RateLimited { retry_after: Option<Duration> },
    #[error("generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("generated questions were malformed: {0}")]
    Malformed(String),
}

impl GenerationError {
    /// Message suited for the status line.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::InsufficientCredits => {
                "Out of credits. Press u to upgrade your plan.".to_string()
            }
            GenerationError::RateLimited {
                retry_after: Some(delay),
            } => format!("Too many requests. Try again in {} seconds.", delay.as_secs()),
            GenerationError::RateLimited { retry_after: None } => {
                "Too many requests. Try again shortly.".to_string()
            }
            GenerationError::Disabled | GenerationError::SignedOut => self.to_string(),
            _ => "Could not generate questions. Please try again.".to_string(),
        }
    }
}

/// Errors loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level error for running a quiz.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("failed to load questions: {0}")]
    Load(#[from] LoadError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
