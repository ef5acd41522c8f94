use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::LoadError;
use crate::models::Question;

const BUNDLED_QUESTIONS: &str = include_str!("questions.json");

/// Read-only provider of the question pool.
pub trait QuestionSource: Send + Sync {
    fn load(&self) -> Result<Vec<Question>, LoadError>;
}

/// The dataset compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledQuestions;

impl QuestionSource for BundledQuestions {
    fn load(&self) -> Result<Vec<Question>, LoadError> {
        parse_questions(BUNDLED_QUESTIONS)
    }
}

/// A JSON array of questions on disk, read on every load.
#[derive(Debug, Clone)]
pub struct JsonFileQuestions {
    path: PathBuf,
}

impl JsonFileQuestions {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl QuestionSource for JsonFileQuestions {
    fn load(&self) -> Result<Vec<Question>, LoadError> {
        load_questions_from_json(&self.path)
    }
}

/// A fixed list, used for generated pools and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticQuestions(pub Vec<Question>);

impl QuestionSource for StaticQuestions {
    fn load(&self) -> Result<Vec<Question>, LoadError> {
        if self.0.is_empty() {
            return Err(LoadError::Empty);
        }
        Ok(self.0.clone())
    }
}

pub fn load_questions_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Question>, LoadError> {
    let path = path.as_ref();
    let json_content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let questions = parse_questions(&json_content)?;
    debug!(path = %path.display(), count = questions.len(), "loaded questions");
    Ok(questions)
}

/// Parses and validates a JSON array of questions.
pub fn parse_questions(json: &str) -> Result<Vec<Question>, LoadError> {
    let questions: Vec<Question> = serde_json::from_str(json)?;

    if questions.is_empty() {
        return Err(LoadError::Empty);
    }

    for (index, question) in questions.iter().enumerate() {
        question
            .validate()
            .map_err(|reason| LoadError::Invalid { index, reason })?;
    }

    Ok(questions)
}

/// Sorted, de-duplicated category labels of a pool.
pub fn categories(questions: &[Question]) -> Vec<String> {
    questions
        .iter()
        .map(|q| q.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
