//! AI question and image-hint generation.

mod client;
mod parse;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Deserialize;
use tracing::{info, warn};

use crate::account::{Account, ensure_can_generate};
use crate::error::GenerationError;
use crate::models::{ALL_CATEGORIES, Difficulty, Question};

pub use client::OpenAiClient;

const DEFAULT_QUESTION_COUNT: usize = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub image_model: String,
    pub question_count: usize,
    pub image_hints: bool,
    /// Upper bound for a single request, in seconds.
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
            image_model: "dall-e-2".into(),
            question_count: DEFAULT_QUESTION_COUNT,
            image_hints: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GeneratorConfig {
    pub fn is_usable(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(
        &self,
        difficulty: Difficulty,
        category: Option<&str>,
        count: usize,
    ) -> Result<Vec<Question>, GenerationError>;
}

#[async_trait]
pub trait ImageHintGenerator: Send + Sync {
    /// Returns an image reference for the prompt.
    async fn generate_hint(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Produces a full generated question set for one game start: checks the
/// account, requests questions, spends a credit, then attaches image hints.
#[derive(Clone)]
pub struct QuestionFactory {
    questions: Arc<dyn QuestionGenerator>,
    images: Option<Arc<dyn ImageHintGenerator>>,
    account: Arc<dyn Account>,
    count: usize,
}

impl QuestionFactory {
    pub fn new(
        questions: Arc<dyn QuestionGenerator>,
        images: Option<Arc<dyn ImageHintGenerator>>,
        account: Arc<dyn Account>,
        count: usize,
    ) -> Self {
        Self {
            questions,
            images,
            account,
            count: count.max(1),
        }
    }

    /// Wires an [`OpenAiClient`] for both questions and (when enabled) images.
    pub fn from_config(
        config: GeneratorConfig,
        account: Arc<dyn Account>,
    ) -> Result<Self, GenerationError> {
        let count = config.question_count;
        let image_hints = config.image_hints;
        let client = Arc::new(OpenAiClient::new(config)?);
        let images: Option<Arc<dyn ImageHintGenerator>> = if image_hints {
            Some(client.clone())
        } else {
            None
        };
        Ok(Self::new(client, images, account, count))
    }

    pub fn account(&self) -> &dyn Account {
        self.account.as_ref()
    }

    pub async fn generate(
        &self,
        difficulty: Difficulty,
        category: Option<String>,
    ) -> Result<Vec<Question>, GenerationError> {
        ensure_can_generate(self.account.as_ref())?;

        let mut questions = self
            .questions
            .generate(difficulty, category.as_deref(), self.count)
            .await?;
        // The session filter matches on the exact label that was asked for.
        if let Some(label) = category.as_deref().filter(|c| *c != ALL_CATEGORIES) {
            for question in &mut questions {
                question.category = label.to_string();
            }
        }
        self.account.consume_credit()?;
        info!(count = questions.len(), %difficulty, "generated questions");

        match &self.images {
            Some(images) => Ok(attach_image_hints(images.as_ref(), questions).await),
            None => Ok(questions),
        }
    }
}

/// Requests one hint per question concurrently. A failed hint leaves that
/// question without an image.
pub async fn attach_image_hints(
    images: &dyn ImageHintGenerator,
    questions: Vec<Question>,
) -> Vec<Question> {
    let prompts: Vec<String> = questions.iter().map(parse::hint_prompt).collect();
    let hints = join_all(prompts.iter().map(|prompt| images.generate_hint(prompt))).await;

    questions
        .into_iter()
        .zip(hints)
        .enumerate()
        .map(|(index, (mut question, hint))| {
            match hint {
                Ok(image) => question.image = Some(image),
                Err(e) => warn!(index, error = %e, "image hint failed, continuing without"),
            }
            question
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::account::{AccountSettings, LocalAccount};
    use crate::data::StaticQuestions;
    use crate::game::GameController;
    use crate::models::sample;
    use crate::storage::MemoryStore;

    struct FixedQuestions {
        calls: AtomicUsize,
        fail_with_rate_limit: bool,
    }

    #[async_trait]
    impl QuestionGenerator for FixedQuestions {
        async fn generate(
            &self,
            difficulty: Difficulty,
            category: Option<&str>,
            count: usize,
        ) -> Result<Vec<Question>, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_with_rate_limit {
                return Err(GenerationError::RateLimited { retry_after: None });
            }
            let category = category.unwrap_or("Mixed");
            Ok((0..count)
                .map(|i| sample(&format!("generated {i}"), category, difficulty, i % 4))
                .collect())
        }
    }

    /// Fails for every other prompt.
    struct FlakyImages {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageHintGenerator for FlakyImages {
        async fn generate_hint(&self, _prompt: &str) -> Result<String, GenerationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 {
                Ok(format!("https://img.example/{n}.png"))
            } else {
                Err(GenerationError::Malformed("no image".to_string()))
            }
        }
    }

    fn account(credits: u32) -> Arc<LocalAccount> {
        Arc::new(LocalAccount::new(AccountSettings {
            user: Some("sam".to_string()),
            credits: Some(credits),
            ..AccountSettings::default()
        }))
    }

    fn generator(fail: bool) -> Arc<FixedQuestions> {
        Arc::new(FixedQuestions {
            calls: AtomicUsize::new(0),
            fail_with_rate_limit: fail,
        })
    }

    #[tokio::test]
    async fn test_generate_spends_credit() {
        let account = account(2);
        let factory = QuestionFactory::new(generator(false), None, account.clone(), 4);

        let questions = factory
            .generate(Difficulty::Medium, Some("Geography".to_string()))
            .await
            .unwrap();
        assert_eq!(questions.len(), 4);
        assert!(questions.iter().all(|q| q.category == "Geography"));
        assert_eq!(account.credits_remaining(), Some(1));
    }

    #[tokio::test]
    async fn test_no_credits_skips_request() {
        let generator = generator(false);
        let factory = QuestionFactory::new(generator.clone(), None, account(0), 4);

        let err = factory.generate(Difficulty::Easy, None).await.unwrap_err();
        assert!(matches!(err, GenerationError::InsufficientCredits));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_request_keeps_credit() {
        let account = account(1);
        let factory = QuestionFactory::new(generator(true), None, account.clone(), 4);

        let err = factory.generate(Difficulty::Easy, None).await.unwrap_err();
        assert!(matches!(err, GenerationError::RateLimited { .. }));
        assert_eq!(account.credits_remaining(), Some(1));
    }

    #[tokio::test]
    async fn test_image_failures_are_swallowed() {
        let images = Arc::new(FlakyImages {
            calls: AtomicUsize::new(0),
        });
        let factory = QuestionFactory::new(generator(false), Some(images), account(1), 4);

        let questions = factory.generate(Difficulty::Hard, None).await.unwrap();
        assert_eq!(questions.len(), 4);
        let with_image = questions.iter().filter(|q| q.image.is_some()).count();
        assert_eq!(with_image, 2);
    }

    /// Labels its questions with near-miss variants of the requested category.
    struct LooseLabels;

    #[async_trait]
    impl QuestionGenerator for LooseLabels {
        async fn generate(
            &self,
            difficulty: Difficulty,
            _category: Option<&str>,
            _count: usize,
        ) -> Result<Vec<Question>, GenerationError> {
            Ok(vec![
                sample("capital of Peru", "World Geography", difficulty, 0),
                sample("longest river", "geography", difficulty, 2),
            ])
        }
    }

    #[tokio::test]
    async fn test_generated_set_for_a_category_starts_a_game() {
        let factory = QuestionFactory::new(Arc::new(LooseLabels), None, account(1), 2);
        let questions = factory
            .generate(Difficulty::Easy, Some("Geography".to_string()))
            .await
            .unwrap();
        assert!(questions.iter().all(|q| q.category == "Geography"));

        let mut controller = GameController::with_seed(
            Arc::new(StaticQuestions(vec![sample("q", "Geography", Difficulty::Easy, 0)])),
            Arc::new(MemoryStore::new()),
            4,
        );
        controller.select_difficulty(Difficulty::Easy).unwrap();
        controller.select_category("Geography").unwrap();
        let ticket = controller.begin_generation();

        controller.start_with_questions(ticket, questions).unwrap();
        assert_eq!(controller.state().total_questions(), 2);
    }

    #[tokio::test]
    async fn test_all_categories_keeps_generated_labels() {
        let factory = QuestionFactory::new(Arc::new(LooseLabels), None, account(1), 2);
        let questions = factory
            .generate(Difficulty::Easy, Some(ALL_CATEGORIES.to_string()))
            .await
            .unwrap();
        assert_eq!(questions[0].category, "World Geography");
    }

    #[test]
    fn test_config_defaults_disable_generation() {
        let config = GeneratorConfig::default();
        assert!(!config.is_usable());
        assert_eq!(config.question_count, DEFAULT_QUESTION_COUNT);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }
}
