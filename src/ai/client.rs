use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;
use crate::models::{Difficulty, Question};

use super::parse::{parse_generated, question_prompt};
use super::{GeneratorConfig, ImageHintGenerator, QuestionGenerator};

/// Client for an OpenAI-compatible API.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    config: GeneratorConfig,
}

impl OpenAiClient {
    /// Every request made by this client gives up after `config.timeout()`.
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<T: Serialize>(&self, path: &str, payload: &T) -> Result<Response, GenerationError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .bearer_auth(&self.config.api_key)
            .json(payload)
            .send()
            .await?;
        check_status(response)
    }
}

#[async_trait]
impl QuestionGenerator for OpenAiClient {
    async fn generate(
        &self,
        difficulty: Difficulty,
        category: Option<&str>,
        count: usize,
    ) -> Result<Vec<Question>, GenerationError> {
        let payload = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: question_prompt(difficulty, category, count),
            }],
            temperature: 0.7,
        };
        debug!(model = %self.config.model, %difficulty, count, "requesting questions");

        let body: ChatResponse = self.post("chat/completions", &payload).await?.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Malformed("empty reply".to_string()))?;

        parse_generated(&content, difficulty)
    }
}

#[async_trait]
impl ImageHintGenerator for OpenAiClient {
    async fn generate_hint(&self, prompt: &str) -> Result<String, GenerationError> {
        let payload = ImageRequest {
            model: self.config.image_model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: "256x256",
        };

        let body: ImageResponse = self.post("images/generations", &payload).await?.json().await?;
        body.data
            .into_iter()
            .next()
            .and_then(|image| {
                image
                    .url
                    .or_else(|| image.b64_json.map(|b64| format!("data:image/png;base64,{b64}")))
            })
            .ok_or_else(|| GenerationError::Malformed("no image in reply".to_string()))
    }
}

fn check_status(response: Response) -> Result<Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);
    Err(classify_status(status, retry_after))
}

pub(crate) fn classify_status(status: StatusCode, retry_after: Option<Duration>) -> GenerationError {
    match status {
        StatusCode::PAYMENT_REQUIRED => GenerationError::InsufficientCredits,
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited { retry_after },
        other => GenerationError::HttpStatus(other),
    }
}

fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    model: String,
    prompt: String,
    n: u8,
    size: &'static str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
    b64_json: Option<String>,
}
