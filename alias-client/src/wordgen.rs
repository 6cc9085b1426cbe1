use alias_core::{GENERATION_BATCH_SIZE, generation_prompt, parse_generated_words};
use alias_types::{Difficulty, Language};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ClientConfig;

/// Source of a fresh word batch for a game that asked for generated words.
#[async_trait]
pub trait WordGenerator: Send + Sync {
    async fn generate(
        &self,
        language: Language,
        difficulty: Difficulty,
    ) -> Result<Vec<String>, WordGenError>;
}

#[derive(Debug, thiserror::Error)]
pub enum WordGenError {
    #[error("No API key configured for word generation")]
    MissingApiKey,
    #[error("Word generation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Word generation service returned status {0}")]
    Status(u16),
    #[error("Word generation response had no text")]
    MalformedResponse,
    #[error("Word generation returned no usable words")]
    Empty,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

/// Generates words with Google's Gemini `generateContent` endpoint.
pub struct GeminiWordGenerator {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiWordGenerator {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, WordGenError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, WordGenError> {
        Self::new(
            config.gemini_api_key.clone(),
            &config.gemini_model,
            &config.gemini_base_url,
            config.wordgen_timeout(),
        )
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        )
    }
}

#[async_trait]
impl WordGenerator for GeminiWordGenerator {
    async fn generate(
        &self,
        language: Language,
        difficulty: Difficulty,
    ) -> Result<Vec<String>, WordGenError> {
        let api_key = self.api_key.as_deref().ok_or(WordGenError::MissingApiKey)?;

        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![TextPart {
                    text: Some(generation_prompt(
                        language,
                        difficulty,
                        GENERATION_BATCH_SIZE,
                    )),
                }],
            }],
        };

        tracing::debug!(
            "Requesting {} words for {}/{} from {}",
            GENERATION_BATCH_SIZE,
            language,
            difficulty,
            self.model
        );

        let response = self
            .client
            .post(self.endpoint(api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Word generation request failed: {:?}", e);
                WordGenError::Request(e)
            })?;

        if !response.status().is_success() {
            tracing::warn!("Word generation returned status: {}", response.status());
            return Err(WordGenError::Status(response.status().as_u16()));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse word generation response: {:?}", e);
            WordGenError::MalformedResponse
        })?;

        let text = body.text().ok_or(WordGenError::MalformedResponse)?;
        let words = parse_generated_words(&text);
        if words.is_empty() {
            return Err(WordGenError::Empty);
        }

        tracing::info!("Generated {} words", words.len());
        Ok(words)
    }
}
