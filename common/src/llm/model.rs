use crate::config::GeneratorConfig;
use crate::error::{Result, SqlGenError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// anything that turns a prompt into free text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// name of the backing model, for logs
    fn model_name(&self) -> &str;

    /// one attempt, no retries
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }

    /// concatenated text of all parts
    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// text of the first candidate, if it has any
    pub fn first_text(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(Content::text)
            .filter(|t| !t.trim().is_empty())
    }
}

/// client for the gemini `generateContent` rest endpoint
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeneratorConfig,
}

impl GeminiClient {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        tracing::info!(
            model = %config.model,
            api_base = %config.api_base,
            "generator client initialized"
        );

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    #[tracing::instrument(skip(self, prompt), fields(llm.model = %self.config.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                SqlGenError::Config("GOOGLE_API_KEY is not set".to_string())
            })?;

        let request = GenerateContentRequest {
            contents: vec![Content::user(prompt)],
        };

        let response = self
            .http
            .post(self.config.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let truncated: String = body.chars().take(200).collect();
            return Err(SqlGenError::Model(format!(
                "generator returned http {}: {}",
                status, truncated
            )));
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text = payload.first_text().ok_or_else(|| {
            let reason = payload
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".to_string());
            SqlGenError::Model(format!("model returned no text ({})", reason))
        })?;

        tracing::debug!("generated {} chars", text.len());
        Ok(text)
    }
}
