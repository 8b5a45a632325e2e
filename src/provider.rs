//! Text-completion provider: the seam between quiz logic and the model.
//!
//! `CompletionProvider` takes one prompt string and returns the raw text blob.
//! `OpenAI` talks to any OpenAI-compatible chat.completions endpoint.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::ProviderSettings;
use crate::error::QuizError;

pub trait CompletionProvider: Send + Sync {
  /// Short label for logs.
  fn name(&self) -> &str;

  /// Send `prompt` as a single user message and return the reply text untouched.
  fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, QuizError>>;
}

/// Stand-in used when no API key is configured; every call fails as a provider error.
pub struct Unconfigured;

impl CompletionProvider for Unconfigured {
  fn name(&self) -> &str {
    "unconfigured"
  }

  fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, QuizError>> {
    Box::pin(async { Err(QuizError::Provider("OPENAI_API_KEY is not set".into())) })
  }
}

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub temperature: f32,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env(settings: &ProviderSettings) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| settings.base_url.clone());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| settings.model.clone());

    let client = match reqwest::Client::builder()
      .timeout(Duration::from_secs(settings.timeout_secs))
      .build()
    {
      Ok(c) => c,
      Err(e) => {
        error!(target: "quizgen", error = %e, "Failed to build HTTP client for provider");
        return None;
      }
    };

    Some(Self { client, api_key, base_url, model, temperature: settings.temperature })
  }

  /// Plain-text chat completion with a single user message.
  #[instrument(level = "info", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
  async fn chat_plain(&self, prompt: &str) -> Result<String, QuizError> {
    let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![ChatMessageReq { role: "user".into(), content: prompt.into() }],
      temperature: self.temperature,
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "quizgen-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| QuizError::Provider(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(QuizError::Provider(format!("OpenAI HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse = res.json().await
      .map_err(|e| QuizError::Provider(format!("unreadable completion body: {e}")))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .unwrap_or_default();
    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Completion received");

    Ok(text)
  }
}

impl CompletionProvider for OpenAI {
  fn name(&self) -> &str {
    &self.model
  }

  fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, QuizError>> {
    Box::pin(self.chat_plain(prompt))
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
