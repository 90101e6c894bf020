//! Minimal OpenAI client for example-sentence generation.
//!
//! We only call chat.completions with a strict JSON object response.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key and keep payload previews short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::Prompts;
use crate::domain::WordEntry;
use crate::error::EnrichmentError;
use crate::util::{fill_template, trunc_for_log};

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
}

#[derive(Deserialize)]
struct SentenceOut {
  #[serde(default)]
  sentence: Option<String>,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model })
  }

  /// JSON-object chat completion. Generic over the target type T.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_json<T: for<'a> Deserialize<'a>>(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<T, EnrichmentError> {
    let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
      max_tokens: Some(120),
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "vocab-quiz-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      return Err(EnrichmentError::Status { status, message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default();
    debug!(response_len = text.len(), preview = %trunc_for_log(&text, 80), "OpenAI JSON response");

    Ok(serde_json::from_str::<T>(&text)?)
  }

  /// One short, kid-friendly example sentence for `word`. Blank output is `None`.
  #[instrument(
    level = "info",
    skip(self, prompts, word),
    fields(word = %word.surface_form, model = %self.fast_model)
  )]
  pub async fn example_sentence(
    &self,
    prompts: &Prompts,
    word: &WordEntry,
  ) -> Result<Option<String>, EnrichmentError> {
    let user = sentence_prompt(prompts, word);
    let start = std::time::Instant::now();
    let result = self
      .chat_json::<SentenceOut>(&self.fast_model, &prompts.sentence_system, &user, prompts.sentence_temperature)
      .await;
    let elapsed = start.elapsed();

    match result {
      Ok(out) => {
        let sentence = out.sentence.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        info!(?elapsed, has_sentence = sentence.is_some(), "Example sentence response received");
        Ok(sentence)
      }
      Err(e) => {
        warn!(?elapsed, error = %e, "Model call failed during sentence generation");
        Err(e)
      }
    }
  }
}

fn sentence_prompt(prompts: &Prompts, word: &WordEntry) -> String {
  fill_template(
    &prompts.sentence_user_template,
    &[
      ("word", word.surface_form.as_str()),
      ("pos", word.grammatical_category.as_str()),
      ("translation", word.translation.as_str()),
    ],
  )
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

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
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
