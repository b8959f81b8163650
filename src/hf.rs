//! Minimal Hugging Face inference client for question generation.
//!
//! One POST per call, no retries: the caller decides whether to try again.
//! Calls are instrumented and log model URL, latency and response size (not contents).
//!
//! NOTE: We never log the API token.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::config::GenerationSettings;
use crate::error::{ConfigError, GenerationError};

pub const DEFAULT_MODEL_URL: &str =
  "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.2";

/// Anything that turns a prompt into raw generated text.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
  async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Clone)]
pub struct HfClient {
  pub client: reqwest::Client,
  pub api_token: String,
  pub model_url: String,
  pub max_new_tokens: u32,
  pub temperature: f32,
}

impl HfClient {
  /// Construct the client if we find HF_API_TOKEN; `Ok(None)` without it.
  pub fn from_env(settings: &GenerationSettings) -> Result<Option<Self>, ConfigError> {
    let Some(api_token) = std::env::var("HF_API_TOKEN").ok().filter(|t| !t.trim().is_empty()) else {
      return Ok(None);
    };
    let model_url = std::env::var("HF_MODEL_URL").unwrap_or_else(|_| DEFAULT_MODEL_URL.into());
    Self::new(api_token, model_url, settings).map(Some)
  }

  pub fn new(api_token: String, model_url: String, settings: &GenerationSettings) -> Result<Self, ConfigError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(settings.timeout_secs))
      .build()
      .map_err(ConfigError::HttpClient)?;

    Ok(Self {
      client,
      api_token,
      model_url,
      max_new_tokens: settings.max_new_tokens,
      temperature: settings.temperature,
    })
  }
}

#[async_trait]
impl ModelInvoker for HfClient {
  #[instrument(level = "info", skip(self, prompt), fields(model_url = %self.model_url, prompt_len = prompt.len()))]
  async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
    let req = InferenceRequest {
      inputs: prompt,
      parameters: InferenceParameters {
        max_new_tokens: self.max_new_tokens,
        temperature: self.temperature,
        return_full_text: false,
      },
    };

    let start = Instant::now();
    let res = self.client.post(&self.model_url)
      .header(USER_AGENT, "watchlearn-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_token))
      .json(&req).send().await
      .map_err(|e| {
        error!(elapsed = ?start.elapsed(), error = %e, "Model request failed");
        GenerationError::Transport(e.to_string())
      })?;

    let status = res.status();
    let body = res.text().await.map_err(|e| GenerationError::Transport(e.to_string()))?;
    let elapsed = start.elapsed();

    if status != reqwest::StatusCode::OK {
      let msg = extract_hf_error(&body).unwrap_or_else(|| crate::util::trunc_for_log(&body, 200));
      warn!(?elapsed, status = status.as_u16(), error = %msg, "Model returned non-success status");
      return Err(GenerationError::NonSuccessStatus { status: status.as_u16(), body });
    }

    let text = parse_generated_text(&body)?;
    info!(?elapsed, body_len = body.len(), text_len = text.len(), "Model response received");
    Ok(text)
  }
}

// --- Inference DTOs ---

#[derive(Serialize)]
struct InferenceRequest<'a> {
  inputs: &'a str,
  parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
  max_new_tokens: u32,
  temperature: f32,
  return_full_text: bool,
}

/// Pull `generated_text` out of a successful body: either `[{"generated_text": ..}]` or
/// `{"generated_text": ..}`. A missing field yields empty text, which later fails extraction.
pub fn parse_generated_text(body: &str) -> Result<String, GenerationError> {
  let value: Value = serde_json::from_str(body).map_err(|_| GenerationError::UnknownResponseFormat)?;
  let obj = match &value {
    Value::Array(items) => items.first().ok_or(GenerationError::UnknownResponseFormat)?,
    Value::Object(_) => &value,
    _ => return Err(GenerationError::UnknownResponseFormat),
  };
  Ok(obj.get("generated_text").and_then(Value::as_str).unwrap_or_default().to_string())
}

/// Try to extract a clean error message from a Hugging Face error body.
fn extract_hf_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn request_body_shape() {
    let req = InferenceRequest {
      inputs: "prompt",
      parameters: InferenceParameters { max_new_tokens: 2048, temperature: 0.5, return_full_text: false },
    };
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(
      v,
      serde_json::json!({
        "inputs": "prompt",
        "parameters": { "max_new_tokens": 2048, "temperature": 0.5, "return_full_text": false }
      })
    );
  }

  #[test]
  fn generated_text_from_list_or_object() {
    assert_eq!(parse_generated_text(r#"[{"generated_text":"[1]"}]"#).unwrap(), "[1]");
    assert_eq!(parse_generated_text(r#"{"generated_text":"hi"}"#).unwrap(), "hi");
    assert_eq!(parse_generated_text(r#"{"other":1}"#).unwrap(), "");
  }

  #[test]
  fn unknown_shapes_are_rejected() {
    for body in ["\"text\"", "[]", "42", "not json"] {
      assert!(matches!(parse_generated_text(body), Err(GenerationError::UnknownResponseFormat)), "{body}");
    }
  }

  #[test]
  fn hf_error_message_is_extracted() {
    assert_eq!(
      extract_hf_error(r#"{"error":"Model is currently loading","estimated_time":20.0}"#).as_deref(),
      Some("Model is currently loading")
    );
    assert_eq!(extract_hf_error("<html>"), None);
  }

  #[test]
  fn client_build_failure_is_not_reported_as_missing_token() {
    let source = reqwest::Client::builder().user_agent("bad\nagent").build().unwrap_err();
    let err = crate::error::AppError::from(ConfigError::HttpClient(source));
    let msg = err.to_string();
    assert!(msg.contains("HTTP client"), "{msg}");
    assert!(!msg.contains("HF_API_TOKEN"), "{msg}");
  }

  #[tokio::test]
  async fn unreachable_endpoint_is_a_transport_error() {
    let settings = GenerationSettings { timeout_secs: 2, ..GenerationSettings::default() };
    let client = HfClient::new("token".into(), "http://127.0.0.1:9/models/none".into(), &settings).unwrap();
    let err = client.generate("prompt").await.unwrap_err();
    assert!(matches!(err, GenerationError::Transport(_)), "{err:?}");
  }
}
