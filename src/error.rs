//! Error types for configuration, transcript fetching, question generation and quiz input.
//!
//! `AppError` is what HTTP and WebSocket handlers see; it maps each failure class to a status.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

use crate::quiz::Stage;

/// Problems with the process configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("the quiz is missing its AI key (HF_API_TOKEN is not set)")]
  MissingApiToken,
  #[error("failed to read config file {path}: {source}")]
  Read { path: String, source: std::io::Error },
  #[error("failed to parse config file {path}: {source}")]
  Parse { path: String, source: toml::de::Error },
  #[error("invalid value in config file {path}: {detail}")]
  Invalid { path: String, detail: String },
  #[error("failed to build the HTTP client for question generation: {0}")]
  HttpClient(#[source] reqwest::Error),
}

/// Failures of the transcript/metadata source.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FetchError {
  #[error("Transcripts are disabled for this video.")]
  TranscriptsDisabled,
  #[error("No transcript is available for video {0}.")]
  NotFound(String),
  #[error("Failed to get transcript: {0}")]
  Other(String),
}

/// Failures of a single question generation attempt. Nothing here is retried automatically.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
  #[error("AI generation failed: {0}")]
  Transport(String),
  #[error("AI generation failed: {status} - {body}")]
  NonSuccessStatus { status: u16, body: String },
  #[error("AI returned an unknown response format.")]
  UnknownResponseFormat,
  #[error("AI generated an invalid question format. The model might be loading. Please try again in a moment.")]
  MalformedOutput { raw: String },
  #[error("AI generated an invalid question format ({detail}). The model might be loading. Please try again in a moment.")]
  SchemaMismatch { raw: String, detail: String },
}

impl GenerationError {
  /// Raw model text kept for diagnostics, when the failure happened after the model answered.
  pub fn raw_output(&self) -> Option<&str> {
    match self {
      GenerationError::MalformedOutput { raw } | GenerationError::SchemaMismatch { raw, .. } => Some(raw),
      _ => None,
    }
  }
}

/// A learner event the current quiz state cannot accept. The state is left untouched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputRejected {
  #[error("Please select one of the offered answers ('{0}' is not one of them).")]
  UnknownOption(String),
  #[error("{event} is not accepted at the {stage} stage.")]
  WrongStage { event: &'static str, stage: Stage },
  #[error("The quiz has not started yet.")]
  NotStarted,
  #[error("A quiz is already in progress.")]
  InProgress,
}

/// Everything a request handler can fail with.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error("{0}")]
  InvalidInput(String),
  #[error(transparent)]
  Fetch(#[from] FetchError),
  #[error(transparent)]
  Generation(#[from] GenerationError),
  #[error("Unknown session: {0}")]
  UnknownSession(String),
  #[error(transparent)]
  Rejected(#[from] InputRejected),
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
      AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
      AppError::Fetch(FetchError::NotFound(_)) => StatusCode::NOT_FOUND,
      AppError::Fetch(_) => StatusCode::BAD_GATEWAY,
      AppError::Generation(_) => StatusCode::BAD_GATEWAY,
      AppError::UnknownSession(_) => StatusCode::NOT_FOUND,
      AppError::Rejected(_) => StatusCode::CONFLICT,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
  }
}
