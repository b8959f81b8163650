//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, State}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::protocol::*;
use crate::quiz::QuizEvent;
use crate::state::AppState;
use crate::logic::*;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, generation_enabled: state.pipeline.is_some() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_challenge(State(state): State<Arc<AppState>>) -> Result<Json<ChallengeOut>, AppError> {
  let challenge = describe_challenge(&state).await?;
  info!(target: "quiz", video_id = %challenge.video_id, title = %challenge.title, "HTTP challenge served");
  Ok(Json(challenge))
}

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let (session_id, session) = state.create_session().await;
  let view = current_view(&state, &session).await;
  Json(SessionOut { session_id, view })
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, AppError> {
  let session = state.get_session(&id).await?;
  let view = current_view(&state, &session).await;
  Ok(Json(SessionOut { session_id: id, view }))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_start(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, AppError> {
  let session = state.get_session(&id).await?;
  let view = start_quiz(&state, &session).await?;
  info!(target: "quiz", session_id = %id, "HTTP quiz started");
  Ok(Json(SessionOut { session_id: id, view }))
}

#[instrument(level = "info", skip(state, body), fields(%id, option_len = body.option.len()))]
pub async fn http_select_primary(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<OptionIn>,
) -> Result<Json<SessionOut>, AppError> {
  submit(&state, id, QuizEvent::SelectPrimary(body.option)).await
}

#[instrument(level = "info", skip(state, body), fields(%id, option_len = body.option.len()))]
pub async fn http_select_secondary(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<OptionIn>,
) -> Result<Json<SessionOut>, AppError> {
  submit(&state, id, QuizEvent::SelectSecondary(body.option)).await
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_advance(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, AppError> {
  submit(&state, id, QuizEvent::Advance).await
}

async fn submit(state: &AppState, id: String, event: QuizEvent) -> Result<Json<SessionOut>, AppError> {
  let session = state.get_session(&id).await?;
  let view = apply_event(state, &session, event).await?;
  Ok(Json(SessionOut { session_id: id, view }))
}
