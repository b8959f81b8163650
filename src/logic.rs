//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Describing today's challenge (video, title, key concept)
//!   - Starting a quiz attempt (fetch transcript, generate questions, install them)
//!   - Applying learner events and rendering the resulting view

use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::error::{AppError, ConfigError};
use crate::protocol::{to_view, ChallengeOut, QuizView};
use crate::quiz::{QuizEvent, Session, Stage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn describe_challenge(state: &AppState) -> Result<ChallengeOut, AppError> {
  let video_id = state.require_video_id()?;
  let details = state.fetcher.fetch(video_id).await?;
  Ok(ChallengeOut {
    video_id: video_id.to_string(),
    video_url: state.config.quiz.youtube_url.clone(),
    title: details.title,
    key_concept: state.config.quiz.key_concept.clone(),
    child_name: state.config.quiz.child_name.clone(),
  })
}

/// Start a new attempt. Nothing is installed unless every step succeeds, so a failed start
/// leaves the session exactly as it was. The session lock is not held across the model call.
#[instrument(level = "info", skip(state, session))]
pub async fn start_quiz(state: &AppState, session: &Mutex<Session>) -> Result<QuizView, AppError> {
  if !session.lock().await.can_start() {
    return Err(crate::error::InputRejected::InProgress.into());
  }

  let pipeline = state.pipeline.as_ref().ok_or(ConfigError::MissingApiToken)?;
  let video_id = state.require_video_id()?;
  let details = state.fetcher.fetch(video_id).await.map_err(|e| {
    warn!(target: "quiz", %video_id, error = %e, "Transcript fetch failed");
    e
  })?;

  let questions = pipeline
    .generate(&details.transcript, &state.config.quiz.key_concept)
    .await
    .map_err(|e| {
      warn!(target: "quiz", %video_id, error = %e, "Question generation failed");
      e
    })?;

  let mut guard = session.lock().await;
  guard.begin(questions)?;
  info!(target: "quiz", %video_id, "Quiz started");
  Ok(to_view(&guard, &state.config.reward))
}

#[instrument(level = "info", skip(state, session))]
pub async fn apply_event(state: &AppState, session: &Mutex<Session>, event: QuizEvent) -> Result<QuizView, AppError> {
  let mut guard = session.lock().await;
  let quiz = guard.apply(&event)?;
  info!(target: "quiz", index = quiz.index, stage = %quiz.stage, score = %quiz.score, "Quiz event applied");
  if quiz.stage == Stage::Finished {
    let reward = state.config.reward.resolve(quiz.score, quiz.index + 1);
    info!(target: "quiz", score = %quiz.score, reward_units = reward.units(), "Quiz finished");
  }
  Ok(to_view(&guard, &state.config.reward))
}

pub async fn current_view(state: &AppState, session: &Mutex<Session>) -> QuizView {
  to_view(&*session.lock().await, &state.config.reward)
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::config::{AppConfig, VideoCfg};
  use crate::error::{FetchError, GenerationError, InputRejected};
  use crate::hf::ModelInvoker;
  use crate::pipeline::tests::{valid_reply, ScriptedModel};
  use crate::transcript::ConfigTranscriptFetcher;
  use std::sync::{atomic::Ordering, Arc};

  pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.videos = vec![VideoCfg {
      id: "X_crwFuPht4".into(),
      title: Some("Electricity explained".into()),
      transcript: Some("Voltage is like water pressure.".into()),
      transcript_path: None,
      transcripts_disabled: false,
    }];
    cfg
  }

  pub fn test_state(model: Option<Arc<ScriptedModel>>, cfg: AppConfig) -> AppState {
    let fetcher = Arc::new(ConfigTranscriptFetcher::new(&cfg.videos));
    AppState::with_parts(cfg, fetcher, model.map(|m| m as Arc<dyn ModelInvoker>))
  }

  #[tokio::test]
  async fn challenge_is_described_from_config_and_transcript() {
    let state = test_state(None, test_config());
    let c = describe_challenge(&state).await.unwrap();
    assert_eq!(c.video_id, "X_crwFuPht4");
    assert_eq!(c.title, "Electricity explained");
    assert_eq!(c.key_concept, "The Hydraulic Analogy (water vs. electricity)");
  }

  #[tokio::test]
  async fn start_without_token_is_config_error() {
    let state = test_state(None, test_config());
    let session = Mutex::new(Session::Idle);
    let err = start_quiz(&state, &session).await.unwrap_err();
    assert!(matches!(err, AppError::Config(ConfigError::MissingApiToken)));
    assert!(matches!(*session.lock().await, Session::Idle));
  }

  #[tokio::test]
  async fn start_with_bad_url_is_invalid_input() {
    let mut cfg = test_config();
    cfg.quiz.youtube_url = "https://example.com".into();
    let state = test_state(Some(ScriptedModel::always_valid(10)), cfg);
    let session = Mutex::new(Session::Idle);
    assert!(matches!(start_quiz(&state, &session).await, Err(AppError::InvalidInput(_))));
  }

  #[tokio::test]
  async fn start_with_disabled_transcript_is_fetch_error() {
    let mut cfg = test_config();
    cfg.videos[0].transcripts_disabled = true;
    let model = ScriptedModel::always_valid(10);
    let state = test_state(Some(model.clone()), cfg);
    let session = Mutex::new(Session::Idle);
    let err = start_quiz(&state, &session).await.unwrap_err();
    assert!(matches!(err, AppError::Fetch(FetchError::TranscriptsDisabled)));
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn failed_generation_leaves_session_idle_and_retry_works() {
    let model = ScriptedModel::new(vec![Ok("model is warming up".into()), Ok(valid_reply(10))]);
    let state = test_state(Some(model), test_config());
    let session = Mutex::new(Session::Idle);

    let err = start_quiz(&state, &session).await.unwrap_err();
    assert!(matches!(err, AppError::Generation(GenerationError::MalformedOutput { .. })));
    assert!(matches!(*session.lock().await, Session::Idle));

    let view = start_quiz(&state, &session).await.unwrap();
    assert!(matches!(view, QuizView::Primary { .. }));
  }

  #[tokio::test]
  async fn full_run_through_events() {
    let state = test_state(Some(ScriptedModel::always_valid(10)), test_config());
    let session = Mutex::new(Session::Idle);
    start_quiz(&state, &session).await.unwrap();

    let err = start_quiz(&state, &session).await.unwrap_err();
    assert!(matches!(err, AppError::Rejected(InputRejected::InProgress)));

    let mut view = current_view(&state, &session).await;
    assert!(matches!(view, QuizView::Primary { .. }));
    for i in 0..10 {
      view = apply_event(&state, &session, QuizEvent::SelectPrimary(format!("A{i}"))).await.unwrap();
      assert!(matches!(view, QuizView::Advance { primary_correct: true, .. }));
      view = apply_event(&state, &session, QuizEvent::Advance).await.unwrap();
    }
    match view {
      QuizView::Finished { reward, total, .. } => {
        assert_eq!(total, 10);
        assert_eq!(reward.units(), 30);
      }
      other => panic!("unexpected {other:?}"),
    }

    // finished attempts can be retaken
    assert!(matches!(start_quiz(&state, &session).await.unwrap(), QuizView::Primary { .. }));
  }

  #[tokio::test]
  async fn rejected_event_keeps_state() {
    let state = test_state(Some(ScriptedModel::always_valid(10)), test_config());
    let session = Mutex::new(Session::Idle);
    let before = start_quiz(&state, &session).await.unwrap();
    let err = apply_event(&state, &session, QuizEvent::SelectPrimary("Z9".into())).await.unwrap_err();
    assert!(matches!(err, AppError::Rejected(InputRejected::UnknownOption(_))));
    assert_eq!(current_view(&state, &session).await, before);
  }
}
