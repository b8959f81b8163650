//! Question generation: prompt → model → extracted, validated `QuestionSet`.

use std::{sync::Arc, time::Duration};

use tracing::{error, info, instrument};

use crate::cache::TtlCache;
use crate::config::{GenerationSettings, Prompts};
use crate::domain::QuestionSet;
use crate::error::GenerationError;
use crate::extract::parse_questions;
use crate::hf::ModelInvoker;
use crate::prompt::build_question_prompt;
use crate::util::trunc_for_log;

pub struct QuestionPipeline {
  invoker: Arc<dyn ModelInvoker>,
  prompts: Prompts,
  settings: GenerationSettings,
  cache: Option<TtlCache<(String, String), QuestionSet>>,
}

impl QuestionPipeline {
  pub fn new(invoker: Arc<dyn ModelInvoker>, prompts: Prompts, settings: GenerationSettings) -> Self {
    Self { invoker, prompts, settings, cache: None }
  }

  /// Reuse accepted question sets for the same transcript and concept within `ttl`.
  pub fn with_cache(mut self, ttl: Duration, max_entries: usize) -> Self {
    self.cache = Some(TtlCache::new(ttl, max_entries));
    self
  }

  #[instrument(
    level = "info",
    skip(self, transcript, key_concept),
    fields(transcript_len = transcript.len(), %key_concept)
  )]
  pub async fn generate(&self, transcript: &str, key_concept: &str) -> Result<QuestionSet, GenerationError> {
    let key = (transcript.to_string(), key_concept.to_string());
    if let Some(cache) = &self.cache {
      if let Some(hit) = cache.get(&key).await {
        info!(target: "quiz", questions = hit.len(), "Question set served from cache");
        return Ok(hit);
      }
    }

    let prompt = build_question_prompt(
      &self.prompts,
      transcript,
      key_concept,
      self.settings.transcript_char_budget,
      self.settings.question_count,
    );
    let raw = self.invoker.generate(&prompt).await?;

    let set = parse_questions(&raw, self.settings.question_count).map_err(|e| {
      error!(target: "quiz", error = %e, raw = %trunc_for_log(e.raw_output().unwrap_or_default(), 500), "Failed to parse questions from model output");
      e
    })?;
    info!(target: "quiz", questions = set.len(), "Question set generated");

    if let Some(cache) = &self.cache {
      cache.insert(key, set.clone()).await;
    }
    Ok(set)
  }
}
