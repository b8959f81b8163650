//! Application state: configuration, transcript source, question pipeline and sessions.
//!
//! This module owns:
//!   - the parent's quiz settings and reward policy
//!   - the transcript fetcher (config-backed, TTL cached)
//!   - the optional question pipeline (absent without HF_API_TOKEN)
//!   - the per-session quiz state, each behind its own lock

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{AppError, ConfigError};
use crate::hf::{HfClient, ModelInvoker};
use crate::pipeline::QuestionPipeline;
use crate::quiz::Session;
use crate::transcript::{CachedFetcher, ConfigTranscriptFetcher, TranscriptFetcher};
use crate::util::extract_video_id;

pub type SessionHandle = Arc<Mutex<Session>>;

/// A live session and the last time a request reached it.
struct SessionSlot {
    handle: SessionHandle,
    touched: Instant,
}

pub struct AppState {
    pub config: AppConfig,
    /// `None` when the configured URL has no recognizable video id.
    pub video_id: Option<String>,
    pub fetcher: Arc<dyn TranscriptFetcher>,
    pub pipeline: Option<QuestionPipeline>,
    sessions: RwLock<HashMap<String, SessionSlot>>,
    session_idle: Duration,
    max_sessions: usize,
}

impl AppState {
    /// Build state from config + env: transcript source, HF client, caches.
    #[instrument(level = "info", skip_all)]
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        let invoker = HfClient::from_env(&config.generation)
            .map_err(|e| {
                error!(target: "watchlearn", error = %e, "Failed to initialize question generation");
                e
            })?
            .map(|hf| {
                info!(target: "watchlearn", model_url = %hf.model_url, max_new_tokens = hf.max_new_tokens, temperature = hf.temperature, "Question generation enabled.");
                Arc::new(hf) as Arc<dyn ModelInvoker>
            });
        if invoker.is_none() {
            warn!(target: "watchlearn", "HF_API_TOKEN not set; quizzes cannot be generated.");
        }
        let fetcher = Arc::new(ConfigTranscriptFetcher::new(&config.videos));
        Ok(Self::with_parts(config, fetcher, invoker))
    }

    /// Assemble state from explicit collaborators. Caching wraps both with the configured TTLs.
    pub fn with_parts(
        config: AppConfig,
        fetcher: Arc<dyn TranscriptFetcher>,
        invoker: Option<Arc<dyn ModelInvoker>>,
    ) -> Self {
        let cache = &config.cache;
        let fetcher: Arc<dyn TranscriptFetcher> = Arc::new(CachedFetcher::new(
            fetcher,
            Duration::from_secs(cache.transcript_ttl_secs),
            cache.max_entries,
        ));
        let pipeline = invoker.map(|inv| {
            QuestionPipeline::new(inv, config.prompts.clone(), config.generation.clone())
                .with_cache(Duration::from_secs(cache.questions_ttl_secs), cache.max_entries)
        });

        let session_idle = Duration::from_secs(cache.session_idle_secs);
        let max_sessions = cache.max_sessions.max(1);

        let video_id = extract_video_id(&config.quiz.youtube_url);
        match &video_id {
            Some(id) => info!(target: "watchlearn", video_id = %id, key_concept = %config.quiz.key_concept, "Quiz video configured"),
            None => warn!(target: "watchlearn", url = %config.quiz.youtube_url, "Configured YouTube URL has no video id"),
        }

        Self {
            config,
            video_id,
            fetcher,
            pipeline,
            sessions: RwLock::new(HashMap::new()),
            session_idle,
            max_sessions,
        }
    }

    /// Video id of today's challenge, or the user-correctable input error.
    pub fn require_video_id(&self) -> Result<&str, AppError> {
        self.video_id
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("The YouTube URL set by your parent is invalid.".into()))
    }

    /// Register a fresh idle session and return its id. Idle sessions past their
    /// lifetime are dropped first, then the least recently used one if still full.
    #[instrument(level = "debug", skip(self))]
    pub async fn create_session(&self) -> (String, SessionHandle) {
        let id = Uuid::new_v4().to_string();
        let handle = SessionHandle::default();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        let idle = self.session_idle;
        sessions.retain(|_, slot| slot.touched.elapsed() < idle);
        if sessions.len() >= self.max_sessions {
            let oldest = sessions.iter().min_by_key(|(_, slot)| slot.touched).map(|(k, _)| k.clone());
            if let Some(k) = oldest {
                sessions.remove(&k);
            }
        }
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(target: "quiz", evicted, "Dropped stale sessions");
        }

        sessions.insert(id.clone(), SessionSlot { handle: handle.clone(), touched: Instant::now() });
        info!(target: "quiz", session_id = %id, live = sessions.len(), "Session created");
        (id, handle)
    }

    /// Look up a session and mark it as recently used.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_session(&self, id: &str) -> Result<SessionHandle, AppError> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(id)
            .filter(|slot| slot.touched.elapsed() < self.session_idle)
            .ok_or_else(|| AppError::UnknownSession(id.to_string()))?;
        slot.touched = Instant::now();
        Ok(slot.handle.clone())
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
