//! Transcript and title lookup for a video id.
//!
//! `ConfigTranscriptFetcher` serves the `[[videos]]` entries of the quiz config.
//! `CachedFetcher` wraps any fetcher with a TTL cache of successful lookups.

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::cache::TtlCache;
use crate::config::VideoCfg;
use crate::domain::VideoDetails;
use crate::error::FetchError;

pub const UNTITLED_VIDEO: &str = "Untitled YouTube Video";

#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
  async fn fetch(&self, video_id: &str) -> Result<VideoDetails, FetchError>;
}

enum Source {
  Inline(String),
  File(PathBuf),
  Disabled,
}

struct Entry {
  id: String,
  title: String,
  source: Source,
}

/// Transcripts declared in configuration (inline text or a file on disk).
pub struct ConfigTranscriptFetcher {
  entries: Vec<Entry>,
}

impl ConfigTranscriptFetcher {
  pub fn new(videos: &[VideoCfg]) -> Self {
    let entries = videos
      .iter()
      .map(|v| {
        let source = if v.transcripts_disabled {
          Source::Disabled
        } else if let Some(t) = &v.transcript {
          Source::Inline(t.clone())
        } else if let Some(p) = &v.transcript_path {
          Source::File(p.clone())
        } else {
          warn!(target: "watchlearn", id = %v.id, "Video entry has no transcript; treating it as disabled");
          Source::Disabled
        };
        let title = v.title.clone().filter(|t| !t.trim().is_empty()).unwrap_or_else(|| UNTITLED_VIDEO.into());
        Entry { id: v.id.clone(), title, source }
      })
      .collect();
    Self { entries }
  }
}

#[async_trait]
impl TranscriptFetcher for ConfigTranscriptFetcher {
  #[instrument(level = "info", skip(self), fields(%video_id))]
  async fn fetch(&self, video_id: &str) -> Result<VideoDetails, FetchError> {
    let entry = self
      .entries
      .iter()
      .find(|e| e.id == video_id)
      .ok_or_else(|| FetchError::NotFound(video_id.to_string()))?;

    let raw = match &entry.source {
      Source::Disabled => return Err(FetchError::TranscriptsDisabled),
      Source::Inline(t) => t.clone(),
      Source::File(path) => tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FetchError::Other(format!("{}: {}", path.display(), e)))?,
    };

    // Caption files are one line per cue; the prompt wants one running text.
    let transcript = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    debug!(target: "watchlearn", transcript_len = transcript.len(), "Transcript loaded");
    Ok(VideoDetails { transcript, title: entry.title.clone() })
  }
}

/// Caches successful lookups; failures always reach the inner fetcher again.
pub struct CachedFetcher {
  inner: Arc<dyn TranscriptFetcher>,
  cache: TtlCache<String, VideoDetails>,
}

impl CachedFetcher {
  pub fn new(inner: Arc<dyn TranscriptFetcher>, ttl: Duration, max_entries: usize) -> Self {
    Self { inner, cache: TtlCache::new(ttl, max_entries) }
  }
}

#[async_trait]
impl TranscriptFetcher for CachedFetcher {
  async fn fetch(&self, video_id: &str) -> Result<VideoDetails, FetchError> {
    let key = video_id.to_string();
    if let Some(hit) = self.cache.get(&key).await {
      debug!(target: "watchlearn", %video_id, "Transcript cache hit");
      return Ok(hit);
    }
    let details = self.inner.fetch(video_id).await?;
    self.cache.insert(key, details.clone()).await;
    Ok(details)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn video(id: &str) -> VideoCfg {
    VideoCfg { id: id.into(), title: None, transcript: None, transcript_path: None, transcripts_disabled: false }
  }

  #[tokio::test]
  async fn inline_transcript_is_joined_and_titled() {
    let f = ConfigTranscriptFetcher::new(&[VideoCfg {
      title: Some("Circuits".into()),
      transcript: Some("water  flows\nthrough pipes".into()),
      ..video("abc")
    }]);
    let d = f.fetch("abc").await.unwrap();
    assert_eq!(d.transcript, "water flows through pipes");
    assert_eq!(d.title, "Circuits");
  }

  #[tokio::test]
  async fn missing_title_falls_back() {
    let f = ConfigTranscriptFetcher::new(&[VideoCfg { transcript: Some("t".into()), ..video("abc") }]);
    assert_eq!(f.fetch("abc").await.unwrap().title, UNTITLED_VIDEO);
  }

  #[tokio::test]
  async fn disabled_unknown_and_unreadable() {
    let f = ConfigTranscriptFetcher::new(&[
      VideoCfg { transcripts_disabled: true, transcript: Some("t".into()), ..video("off") },
      VideoCfg { transcript_path: Some("/definitely/not/here.txt".into()), ..video("file") },
    ]);
    assert_eq!(f.fetch("off").await.unwrap_err(), FetchError::TranscriptsDisabled);
    assert_eq!(f.fetch("nope").await.unwrap_err(), FetchError::NotFound("nope".into()));
    assert!(matches!(f.fetch("file").await.unwrap_err(), FetchError::Other(_)));
  }

  struct Counting {
    calls: AtomicUsize,
    fail: bool,
  }

  #[async_trait]
  impl TranscriptFetcher for Counting {
    async fn fetch(&self, _video_id: &str) -> Result<VideoDetails, FetchError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.fail {
        Err(FetchError::Other("boom".into()))
      } else {
        Ok(VideoDetails { transcript: "t".into(), title: "T".into() })
      }
    }
  }

  #[tokio::test]
  async fn cache_serves_repeat_successes_only() {
    let ok = Arc::new(Counting { calls: AtomicUsize::new(0), fail: false });
    let cached = CachedFetcher::new(ok.clone(), Duration::from_secs(60), 8);
    cached.fetch("a").await.unwrap();
    cached.fetch("a").await.unwrap();
    assert_eq!(ok.calls.load(Ordering::SeqCst), 1);

    let bad = Arc::new(Counting { calls: AtomicUsize::new(0), fail: true });
    let cached = CachedFetcher::new(bad.clone(), Duration::from_secs(60), 8);
    assert!(cached.fetch("a").await.is_err());
    assert!(cached.fetch("a").await.is_err());
    assert_eq!(bad.calls.load(Ordering::SeqCst), 2);
  }
}
