//! Loading quiz configuration (parent settings, generation knobs, reward policy,
//! prompt template and transcript sources) from TOML.
//!
//! Every section is optional; missing values fall back to the defaults below.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::reward::RewardPolicy;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub quiz: QuizSettings,
  #[serde(default)]
  pub generation: GenerationSettings,
  #[serde(default)]
  pub reward: RewardPolicy,
  #[serde(default)]
  pub cache: CacheSettings,
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub videos: Vec<VideoCfg>,
}

/// What the parent picked: the video, the concept to focus on, and who is playing.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
  pub youtube_url: String,
  pub key_concept: String,
  pub child_name: String,
}

impl Default for QuizSettings {
  fn default() -> Self {
    Self {
      youtube_url: "https://www.youtube.com/watch?v=X_crwFuPht4".into(),
      key_concept: "The Hydraulic Analogy (water vs. electricity)".into(),
      child_name: "My Son".into(),
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
  pub max_new_tokens: u32,
  pub temperature: f32,
  pub timeout_secs: u64,
  /// Characters of transcript included in the prompt.
  pub transcript_char_budget: usize,
  /// Questions requested from the model and the most accepted from one response.
  pub question_count: usize,
}

impl Default for GenerationSettings {
  fn default() -> Self {
    Self {
      max_new_tokens: 2048,
      temperature: 0.7,
      timeout_secs: 60,
      transcript_char_budget: 3000,
      question_count: crate::domain::MAX_QUESTIONS,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
  pub transcript_ttl_secs: u64,
  pub questions_ttl_secs: u64,
  pub max_entries: usize,
  /// Sessions untouched for this long are dropped.
  pub session_idle_secs: u64,
  /// Upper bound on live sessions; the least recently used one goes first.
  pub max_sessions: usize,
}

impl Default for CacheSettings {
  fn default() -> Self {
    Self {
      transcript_ttl_secs: 3600,
      questions_ttl_secs: 600,
      max_entries: 64,
      session_idle_secs: 1800,
      max_sessions: 1024,
    }
  }
}

/// Transcript source entry. Either `transcript` (inline) or `transcript_path` should be set.
#[derive(Clone, Debug, Deserialize)]
pub struct VideoCfg {
  pub id: String,
  #[serde(default)] pub title: Option<String>,
  #[serde(default)] pub transcript: Option<String>,
  #[serde(default)] pub transcript_path: Option<PathBuf>,
  #[serde(default)] pub transcripts_disabled: bool,
}

/// Prompt used for question generation. Placeholders: `{transcript}`, `{key_concept}`,
/// `{question_count}`. Override it in TOML to tune tone or structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub question_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self { question_template: DEFAULT_QUESTION_TEMPLATE.into() }
  }
}

const DEFAULT_QUESTION_TEMPLATE: &str = r#"[INST] You are an expert educator. Your goal is to create a {question_count}-question quiz that tests for *comprehension*.
You will be given a video transcript and a "Key Concept."
Your quiz must focus *only* on the Key Concept.
You MUST respond with *only* a single, valid JSON list of {question_count} question blocks. Do not add any text before or after the list.

RULES FOR EACH BLOCK:
1.  **"question"**: The primary multiple-choice question about the Key Concept.
2.  **"options"**: 4 potential answers.
3.  **"answer"**: The *exact text* of the correct option.
4.  **"explanation"**: A 1-2 sentence explanation of *why* the answer is correct.
5.  **"secondary_question"**: A *follow-up* True/False question if the user gets the first one wrong.
6.  **"secondary_options"**: ["True", "False"].
7.  **"secondary_answer"**: The *exact text* of the correct secondary option.
8.  **"secondary_explanation"**: A brief explanation for the secondary question's answer.

EXAMPLE JSON FORMAT:
[
  {
    "question": "Based on the hydraulic analogy, what does 'Voltage' represent?",
    "options": ["The speed of the water", "The height of the water", "The width of the pipe", "The water temperature"],
    "answer": "The height of the water",
    "explanation": "Voltage is a 'potential,' like gravitational potential.",
    "secondary_question": "True or False: In this analogy, a wider pipe would mean *less* resistance.",
    "secondary_options": ["True", "False"],
    "secondary_answer": "True",
    "secondary_explanation": "A wider pipe allows more water to flow easily (lower resistance)."
  }
]

Now, generate the {question_count} questions based on this transcript and concept.
TRANSCRIPT: "{transcript}..."
KEY CONCEPT: "{key_concept}"
[/INST]
"#;

/// Parse a TOML document into `AppConfig`.
pub fn parse_config(path: &str, text: &str) -> Result<AppConfig, ConfigError> {
  let cfg = toml::from_str::<AppConfig>(text).map_err(|source| ConfigError::Parse { path: path.to_string(), source })?;
  cfg.reward.validate().map_err(|detail| ConfigError::Invalid { path: path.to_string(), detail })?;
  Ok(cfg)
}

/// Load `AppConfig` from QUIZ_CONFIG_PATH. Without the variable, defaults are used;
/// an unreadable or invalid file is an error.
pub fn load_config_from_env() -> Result<AppConfig, ConfigError> {
  let Ok(path) = std::env::var("QUIZ_CONFIG_PATH") else {
    info!(target: "watchlearn", "QUIZ_CONFIG_PATH not set; using built-in defaults");
    return Ok(AppConfig::default());
  };
  let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path: path.clone(), source })?;
  let cfg = parse_config(&path, &text)?;
  info!(target: "watchlearn", %path, videos = cfg.videos.len(), "Loaded quiz config (TOML)");
  Ok(cfg)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_document_yields_defaults() {
    let cfg = parse_config("inline", "").unwrap();
    assert_eq!(cfg.generation.max_new_tokens, 2048);
    assert_eq!(cfg.generation.transcript_char_budget, 3000);
    assert_eq!(cfg.reward.perfect_units, 30);
    assert_eq!(cfg.cache.questions_ttl_secs, 600);
    assert_eq!(cfg.cache.max_sessions, 1024);
    assert!(cfg.prompts.question_template.contains("{transcript}"));
    assert!(cfg.videos.is_empty());
  }

  #[test]
  fn partial_sections_keep_other_defaults() {
    let cfg = parse_config(
      "inline",
      r#"
        [quiz]
        key_concept = "Ohm's law"

        [generation]
        temperature = 0.3

        [reward]
        pass_score = 7.0

        [[videos]]
        id = "X_crwFuPht4"
        title = "Electricity explained"
        transcript = "Water flows through pipes..."
      "#,
    )
    .unwrap();
    assert_eq!(cfg.quiz.key_concept, "Ohm's law");
    assert_eq!(cfg.quiz.child_name, "My Son");
    assert_eq!(cfg.generation.temperature, 0.3);
    assert_eq!(cfg.generation.timeout_secs, 60);
    assert_eq!(cfg.reward.pass_score, 7.0);
    assert_eq!(cfg.reward.pass_units, 20);
    assert_eq!(cfg.videos[0].title.as_deref(), Some("Electricity explained"));
    assert!(!cfg.videos[0].transcripts_disabled);
  }

  #[test]
  fn negative_pass_score_is_rejected() {
    let err = parse_config("quiz.toml", "[reward]\npass_score = -1.0").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "{err:?}");
    assert!(err.to_string().contains("pass_score"));
  }

  #[test]
  fn invalid_toml_is_a_parse_error() {
    let err = parse_config("bad.toml", "[quiz\nkey_concept = 1").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("bad.toml"));
  }
}
