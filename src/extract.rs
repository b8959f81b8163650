//! Recovering a validated question list from free-form model output.
//!
//! Models are told to answer with a bare JSON array but often wrap it in commentary.
//! We take everything from the first `[` to the last `]`, parse it, and then hold the
//! result to the question schema. A batch is accepted whole or not at all.

use serde_json::Value;

use crate::domain::{Question, QuestionSet, MAX_QUESTIONS};
use crate::error::GenerationError;

/// Key every block must carry; its presence on the first block marks the expected schema.
const SENTINEL_KEY: &str = "secondary_question";

/// Locate and parse the outermost bracketed JSON array in `text`.
pub fn extract_json_array(text: &str) -> Result<Value, GenerationError> {
  let malformed = || GenerationError::MalformedOutput { raw: text.to_string() };
  let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
    return Err(malformed());
  };
  if end <= start {
    return Err(malformed());
  }
  serde_json::from_str(&text[start..=end]).map_err(|_| malformed())
}

/// Check the parsed value against the question schema and keep at most `limit` questions.
pub fn validate_questions(value: Value, raw: &str, limit: usize) -> Result<QuestionSet, GenerationError> {
  let mismatch = |detail: String| GenerationError::SchemaMismatch { raw: raw.to_string(), detail };

  let Value::Array(items) = value else {
    return Err(mismatch("not a list".into()));
  };
  let has_sentinel = items.first().and_then(Value::as_object).is_some_and(|o| o.contains_key(SENTINEL_KEY));
  if !has_sentinel {
    let detail = if items.is_empty() { "empty list".to_string() } else { format!("first block has no '{}'", SENTINEL_KEY) };
    return Err(mismatch(detail));
  }

  let questions = items
    .into_iter()
    .take(limit.clamp(1, MAX_QUESTIONS))
    .enumerate()
    .map(|(i, item)| serde_json::from_value::<Question>(item).map_err(|e| mismatch(format!("question {}: {}", i + 1, e))))
    .collect::<Result<Vec<_>, _>>()?;

  QuestionSet::new(questions).map_err(mismatch)
}

/// Extract and validate in one go.
pub fn parse_questions(raw: &str, limit: usize) -> Result<QuestionSet, GenerationError> {
  let value = extract_json_array(raw)?;
  validate_questions(value, raw, limit)
}
