//! Question-generation prompt assembly.

use crate::config::Prompts;
use crate::util::{fill_template, take_chars};

/// Build the instruction sent to the model. Only the first `char_budget` characters of the
/// transcript are included; the key concept is inserted verbatim.
pub fn build_question_prompt(
  prompts: &Prompts,
  transcript: &str,
  key_concept: &str,
  char_budget: usize,
  question_count: usize,
) -> String {
  let count = question_count.to_string();
  fill_template(
    &prompts.question_template,
    &[
      ("transcript", take_chars(transcript, char_budget)),
      ("key_concept", key_concept),
      ("question_count", &count),
    ],
  )
}
