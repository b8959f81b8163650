//! Small utility helpers used across modules.

use std::sync::OnceLock;

use regex::Regex;

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// Values are inserted in one pass, so braces inside a value are never re-expanded.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  'outer: while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open..];
    for (k, v) in pairs {
      let needle = format!("{{{}}}", k);
      if after.starts_with(&needle) {
        out.push_str(v);
        rest = &after[needle.len()..];
        continue 'outer;
      }
    }
    out.push('{');
    rest = &after[1..];
  }
  out.push_str(rest);
  out
}

/// First `max_chars` characters of `s` (never splits a UTF-8 sequence).
pub fn take_chars(s: &str, max_chars: usize) -> &str {
  match s.char_indices().nth(max_chars) {
    Some((byte_idx, _)) => &s[..byte_idx],
    None => s,
  }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  let head = take_chars(s, max);
  if head.len() == s.len() { s.to_string() } else { format!("{}… ({} bytes total)", head, s.len()) }
}

fn video_id_patterns() -> &'static [Regex; 2] {
  static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
  PATTERNS.get_or_init(|| {
    [
      Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("static regex"),
      Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})").expect("static regex"),
    ]
  })
}

/// Extract the 11-character YouTube video id from the common URL shapes
/// (`watch?v=ID`, `youtu.be/ID`, `/embed/ID`, `/shorts/ID`).
pub fn extract_video_id(url: &str) -> Option<String> {
  video_id_patterns()
    .iter()
    .find_map(|re| re.captures(url))
    .map(|c| c[1].to_string())
}
