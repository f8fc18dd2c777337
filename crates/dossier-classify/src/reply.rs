//! Defensive parsing of the classifier's reply text.
//!
//! The service is asked for a JSON array of `{department, probability}` but
//! nothing enforces it. Replies routinely arrive wrapped in Markdown code
//! fences, with probabilities as numbers, numeric strings or percentages.
//! Anything that does not fit is "no classification", never an error.

use serde_json::Value;

/// One ranked department from a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
  pub department:  String,
  /// Normalised to `0.0..=1.0` where the input allowed it.
  pub probability: f64,
}

/// Parse the reply into its candidates, in reply order.
///
/// Returns `None` if the text is not JSON, not an array, or any entry lacks a
/// non-empty string `department`.
pub fn parse_candidates(reply: &str) -> Option<Vec<Candidate>> {
  let body = strip_fences(reply);
  let value: Value = serde_json::from_str(body).ok()?;
  let entries = value.as_array()?;
  if entries.is_empty() {
    return None;
  }
  entries.iter().map(candidate).collect()
}

/// The department of the first entry. The service lists its best guess
/// first; the reply is unusable when that entry is malformed.
pub fn top_label(reply: &str) -> Option<String> {
  let body = strip_fences(reply);
  let value: Value = serde_json::from_str(body).ok()?;
  let first = value.as_array()?.first()?;
  candidate(first).map(|c| c.department)
}

fn candidate(entry: &Value) -> Option<Candidate> {
  let department = entry.get("department")?.as_str()?.trim();
  if department.is_empty() {
    return None;
  }
  let probability = entry
    .get("probability")
    .and_then(probability)
    .unwrap_or(0.0);
  Some(Candidate { department: department.to_owned(), probability })
}

/// Strip surrounding whitespace, backticks and an optional `json` language
/// tag after an opening fence.
fn strip_fences(reply: &str) -> &str {
  let mut body = reply.trim();
  if let Some(rest) = body.strip_prefix("```") {
    body = rest;
    let tag_len = body
      .find(|c: char| !c.is_ascii_alphabetic())
      .unwrap_or(body.len());
    if body[..tag_len].eq_ignore_ascii_case("json") {
      body = &body[tag_len..];
    }
  }
  body.trim_matches(|c: char| c == '`' || c.is_whitespace())
}

/// Accepts `0.8`, `"0.8"`, `80`, `"80%"`. Values above 1 are read as
/// percentages.
fn probability(value: &Value) -> Option<f64> {
  let raw = match value {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => {
      let s = s.trim();
      let (digits, percent) = match s.strip_suffix('%') {
        Some(d) => (d.trim(), true),
        None => (s, false),
      };
      let n: f64 = digits.parse().ok()?;
      if percent { n / 100.0 } else { n }
    }
    _ => return None,
  };
  if !raw.is_finite() || raw < 0.0 {
    return None;
  }
  Some(if raw > 1.0 { raw / 100.0 } else { raw })
}
