//! Lenient JSON extraction from model text.
//!
//! Prompted replies are supposed to be bare JSON but routinely arrive inside
//! markdown fences, after a sentence of prose, or wrapped in the
//! [`RESPONSE_ENVELOPE_KEY`] envelope the prompt asks for.

use mindshape_core::Problem;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Key of the envelope object prompted replies are asked to use.
pub const RESPONSE_ENVELOPE_KEY: &str = "__AI_RESPONSE";

/// Why a reply could not be read as JSON.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Nothing that looks like JSON was found.
    #[error("No JSON object or array found in output")]
    NoJsonFound,

    /// The candidate text is not valid JSON.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParseError {
    /// Convert into a parse problem carrying the raw text.
    pub fn into_problem(self, raw: &str) -> Problem {
        Problem::parse(self.to_string(), raw)
    }
}

/// Extract JSON from text that might contain markdown or prose.
///
/// ```rust
/// use mindshape_output::parser::extract_json_from_text;
///
/// let text = "Sure! ```json\n{\"age\": 30}\n```";
/// assert_eq!(extract_json_from_text(text).unwrap(), "{\"age\": 30}");
/// ```
pub fn extract_json_from_text(text: &str) -> Result<String, ParseError> {
    let text = text.trim();

    if serde_json::from_str::<JsonValue>(text).is_ok() {
        return Ok(text.to_string());
    }
    if let Some(json) = extract_from_fence(text) {
        return Ok(json);
    }
    if let Some(json) = find_balanced(text, '{', '}') {
        return Ok(json);
    }
    if let Some(json) = find_balanced(text, '[', ']') {
        return Ok(json);
    }

    Err(ParseError::NoJsonFound)
}

/// Contents of the first fenced block (```json or plain ```) holding JSON.
fn extract_from_fence(text: &str) -> Option<String> {
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let header = after[..body_start].trim();
        let body = &after[body_start..];
        let close = body.find("```")?;
        let content = body[..close].trim();
        let header_ok = header.is_empty() || header.eq_ignore_ascii_case("json");
        if header_ok && serde_json::from_str::<JsonValue>(content).is_ok() {
            return Some(content.to_string());
        }
        // A fence with a language tag on the same line as the JSON.
        if !header_ok {
            if let Some(json) = find_balanced(&after[..body_start + close], '{', '}') {
                return Some(json);
            }
        }
        rest = &body[close + 3..];
    }
    None
}

/// Find the first balanced `open`..`close` span that parses as JSON.
///
/// A span that does not parse (`{name}` in prose) is skipped and the scan
/// resumes at the next `open`.
fn find_balanced(text: &str, open: char, close: char) -> Option<String> {
    text.match_indices(open)
        .filter_map(|(start, _)| balanced_span(&text[start..], open, close))
        .find(|candidate| serde_json::from_str::<JsonValue>(candidate).is_ok())
        .map(str::to_string)
}

/// The balanced span at the start of `text`, which begins with `open`.
fn balanced_span(text: &str, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[..i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove the response envelope, if present.
#[must_use]
pub fn unwrap_envelope(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(mut map) if map.contains_key(RESPONSE_ENVELOPE_KEY) => map
            .remove(RESPONSE_ENVELOPE_KEY)
            .unwrap_or(JsonValue::Null),
        other => other,
    }
}

/// Read a prompted reply: extract, parse, unwrap.
pub fn parse_reply(text: &str) -> Result<JsonValue, ParseError> {
    let json = extract_json_from_text(text)?;
    let value: JsonValue = serde_json::from_str(&json)?;
    Ok(unwrap_envelope(value))
}

/// Parse function call arguments strictly.
pub fn parse_arguments(arguments: &str) -> Result<JsonValue, ParseError> {
    Ok(serde_json::from_str(arguments)?)
}
