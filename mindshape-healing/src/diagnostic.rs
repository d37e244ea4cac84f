//! Prompts sent to the model after a failed attempt.
//!
//! The diagnostic strategy asks the model to explain its mistakes inside the
//! conversation before retrying. The incognito strategy sends a one-shot
//! recovery request outside the conversation instead.

use mindshape_core::{Problem, ProblemKind};
use serde_json::Value as JsonValue;
use std::fmt::Write;

/// Sent after the diagnostic exchange to re-run the structured call.
pub const RETRY_PROMPT: &str = "Try again using the corrected values.";

const INSTRUCTIONS: &str = "Before answering again:
(a) Describe each error in your own words.
(b) Explain where the data and the schema disagree and how to reconcile them.
(c) Give at least two corrected example values for every failing field.
(d) Propose a plan for producing a response that passes validation.";

/// System message for one-shot incognito recovery.
pub const RECOVERY_SYSTEM_MESSAGE: &str = r#"You repair data so that it matches a JSON schema.
The user sends DATA, the ERROR it produced and the JSON SCHEMA it must satisfy.
Reply with JSON only, with no text before or after it.
The JSON you return must validate against the JSON SCHEMA.

Example:

DATA:
The answer is 42, as everyone knows.

ERROR:
model answered with text instead of calling a function

JSON SCHEMA:
{
  "type": "object",
  "properties": {"answer": {"type": "number"}},
  "required": ["answer"]
}

RESPONSE:
{"answer": 42}"#;

/// Build the diagnostic prompt for a problem.
///
/// Validation problems list every failing field with its path, value and
/// message. Parse and shape problems quote the unusable reply instead. The
/// schema, when known, is included so the model can compare against it.
#[must_use]
pub fn diagnostic_prompt(problem: &Problem, schema: Option<&JsonValue>) -> String {
    let mut prompt = String::new();

    match problem.kind {
        ProblemKind::Validation if !problem.detail.is_empty() => {
            prompt.push_str(
                "Your previous response did not satisfy the required JSON schema.\n\nValidation errors:\n",
            );
            write_field_errors(&mut prompt, problem);
        }
        _ => {
            let _ = writeln!(
                prompt,
                "Your previous response could not be used: {}.",
                problem.message
            );
            if let Some(raw) = &problem.raw {
                let _ = write!(prompt, "\nResponse received:\n{}\n", raw);
            }
        }
    }

    if let Some(schema) = schema {
        let _ = write!(prompt, "\nJSON schema:\n{}\n", pretty(schema));
    }

    prompt.push('\n');
    prompt.push_str(INSTRUCTIONS);
    prompt
}

/// Build the one-shot recovery prompt for a problem.
///
/// Pair it with [`RECOVERY_SYSTEM_MESSAGE`]. The reply is expected to be the
/// repaired JSON and nothing else.
#[must_use]
pub fn recovery_prompt(problem: &Problem, schema: Option<&JsonValue>) -> String {
    let mut prompt = String::from("DATA:\n");
    match &problem.raw {
        Some(raw) => {
            let _ = writeln!(prompt, "{}", raw);
        }
        None => prompt.push_str("(none)\n"),
    }

    prompt.push_str("\nERROR:\n");
    if problem.detail.is_empty() {
        let _ = writeln!(prompt, "{}", problem.message);
    } else {
        write_field_errors(&mut prompt, problem);
    }

    if let Some(schema) = schema {
        let _ = write!(prompt, "\nJSON SCHEMA:\n{}\n", pretty(schema));
    }

    prompt.push_str("\nRESPONSE:");
    prompt
}

fn write_field_errors(prompt: &mut String, problem: &Problem) {
    for (i, field) in problem.detail.iter().enumerate() {
        let _ = write!(
            prompt,
            "{}. Path: {}\n   Value: {}\n   Error: {}\n",
            i + 1,
            field.display_path(),
            field.value,
            field.message
        );
    }
}

fn pretty(schema: &JsonValue) -> String {
    serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindshape_core::FieldError;
    use serde_json::json;

    fn email_problem() -> Problem {
        Problem::validation(
            vec![
                FieldError::new("/customers/0/email", json!("nope"), "\"nope\" is not a \"email\""),
                FieldError::new("", json!({}), "\"customers\" is a required property"),
            ],
            json!({}),
        )
    }

    #[test]
    fn test_validation_prompt_lists_fields() {
        let prompt = diagnostic_prompt(&email_problem(), None);

        assert!(prompt.contains("1. Path: /customers/0/email"));
        assert!(prompt.contains("Value: \"nope\""));
        assert!(prompt.contains("2. Path: /\n"));
        assert!(prompt.contains("\"customers\" is a required property"));
        assert!(prompt.contains("at least two corrected example values"));
        assert!(prompt.contains("(d) Propose a plan"));
        assert!(!prompt.contains("JSON schema:"));
    }

    #[test]
    fn test_diagnostic_prompt_includes_schema() {
        let schema = json!({
            "type": "object",
            "properties": {"email": {"type": "string", "description": "Contact address"}}
        });
        let prompt = diagnostic_prompt(&email_problem(), Some(&schema));

        assert!(prompt.contains("JSON schema:\n{\n"));
        assert!(prompt.contains("\"description\": \"Contact address\""));
        let schema_at = prompt.find("JSON schema:").unwrap();
        assert!(schema_at < prompt.find("Before answering again").unwrap());
    }

    #[test]
    fn test_parse_prompt_quotes_raw() {
        let problem = Problem::parse("Failed to parse JSON: EOF", "{\"a\": ");
        let prompt = diagnostic_prompt(&problem, None);

        assert!(prompt.contains("could not be used: Failed to parse JSON: EOF."));
        assert!(prompt.contains("Response received:\n{\"a\": "));
        assert!(prompt.contains("(a) Describe each error"));
    }

    #[test]
    fn test_recovery_prompt_sections() {
        let schema = json!({"type": "object", "properties": {"answer": {"type": "number"}}});
        let problem = Problem::shape_mismatch("model answered with text", "It is 42.");
        let prompt = recovery_prompt(&problem, Some(&schema));

        assert!(prompt.starts_with("DATA:\nIt is 42.\n"));
        assert!(prompt.contains("\nERROR:\nmodel answered with text\n"));
        assert!(prompt.contains("\nJSON SCHEMA:\n{\n"));
        assert!(prompt.ends_with("RESPONSE:"));
    }

    #[test]
    fn test_recovery_prompt_lists_fields() {
        let prompt = recovery_prompt(&email_problem(), None);

        assert!(prompt.starts_with("DATA:\n{}\n"));
        assert!(prompt.contains("1. Path: /customers/0/email"));
        assert!(!prompt.contains("JSON SCHEMA:"));
    }
}
