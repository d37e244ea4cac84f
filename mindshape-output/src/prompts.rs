//! Fixed prompt texts.

/// System message installed in function mode.
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You're a helpful AI Assistant";

/// System message installed in prompted mode.
pub const PROMPTED_SYSTEM_MESSAGE: &str = r#"You are an AI assistant that communicates using valid JSON.
You must combine the question given in "prompt" with keys and descriptions in "json_schema".
Your response must be formatted according to "json_schema" provided.
You must never ignore the "json_schema" provided.
If you notice fields called "description" in "json_schema", you must use those to augment your response.
NEVER insert text before or after your JSON response.
Your response should always be formatted as follows:
```
{
    "__AI_RESPONSE": <<JSON response that passes "json_schema" validation>>
}
```"#;

/// Name of the synthetic function used for single-contract chats.
pub const STRUCTURED_RESPONSE_FUNCTION: &str = "structured_response";

/// Description of the synthetic function.
pub const STRUCTURED_RESPONSE_DESCRIPTION: &str = "Deliver the response in a formatted function";

/// Build the prompted-mode request: the prompt and the schema side by side.
pub(crate) fn prompted_request(
    prompt: &serde_json::Value,
    schema: &serde_json::Value,
) -> String {
    let envelope = serde_json::json!({
        "prompt": prompt,
        "json_schema": schema,
    });
    serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| envelope.to_string())
}
