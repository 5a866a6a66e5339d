use serde::de::DeserializeOwned;

use crate::error::ValidationParseError;

/// Decode a JSON object from model output that may be wrapped in code fences
/// or surrounded by prose.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, ValidationParseError> {
    let cleaned = strip_code_fences(text);

    serde_json::from_str::<T>(cleaned).or_else(|first_error| {
        let start = cleaned.find('{');
        let end = cleaned.rfind('}');
        match (start, end) {
            (Some(start), Some(end)) if start < end => {
                serde_json::from_str::<T>(&cleaned[start..=end])
                    .map_err(|error| ValidationParseError(error.to_string()))
            }
            _ => Err(ValidationParseError(first_error.to_string())),
        }
    })
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    let body = rest
        .split_once('\n')
        .map_or(rest, |(first_line, tail)| {
            if first_line.trim().chars().all(char::is_alphanumeric) {
                tail
            } else {
                rest
            }
        });
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
