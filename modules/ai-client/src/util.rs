use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code blocks from a response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parse a JSON model response, tolerating code fences around the payload.
pub fn parse_json_response<T: DeserializeOwned>(response: &str) -> Result<T> {
    let cleaned = strip_code_blocks(response);
    serde_json::from_str(cleaned).context("Failed to parse JSON from model response")
}
