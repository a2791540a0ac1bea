use serde_json::Value;

use crate::error::ConfiguratorError;

/// How much of the raw completion gets quoted in an extraction error.
const ERROR_EXCERPT_CHARS: usize = 200;

/// Recover a single JSON value from loosely structured completion text.
///
/// The model is told to return bare JSON, but completions routinely arrive
/// wrapped in prose or markdown fences. The candidate is the slice from the
/// first '{' to the last '}' (the whole text when no such pair exists),
/// with any code-fence markers removed. This is a greedy textual scan, not
/// a tokenizer: prose that itself contains braces can widen the slice, and
/// JSON parsing is the final arbiter of whether the candidate is usable.
pub fn extract_json(completion: &str) -> Result<Value, ConfiguratorError> {
    let candidate = match (completion.find('{'), completion.rfind('}')) {
        (Some(start), Some(end)) if end > start => &completion[start..=end],
        _ => completion,
    };

    let cleaned = candidate.replace("```json", "").replace("```", "");

    serde_json::from_str(cleaned.trim()).map_err(|_| {
        ConfiguratorError::Extraction(completion.chars().take(ERROR_EXCERPT_CHARS).collect())
    })
}
