//! Bounded oracle calls and answer extraction.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::ports::{FinishReason, LanguageOracle, OracleError, OracleRequest};

/// Sends `request` to the oracle, giving up after `window`.
///
/// `window` bounds the whole call, retries included. Answers the model
/// did not finish are returned as errors.
pub async fn consult(
    oracle: &dyn LanguageOracle,
    request: OracleRequest,
    window: Duration,
) -> Result<String, OracleError> {
    let purpose = request.purpose;
    let response = match tokio::time::timeout(window, oracle.complete(request)).await {
        Ok(result) => result?,
        Err(_) => return Err(OracleError::timeout(window)),
    };

    debug!(
        ?purpose,
        model = %response.model,
        prompt_tokens = response.usage.prompt_tokens,
        completion_tokens = response.usage.completion_tokens,
        total_tokens = response.usage.total_tokens,
        finish_reason = ?response.finish_reason,
        "Oracle answered"
    );

    match response.finish_reason {
        FinishReason::Stop => Ok(response.content),
        FinishReason::Length => Err(OracleError::Truncated),
        FinishReason::ContentFilter => Err(OracleError::content_filtered("answer withheld")),
    }
}

/// Extracts the JSON object from an oracle answer, tolerating markdown
/// code fences and surrounding prose.
pub fn extract_json(content: &str) -> Option<Value> {
    let cleaned = content.trim();
    let cleaned = cleaned.strip_prefix("```json").unwrap_or(cleaned);
    let cleaned = cleaned.strip_prefix("```").unwrap_or(cleaned);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return value.is_object().then_some(value);
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&cleaned[start..=end])
        .ok()
        .filter(Value::is_object)
}
