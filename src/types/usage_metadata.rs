use serde::{Deserialize, Serialize};

/// Token accounting reported with a response.
///
/// Streamed responses repeat the running totals on every event; the last
/// event's metadata describes the whole turn.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt, history included.
    #[serde(default)]
    pub prompt_token_count: u32,

    /// Tokens across all generated candidates.
    #[serde(default)]
    pub candidates_token_count: u32,

    /// Prompt plus candidates (plus reasoning, for thinking models).
    #[serde(default)]
    pub total_token_count: u32,
}

impl UsageMetadata {
    /// Create usage metadata from prompt and candidate counts.
    pub fn new(prompt_token_count: u32, candidates_token_count: u32) -> Self {
        Self {
            prompt_token_count,
            candidates_token_count,
            total_token_count: prompt_token_count + candidates_token_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_partial() {
        let usage: UsageMetadata =
            serde_json::from_value(json!({"promptTokenCount": 12, "totalTokenCount": 12}))
                .unwrap();
        assert_eq!(usage.prompt_token_count, 12);
        assert_eq!(usage.candidates_token_count, 0);
    }
}
