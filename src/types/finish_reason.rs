use serde::{Deserialize, Serialize};

/// Why the model stopped generating a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    /// Natural stop point or a stop sequence.
    Stop,
    /// The maximum number of output tokens was reached.
    MaxTokens,
    /// Flagged by safety filters.
    Safety,
    /// Flagged for recitation.
    Recitation,
    /// Unsupported language.
    Language,
    /// Contained a blocklisted term.
    Blocklist,
    /// Contained prohibited content.
    ProhibitedContent,
    /// Contained sensitive personally identifiable information.
    Spii,
    /// Any reason this crate does not know about.
    #[serde(other)]
    Other,
}

impl FinishReason {
    /// Returns true if the candidate was cut short by a content filter.
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            FinishReason::Safety
                | FinishReason::Recitation
                | FinishReason::Blocklist
                | FinishReason::ProhibitedContent
                | FinishReason::Spii
        )
    }
}
