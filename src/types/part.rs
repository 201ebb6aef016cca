use serde::{Deserialize, Serialize};

/// A single part of a piece of content.
///
/// Only text parts are produced by this crate.  Other part kinds sent back by
/// the API (inline data, function calls) deserialize with `text` unset and are
/// ignored when collecting text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// The text of this part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Set when the part carries model reasoning rather than answer text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    /// Create a new text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
        }
    }

    /// Returns true if this part is model reasoning.
    pub fn is_thought(&self) -> bool {
        self.thought.unwrap_or(false)
    }

    /// Returns the answer text of this part, if any.
    pub fn answer_text(&self) -> Option<&str> {
        if self.is_thought() {
            None
        } else {
            self.text.as_deref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn text_part_serialization() {
        let part = Part::text("Bonjour");
        assert_eq!(to_value(&part).unwrap(), json!({"text": "Bonjour"}));
    }

    #[test]
    fn thought_part_has_no_answer_text() {
        let part: Part =
            serde_json::from_value(json!({"text": "thinking...", "thought": true})).unwrap();
        assert!(part.is_thought());
        assert_eq!(part.answer_text(), None);
    }

    #[test]
    fn non_text_part_deserializes() {
        let part: Part = serde_json::from_value(json!({
            "inlineData": {"mimeType": "image/png", "data": "AAAA"}
        }))
        .unwrap();
        assert_eq!(part.answer_text(), None);
    }
}
