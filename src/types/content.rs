use serde::{Deserialize, Serialize};

use crate::types::{Part, Role};

/// A piece of conversation content: a role and its parts.
///
/// The system instruction is also sent as `Content`, without a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// The author of the content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// The ordered parts of the content.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create content with a single text part.
    pub fn new(role: Option<Role>, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::text(text)],
        }
    }

    /// Create user content with a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Some(Role::User), text)
    }

    /// Create model content with a single text part.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Some(Role::Model), text)
    }

    /// Create role-less content, as used for system instructions.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(None, text)
    }

    /// Concatenates the answer text of every part.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::answer_text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn user_content_serialization() {
        let content = Content::user("Quel est le prix ?");
        assert_eq!(
            to_value(&content).unwrap(),
            json!({"role": "user", "parts": [{"text": "Quel est le prix ?"}]})
        );
    }

    #[test]
    fn system_content_has_no_role() {
        let content = Content::system("Soyez poli.");
        assert_eq!(
            to_value(&content).unwrap(),
            json!({"parts": [{"text": "Soyez poli."}]})
        );
    }

    #[test]
    fn text_skips_thoughts() {
        let content: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [
                {"text": "hmm", "thought": true},
                {"text": "Le prix "},
                {"text": "est 10€."}
            ]
        }))
        .unwrap();
        assert_eq!(content.text(), "Le prix est 10€.");
    }

    #[test]
    fn missing_parts_default_to_empty() {
        let content: Content = serde_json::from_value(json!({"role": "model"})).unwrap();
        assert!(content.parts.is_empty());
        assert_eq!(content.text(), "");
    }
}
