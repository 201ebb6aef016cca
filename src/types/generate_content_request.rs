use serde::{Deserialize, Serialize};

use crate::types::{Content, GenerationConfig};

/// Body of a `generateContent` or `streamGenerateContent` request.
///
/// The model is part of the request URL, not the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The conversation so far, ending with the newest user content.
    pub contents: Vec<Content>,

    /// Instruction that frames every turn of the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    /// Sampling and output options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Create a request over the given contents.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            system_instruction: None,
            generation_config: None,
        }
    }

    /// Set the system instruction.  Blank instructions are dropped.
    pub fn with_system_instruction(mut self, instruction: Option<&str>) -> Self {
        self.system_instruction = instruction
            .filter(|text| !text.trim().is_empty())
            .map(Content::system);
        self
    }

    /// Set the generation config.  Empty configs are dropped.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = if config.is_empty() {
            None
        } else {
            Some(config)
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn full_request_serialization() {
        let request = GenerateContentRequest::new(vec![
            Content::user("Bonjour"),
            Content::model("Bonjour ! Comment puis-je aider ?"),
            Content::user("Quel est le prix ?"),
        ])
        .with_system_instruction(Some("Répondez en français."))
        .with_generation_config(GenerationConfig::new().with_temperature(Some(0.2)));

        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "Bonjour"}]},
                    {"role": "model", "parts": [{"text": "Bonjour ! Comment puis-je aider ?"}]},
                    {"role": "user", "parts": [{"text": "Quel est le prix ?"}]}
                ],
                "systemInstruction": {"parts": [{"text": "Répondez en français."}]},
                "generationConfig": {"temperature": 0.2}
            })
        );
    }

    #[test]
    fn blank_instruction_and_empty_config_are_omitted() {
        let request = GenerateContentRequest::new(vec![Content::user("hi")])
            .with_system_instruction(Some("   "))
            .with_generation_config(GenerationConfig::new());
        assert_eq!(
            to_value(&request).unwrap(),
            json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]})
        );
    }
}
