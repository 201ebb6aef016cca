//! The external chat service, as seen by the transcript controller.
//!
//! A [`ChatBackend`] creates [`ChatSession`] handles; a session turns one
//! user utterance into a lazy, finite stream of text chunks.  The controller
//! only ever talks to these traits, so it runs unchanged against Gemini or
//! against an in-memory fake.

use std::pin::Pin;

use futures::Stream;

use crate::error::Result;
use crate::types::{GenerationConfig, Model};

/// A stream of response text chunks, in arrival order.
///
/// The stream is not restartable and may yield an error at any point; no
/// further chunks are expected after an error.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Everything needed to open a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// The model answering the conversation.
    pub model: Model,
    /// Fixed instruction framing every turn.
    pub system_instruction: Option<String>,
    /// Sampling options applied to every turn.
    pub generation_config: GenerationConfig,
}

impl SessionConfig {
    /// Creates a session config for the given model.
    pub fn new(model: impl Into<Model>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            generation_config: GenerationConfig::default(),
        }
    }

    /// Sets the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Sets the generation config.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = config;
        self
    }
}

/// Factory for chat sessions.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Opens a new session.  Missing credentials surface here.
    async fn create_session(&self, config: &SessionConfig) -> Result<Box<dyn ChatSession>>;
}

/// A stateful conversation with the external service.
#[async_trait::async_trait]
pub trait ChatSession: Send {
    /// Sends one user utterance and returns the streamed reply.
    ///
    /// An error here means no chunk will ever arrive for this turn.
    async fn send_streaming(&mut self, text: &str) -> Result<ChunkStream>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;

    #[test]
    fn session_config_builder() {
        let config = SessionConfig::new(KnownModel::Gemini25Flash)
            .with_system_instruction("Soyez concis.")
            .with_generation_config(GenerationConfig::new().with_temperature(Some(0.3)));
        assert_eq!(config.model, Model::Known(KnownModel::Gemini25Flash));
        assert_eq!(config.system_instruction.as_deref(), Some("Soyez concis."));
        assert_eq!(config.generation_config.temperature, Some(0.3));
    }
}
