//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the persona
//! and model configuration the transcript controller runs with.

use arrrg_derive::CommandLine;

use crate::backend::SessionConfig;
use crate::types::{GenerationConfig, KnownModel, Model};

/// Name the assistant introduces itself with.
pub const DEFAULT_BOT_NAME: &str = "ElectroBot";

/// Instruction framing every turn of the storefront conversation.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "Vous êtes 'ElectroBot', un assistant IA amical et compétent pour une boutique en ligne spécialisée dans les gadgets électroniques. Votre objectif est d'aider les clients en répondant à leurs questions sur les produits, les commandes, les retours et les spécifications techniques. Soyez poli, concis et répondez toujours en français.";

/// First message of every transcript.
pub const DEFAULT_WELCOME_MESSAGE: &str = "Bonjour ! Je suis ElectroBot, votre assistant virtuel. Comment puis-je vous aider aujourd'hui avec vos produits électroniques ?";

/// Prefix of the bot message that replaces a failed reply.
pub const DEFAULT_APOLOGY_PREFIX: &str = "Désolé, une erreur est survenue.";

/// Shown while waiting for the first chunk of a reply.
pub const DEFAULT_TYPING_INDICATOR: &str = "ElectroBot est en train d'écrire...";

/// Status line shown under the assistant's name.
pub const DEFAULT_STATUS_TEXT: &str = "En ligne";

/// Prompt shown in front of user input.
pub const DEFAULT_INPUT_PROMPT: &str = "Vous: ";

/// Command-line arguments for the electrobot-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemini-2.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// System instruction replacing the storefront persona.
    #[arrrg(optional, "System instruction for the conversation", "PROMPT")]
    pub system: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: model limit)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature 0.0-2.0 (default: model default)", "TEMP")]
    pub temperature: Option<f32>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

// `arrrg::CommandLine` requires `Eq`; `Option<f32>` prevents deriving it.
impl Eq for ChatArgs {}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// Instruction framing the conversation.
    pub system_instruction: Option<String>,

    /// Maximum tokens per response.
    pub max_output_tokens: Option<u32>,

    /// Optional sampling temperature.
    pub temperature: Option<f32>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Name the assistant is displayed with.
    pub bot_name: String,

    /// Status line shown under the assistant's name.
    pub status_text: String,

    /// Text of the synthetic first message.
    pub welcome_message: String,

    /// Prefix of the bot message that replaces a failed reply.
    pub apology_prefix: String,

    /// Shown while the reply has not started.
    pub typing_indicator: String,

    /// Prompt shown in front of user input.
    pub input_prompt: String,
}

impl ChatConfig {
    /// Creates a new ChatConfig with the storefront persona.
    ///
    /// Defaults:
    /// - Model: gemini-2.5-flash
    /// - Persona: ElectroBot, answering in French
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::Known(KnownModel::Gemini25Flash),
            system_instruction: Some(DEFAULT_SYSTEM_INSTRUCTION.to_string()),
            max_output_tokens: None,
            temperature: None,
            use_color: true,
            bot_name: DEFAULT_BOT_NAME.to_string(),
            status_text: DEFAULT_STATUS_TEXT.to_string(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            apology_prefix: DEFAULT_APOLOGY_PREFIX.to_string(),
            typing_indicator: DEFAULT_TYPING_INDICATOR.to_string(),
            input_prompt: DEFAULT_INPUT_PROMPT.to_string(),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the system instruction.
    pub fn with_system_instruction(mut self, instruction: Option<String>) -> Self {
        self.system_instruction = instruction;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_output_tokens(mut self, max_output_tokens: Option<u32>) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the welcome message.
    pub fn with_welcome_message(mut self, welcome_message: impl Into<String>) -> Self {
        self.welcome_message = welcome_message.into();
        self
    }

    /// Sets the apology prefix used for failed replies.
    pub fn with_apology_prefix(mut self, apology_prefix: impl Into<String>) -> Self {
        self.apology_prefix = apology_prefix.into();
        self
    }

    /// Sets the assistant's display name.
    pub fn with_bot_name(mut self, bot_name: impl Into<String>) -> Self {
        self.bot_name = bot_name.into();
        self
    }

    /// The configuration handed to the backend when opening a session.
    pub fn session_config(&self) -> SessionConfig {
        let generation_config = GenerationConfig::new()
            .with_temperature(self.temperature)
            .with_max_output_tokens(self.max_output_tokens);
        let config =
            SessionConfig::new(self.model.clone()).with_generation_config(generation_config);
        match &self.system_instruction {
            Some(instruction) => config.with_system_instruction(instruction.clone()),
            None => config,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        let model = args
            .model
            .and_then(|s| s.parse::<Model>().ok())
            .unwrap_or(defaults.model.clone());

        ChatConfig {
            model,
            system_instruction: args.system.or(defaults.system_instruction.clone()),
            max_output_tokens: args.max_tokens,
            temperature: args.temperature,
            use_color: !args.no_color,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.model, Model::Known(KnownModel::Gemini25Flash));
        assert_eq!(
            config.system_instruction.as_deref(),
            Some(DEFAULT_SYSTEM_INSTRUCTION)
        );
        assert!(config.use_color);
        assert!(config.max_output_tokens.is_none());
        assert!(config.temperature.is_none());
        assert_eq!(config.bot_name, "ElectroBot");
        assert_eq!(config.apology_prefix, "Désolé, une erreur est survenue.");
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            model: Some("gemini-2.5-pro".to_string()),
            system: Some("You are helpful.".to_string()),
            max_tokens: Some(512),
            temperature: Some(0.4),
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.model, Model::Known(KnownModel::Gemini25Pro));
        assert_eq!(config.system_instruction.as_deref(), Some("You are helpful."));
        assert_eq!(config.max_output_tokens, Some(512));
        assert_eq!(config.temperature, Some(0.4));
        assert!(!config.use_color);
        assert_eq!(config.welcome_message, DEFAULT_WELCOME_MESSAGE);
    }

    #[test]
    fn custom_model_is_kept() {
        let args = ChatArgs {
            model: Some("gemini-exp-1206".to_string()),
            ..ChatArgs::default()
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.model, Model::Custom("gemini-exp-1206".to_string()));
    }

    #[test]
    fn session_config_carries_persona() {
        let config = ChatConfig::new()
            .with_max_output_tokens(Some(256))
            .with_temperature(Some(0.1));
        let session = config.session_config();
        assert_eq!(session.model, config.model);
        assert_eq!(
            session.system_instruction.as_deref(),
            Some(DEFAULT_SYSTEM_INSTRUCTION)
        );
        assert_eq!(session.generation_config.max_output_tokens, Some(256));
        assert_eq!(session.generation_config.temperature, Some(0.1));
    }

    #[test]
    fn session_config_without_instruction() {
        let config = ChatConfig::new().with_system_instruction(None);
        assert!(config.session_config().system_instruction.is_none());
    }
}
