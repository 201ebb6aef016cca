//! Chat application module for the storefront assistant.
//!
//! This module provides the transcript controller and the pieces of the
//! streaming REPL built on top of it. It supports:
//!
//! - Streaming replies into a placeholder message as chunks arrive
//! - Apology messages and an error banner when a turn fails
//! - Slash commands for inspecting the conversation
//! - Configurable model, system instruction, and persona texts
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`controller`]: Transcript state and turn handling
//! - [`message`]: Transcript entries
//! - [`commands`]: Slash command parsing

mod commands;
mod config;
mod controller;
mod message;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{
    ChatArgs, ChatConfig, DEFAULT_APOLOGY_PREFIX, DEFAULT_BOT_NAME, DEFAULT_INPUT_PROMPT,
    DEFAULT_STATUS_TEXT, DEFAULT_SYSTEM_INSTRUCTION, DEFAULT_TYPING_INDICATOR,
    DEFAULT_WELCOME_MESSAGE,
};
pub use controller::{
    ControllerStats, INITIALIZATION_FAILED_PREFIX, SESSION_NOT_READY_MESSAGE, TURN_FAILED_PREFIX,
    TranscriptController, TranscriptState, TurnOutcome,
};
pub use message::{Message, MessageId, Sender};
