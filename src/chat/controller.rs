//! The transcript controller.
//!
//! [`TranscriptController`] owns the ordered message transcript and mediates
//! one conversation turn at a time: the user's message is appended, the reply
//! is streamed into a placeholder bot message, and failures are turned into an
//! apology message plus an error banner.  Observers read the state through
//! [`TranscriptController::subscribe`].

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio::sync::watch;

use crate::backend::{ChatBackend, ChatSession};
use crate::chat::config::ChatConfig;
use crate::chat::message::{Message, MessageId, Sender};
use crate::error::{Error, Result};
use crate::observability::{
    TURN_CHUNKS, TURN_DURATION, TURN_FIRST_CHUNK, TURNS_COMPLETED, TURNS_FAILED, TURNS_IGNORED,
    TURNS_STARTED,
};
use crate::render::Renderer;
use crate::types::Model;

/// Error text recorded when a turn is attempted without a session.
pub const SESSION_NOT_READY_MESSAGE: &str = "Chat session is not initialized.";

/// Prefix of the error text recorded when the session cannot be created.
pub const INITIALIZATION_FAILED_PREFIX: &str = "Failed to initialize AI model:";

/// Prefix of the description of a failed turn.
pub const TURN_FAILED_PREFIX: &str = "API Error:";

/// A snapshot of everything a presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptState {
    /// The transcript, in display order.
    pub messages: Arc<Vec<Message>>,
    /// True while a turn is in flight.
    pub loading: bool,
    /// The most recent user-visible error, if any.
    pub error: Option<String>,
}

impl TranscriptState {
    /// Returns true while waiting for the reply to start.
    pub fn typing_indicator_visible(&self) -> bool {
        self.loading && self.messages.last().is_some_and(Message::is_user)
    }
}

/// The result of one call to [`TranscriptController::send_turn`].
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The input was blank or a turn was already in flight; nothing changed.
    Ignored,
    /// The reply streamed to completion into the given message.
    Completed {
        /// Identifier of the bot message holding the reply.
        message_id: MessageId,
    },
    /// The turn failed; the error is already reflected in the transcript.
    Failed {
        /// The underlying failure.
        error: Error,
    },
}

impl TurnOutcome {
    /// Returns true if the reply completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed { .. })
    }

    /// Returns true if the turn failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, TurnOutcome::Failed { .. })
    }

    /// Returns true if the input was ignored.
    pub fn is_ignored(&self) -> bool {
        matches!(self, TurnOutcome::Ignored)
    }
}

/// Aggregated stats for a controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerStats {
    /// The model answering the conversation.
    pub model: Model,
    /// The number of messages in the transcript.
    pub message_count: usize,
    /// Turns that reached the session.
    pub turns_attempted: u64,
    /// Turns whose reply streamed to completion.
    pub turns_completed: u64,
    /// Turns that ended in an error message.
    pub turns_failed: u64,
    /// Chunks received across all turns.
    pub chunks_received: u64,
    /// Characters received across all turns.
    pub characters_received: u64,
}

#[derive(Debug, Default)]
struct Counters {
    turns_attempted: u64,
    turns_completed: u64,
    turns_failed: u64,
    chunks_received: u64,
    characters_received: u64,
}

/// Owns the transcript and runs conversation turns against a chat backend.
///
/// Turns take `&mut self`, so at most one is ever in flight per controller.
pub struct TranscriptController<B: ChatBackend> {
    backend: B,
    config: ChatConfig,
    session: Option<Box<dyn ChatSession>>,
    transcript: Transcript,
}

/// The observable half of the controller, kept apart from the session so a
/// turn can borrow both at once.
struct Transcript {
    messages: Arc<Vec<Message>>,
    next_id: u64,
    loading: bool,
    error: Option<String>,
    state: watch::Sender<TranscriptState>,
    counters: Counters,
}

/// Clears `loading` when a turn is dropped before it settles.
struct InFlight<'a> {
    transcript: &'a mut Transcript,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.transcript.loading {
            self.transcript.loading = false;
            self.transcript.publish();
        }
    }
}

impl<B: ChatBackend> TranscriptController<B> {
    /// Creates a controller with an empty transcript and no session.
    pub fn new(backend: B, config: ChatConfig) -> Self {
        let (state, _) = watch::channel(TranscriptState::default());
        Self {
            backend,
            config,
            session: None,
            transcript: Transcript {
                messages: Arc::new(Vec::new()),
                next_id: 0,
                loading: false,
                error: None,
                state,
                counters: Counters::default(),
            },
        }
    }

    /// Opens the chat session and seeds the transcript with the welcome
    /// message.
    ///
    /// Calling this again starts a fresh conversation.
    ///
    /// # Errors
    ///
    /// Returns an initialization error if the backend cannot create a
    /// session.  The error is also recorded for observers, and the controller
    /// stays unable to send.
    pub async fn initialize(&mut self) -> Result<()> {
        match self
            .backend
            .create_session(&self.config.session_config())
            .await
        {
            Ok(session) => {
                self.session = Some(session);
                let transcript = &mut self.transcript;
                transcript.messages = Arc::new(Vec::new());
                transcript.push(Sender::Bot, self.config.welcome_message.clone());
                transcript.loading = false;
                transcript.error = None;
                transcript.publish();
                Ok(())
            }
            Err(err) => {
                self.session = None;
                let message = format!("{INITIALIZATION_FAILED_PREFIX} {err}");
                self.transcript.error = Some(message.clone());
                self.transcript.publish();
                Err(Error::initialization(message, Some(Box::new(err))))
            }
        }
    }

    /// Runs one conversation turn.
    ///
    /// The trimmed input is appended as a user message, the reply streams
    /// into a new bot message, and the renderer sees the same progression.
    /// Errors never escape: they become an apology message in the transcript
    /// and the recorded error.
    ///
    /// Dropping the returned future abandons the turn.  The controller keeps
    /// its session, stops loading, and leaves whatever text already arrived
    /// in the transcript.
    pub async fn send_turn(&mut self, input: &str, renderer: &mut dyn Renderer) -> TurnOutcome {
        let text = input.trim();
        if text.is_empty() || self.transcript.loading {
            TURNS_IGNORED.click();
            return TurnOutcome::Ignored;
        }

        let Some(session) = self.session.as_deref_mut() else {
            self.transcript.error = Some(SESSION_NOT_READY_MESSAGE.to_string());
            self.transcript.publish();
            renderer.print_error(SESSION_NOT_READY_MESSAGE);
            return TurnOutcome::Failed {
                error: Error::session_not_ready(SESSION_NOT_READY_MESSAGE),
            };
        };

        TURNS_STARTED.click();
        let started = Instant::now();
        let turn = InFlight {
            transcript: &mut self.transcript,
        };
        turn.transcript.counters.turns_attempted += 1;
        turn.transcript.push(Sender::User, text.to_string());
        turn.transcript.loading = true;
        turn.transcript.error = None;
        turn.transcript.publish();
        renderer.start_response(&self.config.typing_indicator);

        let outcome = match turn
            .transcript
            .stream_reply(session, input, renderer, started)
            .await
        {
            Ok(message_id) => {
                TURNS_COMPLETED.click();
                turn.transcript.counters.turns_completed += 1;
                turn.transcript.loading = false;
                turn.transcript.publish();
                renderer.finish_response();
                TurnOutcome::Completed { message_id }
            }
            Err(err) => turn
                .transcript
                .fail_turn(err, &self.config.apology_prefix, renderer),
        };
        TURN_DURATION.add(started.elapsed().as_secs_f64());
        outcome
    }

    /// Returns a read-only subscription to the transcript state.
    pub fn subscribe(&self) -> watch::Receiver<TranscriptState> {
        self.transcript.state.subscribe()
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> TranscriptState {
        self.transcript.snapshot()
    }

    /// Returns the transcript.
    pub fn messages(&self) -> &[Message] {
        &self.transcript.messages
    }

    /// Returns the last message of the transcript.
    pub fn last_message(&self) -> Option<&Message> {
        self.transcript.messages.last()
    }

    /// Returns true while a turn is in flight.
    pub fn is_loading(&self) -> bool {
        self.transcript.loading
    }

    /// Returns the most recent user-visible error.
    pub fn error(&self) -> Option<&str> {
        self.transcript.error.as_deref()
    }

    /// Returns true once a session has been created.
    pub fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    /// Returns true while waiting for the reply to start.
    pub fn typing_indicator_visible(&self) -> bool {
        self.is_loading() && self.last_message().is_some_and(Message::is_user)
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the current statistics snapshot.
    pub fn stats(&self) -> ControllerStats {
        let counters = &self.transcript.counters;
        ControllerStats {
            model: self.config.model.clone(),
            message_count: self.transcript.messages.len(),
            turns_attempted: counters.turns_attempted,
            turns_completed: counters.turns_completed,
            turns_failed: counters.turns_failed,
            chunks_received: counters.chunks_received,
            characters_received: counters.characters_received,
        }
    }

    /// Renders the session statistics as info lines.
    pub fn show_stats(&self, renderer: &mut dyn Renderer) {
        let stats = self.stats();
        renderer.print_info("    Session Statistics:");
        renderer.print_info(&format!("      Model: {}", stats.model));
        renderer.print_info(&format!("      Messages: {}", stats.message_count));
        renderer.print_info(&format!(
            "      Turns: {} ({} completed, {} failed)",
            stats.turns_attempted, stats.turns_completed, stats.turns_failed
        ));
        renderer.print_info(&format!(
            "      Received: {} chunks, {} characters",
            stats.chunks_received, stats.characters_received
        ));
        renderer.print_info(&format!(
            "      Last error: {}",
            self.error().unwrap_or("(none)")
        ));
        renderer.print_info(&format!(
            "      Session: {}",
            if self.is_ready() {
                "ready"
            } else {
                "not initialized"
            }
        ));
    }

    /// Renders the active configuration as info lines.
    pub fn show_config(&self, renderer: &mut dyn Renderer) {
        let config = &self.config;
        renderer.print_info("    Current Configuration:");
        renderer.print_info(&format!("      Model: {}", config.model));
        renderer.print_info(&format!("      Assistant: {}", config.bot_name));
        renderer.print_info(&format!(
            "      Max tokens: {}",
            config
                .max_output_tokens
                .map(|v| v.to_string())
                .unwrap_or_else(|| "default".to_string())
        ));
        renderer.print_info(&format!(
            "      Temperature: {}",
            config
                .temperature
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "default".to_string())
        ));
        renderer.print_info(&format!(
            "      System instruction: {}",
            config.system_instruction.as_deref().unwrap_or("(none)")
        ));
        renderer.print_info(&format!(
            "      Color: {}",
            if config.use_color { "on" } else { "off" }
        ));
    }
}

impl Transcript {
    async fn stream_reply(
        &mut self,
        session: &mut dyn ChatSession,
        input: &str,
        renderer: &mut dyn Renderer,
        started: Instant,
    ) -> Result<MessageId> {
        let mut chunks = session.send_streaming(input).await?;
        let placeholder = self.push(Sender::Bot, String::new());
        self.publish();

        let mut reply = String::new();
        let mut first = true;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            if first {
                TURN_FIRST_CHUNK.add(started.elapsed().as_secs_f64());
                first = false;
            }
            TURN_CHUNKS.click();
            self.counters.chunks_received += 1;
            self.counters.characters_received += chunk.chars().count() as u64;
            reply.push_str(&chunk);
            renderer.print_text(&chunk);
            self.replace_text(placeholder, &reply);
        }
        Ok(placeholder)
    }

    fn fail_turn(
        &mut self,
        err: Error,
        apology_prefix: &str,
        renderer: &mut dyn Renderer,
    ) -> TurnOutcome {
        TURNS_FAILED.click();
        self.counters.turns_failed += 1;

        let description = format!("{TURN_FAILED_PREFIX} {err}");
        let id = self.push(Sender::Bot, format!("{apology_prefix} {description}"));
        self.error = Some(description.clone());
        self.loading = false;
        self.publish();

        renderer.finish_response();
        if let Some(message) = self.messages.iter().rev().find(|m| m.id == id) {
            renderer.print_message(message);
        }
        renderer.print_error(&description);
        TurnOutcome::Failed { error: err }
    }

    /// Appends a message and returns its identifier.  Does not publish.
    fn push(&mut self, sender: Sender, text: String) -> MessageId {
        let id = MessageId::new(self.next_id);
        self.next_id += 1;
        Arc::make_mut(&mut self.messages).push(Message::new(id, sender, text));
        id
    }

    /// Replaces the text of the message with the given id and publishes.
    fn replace_text(&mut self, id: MessageId, text: &str) {
        let messages = Arc::make_mut(&mut self.messages);
        if let Some(message) = messages.iter_mut().rev().find(|m| m.id == id) {
            message.text.clear();
            message.text.push_str(text);
        }
        self.publish();
    }

    fn publish(&self) {
        self.state.send_replace(self.snapshot());
    }

    fn snapshot(&self) -> TranscriptState {
        TranscriptState {
            messages: Arc::clone(&self.messages),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}
