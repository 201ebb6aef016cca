//! Gemini implementation of the chat backend.
//!
//! [`GeminiChat`] keeps the conversation history the way a hosted chat
//! object does: each turn sends the full history plus the new user content,
//! and the exchange is recorded only once the reply has streamed to
//! completion.  A failed turn leaves the history as it was.

use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;

use crate::backend::{ChatBackend, ChatSession, ChunkStream, SessionConfig};
use crate::client::{API_KEY_ENV, Gemini, ResponseStream, api_key_from_env};
use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{SESSION_ERRORS, SESSIONS_CREATED};
use crate::types::{Content, GenerateContentRequest};

/// Creates Gemini chat sessions.
///
/// The API key is captured once, when the backend is built.
#[derive(Clone, Default)]
pub struct GeminiBackend {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl GeminiBackend {
    /// Creates a backend with an explicit (possibly absent) API key.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            ..Self::default()
        }
    }

    /// Creates a backend with the API key read from the environment.
    pub fn from_env() -> Self {
        Self::new(api_key_from_env())
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Overrides the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches a client logger to every session's client.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns true if an API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn client(&self) -> Result<Gemini> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(Error::authentication(format!(
                "{API_KEY_ENV} environment variable not set"
            )));
        };
        let client = Gemini::with_options(Some(api_key), self.base_url.clone(), self.timeout)?;
        Ok(match &self.logger {
            Some(logger) => client.with_logger(logger.clone()),
            None => client,
        })
    }
}

#[async_trait::async_trait]
impl ChatBackend for GeminiBackend {
    async fn create_session(&self, config: &SessionConfig) -> Result<Box<dyn ChatSession>> {
        match self.client() {
            Ok(client) => {
                SESSIONS_CREATED.click();
                Ok(Box::new(GeminiChat::new(client, config.clone())))
            }
            Err(err) => {
                SESSION_ERRORS.click();
                Err(err)
            }
        }
    }
}

/// A Gemini conversation with its own history.
pub struct GeminiChat {
    client: Gemini,
    config: SessionConfig,
    history: Arc<Mutex<Vec<Content>>>,
}

impl GeminiChat {
    /// Creates an empty conversation.
    pub fn new(client: Gemini, config: SessionConfig) -> Self {
        Self {
            client,
            config,
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a copy of the recorded history.
    pub fn history(&self) -> Vec<Content> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Builds the request for the next turn.
    fn request(&self, user: &Content) -> GenerateContentRequest {
        let mut contents = self.history();
        contents.push(user.clone());
        GenerateContentRequest::new(contents)
            .with_system_instruction(self.config.system_instruction.as_deref())
            .with_generation_config(self.config.generation_config.clone())
    }
}

#[async_trait::async_trait]
impl ChatSession for GeminiChat {
    async fn send_streaming(&mut self, text: &str) -> Result<ChunkStream> {
        let user = Content::user(text);
        let request = self.request(&user);
        let responses = self.client.stream(&self.config.model, &request).await?;
        Ok(Box::pin(RecordingStream::new(
            responses,
            user,
            Arc::clone(&self.history),
        )))
    }
}

/// Maps streamed responses to text chunks and records the exchange in the
/// history once the stream ends cleanly.
struct RecordingStream {
    inner: ResponseStream,
    user: Option<Content>,
    reply: String,
    history: Arc<Mutex<Vec<Content>>>,
    failed: bool,
}

impl RecordingStream {
    fn new(inner: ResponseStream, user: Content, history: Arc<Mutex<Vec<Content>>>) -> Self {
        Self {
            inner,
            user: Some(user),
            reply: String::new(),
            history,
            failed: false,
        }
    }

    fn fail(&mut self, err: Error) -> Poll<Option<Result<String>>> {
        self.failed = true;
        Poll::Ready(Some(Err(err)))
    }

    fn record(&mut self) {
        if self.failed || self.reply.is_empty() {
            return;
        }
        let Some(user) = self.user.take() else {
            return;
        };
        let reply = Content::model(std::mem::take(&mut self.reply));
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push(user);
        history.push(reply);
    }
}

impl Stream for RecordingStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.failed {
            return Poll::Ready(None);
        }
        loop {
            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(response))) => {
                    if let Some(reason) = response.block_reason() {
                        let err = Error::streaming(format!("prompt blocked: {reason}"), None);
                        return self.fail(err);
                    }
                    let text = response.text();
                    if text.is_empty() {
                        if let Some(reason) = response.finish_reason()
                            && reason.is_blocked()
                            && self.reply.is_empty()
                        {
                            let err =
                                Error::streaming(format!("response blocked: {reason:?}"), None);
                            return self.fail(err);
                        }
                        continue;
                    }
                    self.reply.push_str(&text);
                    return Poll::Ready(Some(Ok(text)));
                }
                Poll::Ready(Some(Err(err))) => return self.fail(err),
                Poll::Ready(None) => {
                    self.record();
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
