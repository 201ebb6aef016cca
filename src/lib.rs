// Public modules
pub mod backend;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod gemini_chat;
pub mod observability;
pub mod render;
pub mod sse;
pub mod types;

// Re-exports
pub use backend::{ChatBackend, ChatSession, ChunkStream, SessionConfig};
pub use client::Gemini;
pub use client_logger::ClientLogger;
pub use error::{Error, Result};
pub use gemini_chat::{GeminiBackend, GeminiChat};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
