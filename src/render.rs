//! Output rendering for the chat transcript.
//!
//! This module provides the renderer trait the transcript controller streams
//! into, and a plain-text terminal implementation.

use std::io::{self, Stdout, Write};

use crate::chat::{Message, Sender};

/// ANSI escape code for dim text (used for the typing indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text (used for the typing indicator).
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code for bold text (used for the header).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the assistant's name).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for magenta text (used for the user's name).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// ANSI escape code for green text (used for the online status).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for the error banner).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI sequence returning to column zero and clearing the line.
const ANSI_CLEAR_LINE: &str = "\r\x1b[2K";

/// Trait for rendering transcript output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Recording renderers in tests
pub trait Renderer: Send {
    /// Print the header naming the assistant.
    fn print_header(&mut self, name: &str, status: &str) {
        _ = name;
        _ = status;
    }

    /// Print a complete message, such as the welcome or an error reply.
    fn print_message(&mut self, message: &Message);

    /// Called when a reply is requested, before any chunk has arrived.
    fn start_response(&mut self, typing_indicator: &str);

    /// Print a chunk of response text.
    ///
    /// This is called incrementally as chunks are streamed from the service.
    fn print_text(&mut self, text: &str);

    /// Called when the reply has ended, successfully or not.
    fn finish_response(&mut self);

    /// Print the error banner.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
///
/// This renderer outputs text directly to stdout with optional ANSI escape
/// codes; the error banner goes to stderr.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    bot_name: String,
    user_name: String,
    typing: bool,
    in_response: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            bot_name: "Bot".to_string(),
            user_name: "Vous".to_string(),
            typing: false,
            in_response: false,
        }
    }

    /// Sets the names messages are labelled with.
    pub fn with_names(mut self, bot_name: impl Into<String>, user_name: impl Into<String>) -> Self {
        self.bot_name = bot_name.into();
        self.user_name = user_name.into();
        self
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn label(&self, sender: Sender) -> String {
        let (name, color) = match sender {
            Sender::Bot => (&self.bot_name, ANSI_CYAN),
            Sender::User => (&self.user_name, ANSI_MAGENTA),
        };
        if self.use_color {
            format!("{color}{name}:{ANSI_RESET} ")
        } else {
            format!("{name}: ")
        }
    }

    /// Removes the typing indicator before the first chunk is printed.
    fn clear_typing(&mut self) {
        if !self.typing {
            return;
        }
        self.typing = false;
        if self.use_color {
            print!("{ANSI_CLEAR_LINE}{}", self.label(Sender::Bot));
        } else {
            print!("\n{}", self.label(Sender::Bot));
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_header(&mut self, name: &str, status: &str) {
        if self.use_color {
            println!("{ANSI_BOLD}{name}{ANSI_RESET}  {ANSI_GREEN}● {status}{ANSI_RESET}");
        } else {
            println!("{name} ({status})");
        }
        self.flush();
    }

    fn print_message(&mut self, message: &Message) {
        if self.in_response {
            self.finish_response();
        }
        println!("{}{}", self.label(message.sender), message.text);
        self.flush();
    }

    fn start_response(&mut self, typing_indicator: &str) {
        self.in_response = true;
        self.typing = true;
        let label = self.label(Sender::Bot);
        if self.use_color {
            print!("{label}{ANSI_DIM}{ANSI_ITALIC}{typing_indicator}{ANSI_RESET}");
        } else {
            print!("{label}{typing_indicator}");
        }
        self.flush();
    }

    fn print_text(&mut self, text: &str) {
        self.clear_typing();
        print!("{text}");
        self.flush();
    }

    fn finish_response(&mut self) {
        if !self.in_response {
            return;
        }
        if self.typing && self.use_color {
            // Nothing arrived; drop the indicator and leave the bare label.
            print!("{ANSI_CLEAR_LINE}{}", self.label(Sender::Bot));
        }
        self.typing = false;
        self.in_response = false;
        println!();
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        if self.in_response {
            self.finish_response();
        }
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        if self.in_response {
            self.finish_response();
        }
        println!("{info}");
        self.flush();
    }
}
