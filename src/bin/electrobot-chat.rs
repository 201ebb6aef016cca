//! Interactive storefront assistant in the terminal.
//!
//! This binary provides a streaming REPL interface for chatting with
//! ElectroBot, backed by Gemini models.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings (reads GEMINI_API_KEY or API_KEY)
//! electrobot-chat
//!
//! # Specify a model
//! electrobot-chat --model gemini-2.5-pro
//!
//! # Replace the persona
//! electrobot-chat --system "Vous êtes un assistant bref."
//!
//! # Disable colors (useful for piping output)
//! electrobot-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/history` - Reprint the conversation
//! - `/stats` - Show session statistics
//! - `/config` - Show the current configuration
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use electrobot::GeminiBackend;
use electrobot::chat::{
    ChatArgs, ChatCommand, ChatConfig, PlainTextRenderer, Renderer, TranscriptController,
    help_text, parse_command,
};

/// Main entry point for the electrobot-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("electrobot-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let mut renderer = PlainTextRenderer::with_color(config.use_color)
        .with_names(config.bot_name.clone(), "Vous");
    let mut rl = DefaultEditor::new()?;

    renderer.print_header(&config.bot_name, &config.status_text);
    renderer.print_info("Type /help for commands, /quit to exit\n");

    let prompt = config.input_prompt.clone();
    let mut controller = TranscriptController::new(GeminiBackend::from_env(), config);
    if controller.initialize().await.is_err()
        && let Some(error) = controller.error()
    {
        renderer.print_error(error);
    }
    for message in controller.messages() {
        renderer.print_message(message);
    }

    loop {
        let readline = rl.readline(&prompt);

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            renderer.print_info("Au revoir !");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                renderer.print_info(&format!("    {line}"));
                            }
                        }
                        ChatCommand::History => {
                            for message in controller.messages() {
                                renderer.print_message(message);
                            }
                        }
                        ChatCommand::Stats => {
                            controller.show_stats(&mut renderer);
                        }
                        ChatCommand::ShowConfig => {
                            controller.show_config(&mut renderer);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Failures are already in the transcript and on the banner.
                controller.send_turn(line, &mut renderer).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - ignore
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                renderer.print_info("\nAu revoir !");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}
