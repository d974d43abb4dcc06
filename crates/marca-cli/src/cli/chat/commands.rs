//! Slash commands for the chat loop.
//!
//! Commands start with `/`; anything else is sent as a message.

use std::path::PathBuf;

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    Clear,
    Exit,
    /// Start a new conversation.
    New,
    /// Start (or restart) the branding questionnaire.
    Branding,
    /// Show the turns of the current conversation.
    History,
    /// Queue an image for the next message.
    Attach(PathBuf),
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(' ') {
        Some((cmd, arg)) => (cmd.to_lowercase(), arg.trim()),
        None => (trimmed.to_lowercase(), ""),
    };

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/new" => Some(ChatCommand::New),
        "/branding" | "/brand" => Some(ChatCommand::Branding),
        "/history" => Some(ChatCommand::History),
        "/attach" | "/image" => {
            if arg.is_empty() {
                Some(ChatCommand::Unknown("/attach requires a file path".to_string()))
            } else {
                Some(ChatCommand::Attach(PathBuf::from(arg)))
            }
        }
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}      Show this help message", style("/help").cyan());
    println!("  {}       Start a new conversation", style("/new").cyan());
    println!("  {}  Start the branding questionnaire", style("/branding").cyan());
    println!("  {}   Show conversation history", style("/history").cyan());
    println!("  {}    Attach an image to the next message", style("/attach").cyan());
    println!("  {}     Clear the screen", style("/clear").cyan());
    println!("  {}      End the chat session", style("/exit").cyan());
    println!();
    println!(
        "  {}",
        style("An empty line sends the attached images on their own. Ctrl+D to exit.").dim()
    );
    println!();
}
