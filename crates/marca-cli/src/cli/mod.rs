//! CLI command definitions for the `marca` binary.
//!
//! Uses clap derive macros for argument parsing. Conversations are addressed
//! by id; `marca list` shows them.

pub mod chat;
pub mod conversation;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use console::style;
use uuid::Uuid;

use marca_infra::storage::{detect_mime, is_image_mime};
use marca_types::error::ChatError;
use marca_types::image::ImageAttachment;

/// Chat with the Marca assistant and run the branding questionnaire.
#[derive(Parser)]
#[command(name = "marca", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a new conversation.
    New {
        /// Initial title (defaults to "Nuevo chat" until the first message).
        #[arg(long)]
        title: Option<String>,
    },

    /// List conversations, most recently updated first.
    #[command(alias = "ls")]
    List,

    /// Delete a conversation with all its turns and images.
    #[command(alias = "rm")]
    Delete {
        /// Conversation id.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        force: bool,
    },

    /// Show every turn of a conversation.
    History {
        /// Conversation id.
        id: String,
    },

    /// Send one message and stream the reply to stdout.
    Send {
        /// Conversation id.
        id: String,

        /// Message text. May be empty when at least one image is attached.
        #[arg(default_value = "")]
        text: String,

        /// Attach an image (repeatable).
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },

    /// Interactive chat. Opens the given conversation or starts a new one.
    Chat {
        /// Conversation id to resume.
        id: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Parse a conversation id given on the command line.
pub fn parse_conversation_id(raw: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(raw.trim()).with_context(|| format!("'{raw}' is not a valid conversation id"))
}

/// Read an image file into an attachment, rejecting non-image files.
pub async fn load_image(path: &Path) -> anyhow::Result<ImageAttachment> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid image path: {}", path.display()))?
        .to_string();

    let mime_type = detect_mime(&name);
    if !is_image_mime(&mime_type) {
        anyhow::bail!("'{name}' is not an image ({mime_type})");
    }

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    Ok(ImageAttachment {
        name,
        mime_type,
        data,
    })
}

/// Print a chat error the way the user sees it: a short title and a
/// description.
pub fn print_notification(err: &ChatError) {
    let note = err.notification();
    eprintln!(
        "\n  {} {}: {}",
        style("!").red().bold(),
        style(&note.title).red().bold(),
        note.description
    );
}

/// Convert a chat error into an `anyhow` error carrying the notification text.
pub fn notification_error(err: ChatError) -> anyhow::Error {
    let note = err.notification();
    anyhow::anyhow!("{}: {}", note.title, note.description)
}

pub fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let diff = chrono::Utc::now() - *dt;

    if diff.num_seconds() < 60 {
        "just now".to_string()
    } else if diff.num_minutes() < 60 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_hours() < 24 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send_with_images() {
        let cli = Cli::parse_from([
            "marca", "send", "0190f5d2-0000-7000-8000-000000000000", "hola", "--image", "a.png",
            "--image", "b.jpg",
        ]);
        match cli.command {
            Commands::Send { text, images, .. } => {
                assert_eq!(text, "hola");
                assert_eq!(images, vec![PathBuf::from("a.png"), PathBuf::from("b.jpg")]);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_parse_send_image_only() {
        let cli = Cli::parse_from(["marca", "send", "id", "--image", "a.png"]);
        match cli.command {
            Commands::Send { text, images, .. } => {
                assert!(text.is_empty());
                assert_eq!(images.len(), 1);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["marca", "list", "--json", "-vv", "--otel"]);
        assert!(cli.json);
        assert!(cli.otel);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_conversation_id() {
        let id = Uuid::now_v7();
        assert_eq!(parse_conversation_id(&format!(" {id} ")).unwrap(), id);
        assert!(parse_conversation_id("not-a-uuid").is_err());
    }

    #[tokio::test]
    async fn test_load_image_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        tokio::fs::write(&path, b"png-bytes").await.unwrap();

        let image = load_image(&path).await.unwrap();
        assert_eq!(image.name, "logo.png");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, b"png-bytes");
    }

    #[tokio::test]
    async fn test_load_image_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"text").await.unwrap();

        let err = load_image(&path).await.unwrap_err();
        assert!(err.to_string().contains("not an image"));
    }

    #[test]
    fn test_relative_time() {
        let now = chrono::Utc::now();
        assert_eq!(format_relative_time(&now), "just now");
        assert_eq!(format_relative_time(&(now - chrono::Duration::minutes(5))), "5m ago");
        assert_eq!(format_relative_time(&(now - chrono::Duration::hours(3))), "3h ago");
    }
}
