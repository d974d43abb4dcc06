//! One-shot conversation commands: new, list, delete, history, send.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use marca_core::chat::{ConversationRepository, Reply};
use marca_types::conversation::{Turn, TurnRole};

use crate::state::AppState;

use super::chat::loop_runner::{report_uploads, stream_turn};
use super::{format_relative_time, load_image, notification_error, parse_conversation_id};

pub async fn new_conversation(state: &AppState, title: Option<String>, json: bool) -> Result<()> {
    let handle = state
        .orchestrator
        .create_conversation(title)
        .await
        .map_err(notification_error)?;

    if json {
        println!("{}", serde_json::to_string_pretty(handle.conversation())?);
    } else {
        println!(
            "  {} Created '{}' {}",
            style("✓").green().bold(),
            handle.title(),
            style(handle.id()).dim()
        );
    }
    Ok(())
}

pub async fn list_conversations(state: &AppState, json: bool) -> Result<()> {
    let conversations = state
        .orchestrator
        .list_conversations()
        .await
        .map_err(notification_error)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversations)?);
        return Ok(());
    }

    if conversations.is_empty() {
        println!();
        println!(
            "  {} No conversations yet. Start one with: {}",
            style("i").blue().bold(),
            style("marca chat").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for conversation in &conversations {
        table.add_row(vec![
            Cell::new(conversation.id).fg(Color::DarkGrey),
            Cell::new(&conversation.title).fg(Color::Cyan),
            Cell::new(format_relative_time(&conversation.updated_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} conversation{}",
        style(conversations.len()).bold(),
        if conversations.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

pub async fn delete_conversation(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    let id = parse_conversation_id(id)?;
    let conversation = state
        .orchestrator
        .repo()
        .get_conversation(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("conversation {id} not found"))?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete '{}' with all its messages and images?",
                style(&conversation.title).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state
        .orchestrator
        .delete_conversation(&id)
        .await
        .map_err(notification_error)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": true, "id": id }));
    } else {
        println!(
            "  {} Conversation '{}' deleted.",
            style("✓").red().bold(),
            conversation.title
        );
    }
    Ok(())
}

pub async fn show_history(state: &AppState, id: &str, json: bool) -> Result<()> {
    let id = parse_conversation_id(id)?;
    let handle = state
        .orchestrator
        .open_conversation(&id)
        .await
        .map_err(notification_error)?;
    let turns = state
        .orchestrator
        .history(&handle)
        .await
        .map_err(notification_error)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&turns)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(handle.title()).cyan().bold());
    print_turns(&turns);
    Ok(())
}

/// Send one turn. In JSON mode the reply is printed once it settles;
/// otherwise it streams to stdout.
pub async fn send_turn(
    state: &AppState,
    id: &str,
    text: &str,
    image_paths: &[PathBuf],
    json: bool,
) -> Result<()> {
    let id = parse_conversation_id(id)?;

    let mut images = Vec::with_capacity(image_paths.len());
    for path in image_paths {
        images.push(load_image(path).await?);
    }

    let mut handle = state
        .orchestrator
        .open_conversation(&id)
        .await
        .map_err(notification_error)?;

    if json {
        let outcome = state
            .orchestrator
            .submit_turn(&mut handle, text, images)
            .await
            .map_err(notification_error)?;
        let (kind, reply) = match &outcome.reply {
            Reply::Streamed(turn) => ("streamed", Some(turn)),
            Reply::Scripted(turn) => ("scripted", Some(turn)),
            Reply::QuestionnaireComplete { turn, .. } => ("questionnaire_complete", Some(turn)),
            Reply::Superseded => ("superseded", None),
        };
        let body = serde_json::json!({
            "user_turn": outcome.user_turn,
            "reply_kind": kind,
            "reply": reply,
            "attempted_uploads": outcome.attempted_uploads,
            "upload_failures": outcome.upload_failures,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let interrupted = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let outcome = stream_turn(state, &mut handle, text, images, interrupted)
        .await
        .map_err(notification_error)?;
    report_uploads(&outcome);
    Ok(())
}

/// Print turns as a transcript.
pub fn print_turns(turns: &[Turn]) {
    println!();
    if turns.is_empty() {
        println!("  {}", style("No messages yet.").dim());
        println!();
        return;
    }

    for turn in turns {
        let label = match turn.role {
            TurnRole::User => style("You").green().bold(),
            TurnRole::Assistant => style("Marca").cyan().bold(),
        };
        println!(
            "  {} {}",
            label,
            style(turn.created_at.format("%Y-%m-%d %H:%M")).dim()
        );
        for line in turn.content.lines() {
            println!("    {line}");
        }
        for image in &turn.images {
            println!("    {} {}", style("[img]").magenta(), style(image).dim());
        }
        println!();
    }
}
