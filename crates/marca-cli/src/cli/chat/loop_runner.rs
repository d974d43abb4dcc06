//! Main chat loop.
//!
//! Opens or creates a conversation, then reads lines until EOF. Slash
//! commands are handled locally; every other line becomes a user turn whose
//! reply is rendered from the conversation's stream feed while it arrives.

use std::future::Future;
use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use marca_core::chat::{ConversationHandle, Reply, TurnOutcome};
use marca_types::error::ChatError;
use marca_types::image::ImageAttachment;

use crate::cli::conversation::print_turns;
use crate::cli::{load_image, notification_error, parse_conversation_id, print_notification};
use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::{
    StreamPrinter, indent_continuation, print_assistant_label, print_assistant_message,
    print_fragment,
};

/// Spinner shown until the first streamed text arrives.
fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Submit one turn and render its reply as it streams.
///
/// The conversation's feed is watched while the turn is in flight; each
/// update prints only the text appended since the last one. Scripted
/// questionnaire replies are printed whole once the turn completes. When
/// `cancel` resolves first the stream is superseded and its reply discarded.
pub async fn stream_turn(
    state: &AppState,
    handle: &mut ConversationHandle,
    text: &str,
    images: Vec<ImageAttachment>,
    cancel: impl Future<Output = ()>,
) -> Result<TurnOutcome, ChatError> {
    let feed = Arc::clone(handle.feed());
    let mut rx = feed.subscribe();
    rx.borrow_and_update();

    let spinner = thinking_spinner();
    let mut printer = StreamPrinter::new();

    let submit = state.orchestrator.submit_turn(handle, text, images);
    tokio::pin!(submit);
    tokio::pin!(cancel);
    let mut cancelled = false;

    let result = loop {
        tokio::select! {
            result = &mut submit => break result,
            () = &mut cancel, if !cancelled => {
                cancelled = true;
                debug!(generation = feed.supersede(), "reply cancelled by user");
            }
            Ok(()) = rx.changed() => {
                let snapshot = rx.borrow_and_update().clone();
                let first = !printer.has_output();
                if let Some(fragment) = printer.update(&snapshot) {
                    if first {
                        spinner.finish_and_clear();
                        print_assistant_label();
                    }
                    print_fragment(&indent_continuation(&fragment));
                }
            }
        }
    };
    spinner.finish_and_clear();
    let started = printer.has_output();

    match &result {
        Ok(outcome) => match &outcome.reply {
            Reply::Streamed(turn) => {
                if !started {
                    print_assistant_label();
                }
                if let Some(rest) = printer.finish(&turn.content) {
                    print_fragment(&indent_continuation(&rest));
                }
                println!();
                println!();
            }
            Reply::Scripted(turn) | Reply::QuestionnaireComplete { turn, .. } => {
                print_assistant_message(&turn.content);
            }
            Reply::Superseded => {
                if started {
                    println!();
                }
                println!("  {}", style("(reply discarded)").dim());
            }
        },
        Err(_) if started => println!(),
        Err(_) => {}
    }

    result
}

/// Warn about images that could not be stored.
pub fn report_uploads(outcome: &TurnOutcome) {
    if outcome.all_uploads_failed() {
        eprintln!(
            "  {} Images could not be saved. They were still sent to the assistant.",
            style("!").yellow().bold()
        );
    } else if outcome.upload_failures > 0 {
        eprintln!(
            "  {} {} of {} images could not be saved.",
            style("!").yellow().bold(),
            outcome.upload_failures,
            outcome.attempted_uploads
        );
    }
}

fn prompt_for(pending: usize) -> String {
    if pending == 0 {
        format!("  {} ", style("You >").green().bold())
    } else {
        format!(
            "  {} {} ",
            style(format!("[{pending} img]")).magenta(),
            style("You >").green().bold()
        )
    }
}

fn print_banner(state: &AppState, handle: &ConversationHandle) {
    print_welcome_banner(
        handle.title(),
        &handle.id().to_string(),
        state.config.backend_url.as_deref(),
    );
}

/// Run the interactive chat loop, resuming `id` when given.
pub async fn run_chat_loop(state: &AppState, id: Option<&str>) -> anyhow::Result<()> {
    let orchestrator = &state.orchestrator;

    let mut handle = match id {
        Some(raw) => orchestrator
            .open_conversation(&parse_conversation_id(raw)?)
            .await
            .map_err(notification_error)?,
        None => orchestrator
            .create_conversation(None)
            .await
            .map_err(notification_error)?,
    };

    print_banner(state, &handle);
    if handle.turn_count() > 0 {
        println!(
            "  {}",
            style(format!(
                "{} earlier turns. Type /history to show them.",
                handle.turn_count()
            ))
            .dim()
        );
        println!();
    }

    let (mut chat_input, _writer) = ChatInput::new(prompt_for(0))
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;
    let mut pending: Vec<ImageAttachment> = Vec::new();

    loop {
        let text = match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) => text,
        };

        if text.is_empty() && pending.is_empty() {
            continue;
        }

        if let Some(cmd) = commands::parse(&text) {
            match cmd {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Clear => chat_input.clear(),
                ChatCommand::Exit => {
                    println!("\n  {}", style("Session ended.").dim());
                    break;
                }
                ChatCommand::New => match orchestrator.create_conversation(None).await {
                    Ok(fresh) => {
                        handle = fresh;
                        pending.clear();
                        chat_input.update_prompt(&prompt_for(0));
                        print_banner(state, &handle);
                    }
                    Err(e) => print_notification(&e),
                },
                ChatCommand::Branding => match orchestrator.start_questionnaire(&mut handle).await {
                    Ok(question) => print_assistant_message(&question.content),
                    Err(e) => print_notification(&e),
                },
                ChatCommand::History => match orchestrator.history(&handle).await {
                    Ok(turns) => print_turns(&turns),
                    Err(e) => print_notification(&e),
                },
                ChatCommand::Attach(path) => match load_image(&path).await {
                    Ok(image) => {
                        println!(
                            "\n  {} Attached {}\n",
                            style("+").magenta().bold(),
                            style(&image.name).dim()
                        );
                        pending.push(image);
                        chat_input.update_prompt(&prompt_for(pending.len()));
                    }
                    Err(e) => println!("\n  {} {e}\n", style("!").red().bold()),
                },
                ChatCommand::Unknown(name) => {
                    println!(
                        "\n  {} Unknown command: {}. Type /help for available commands.\n",
                        style("?").yellow().bold(),
                        style(name).dim()
                    );
                }
            }
            continue;
        }

        let images = std::mem::take(&mut pending);
        // Ctrl+C at the empty prompt cancels the reply in flight.
        chat_input.update_prompt("");
        let turn = stream_turn(state, &mut handle, &text, images, chat_input.interrupted()).await;
        chat_input.update_prompt(&prompt_for(0));

        match turn {
            Ok(outcome) => {
                report_uploads(&outcome);
                if let Reply::QuestionnaireComplete { answers, .. } = &outcome.reply {
                    info!(
                        conversation_id = %handle.id(),
                        answers = answers.len(),
                        "branding questionnaire finished"
                    );
                }
            }
            Err(e) => {
                print_notification(&e);
                eprintln!("  {}", style("Type a message to retry, /exit to quit.").dim());
            }
        }
    }

    Ok(())
}
