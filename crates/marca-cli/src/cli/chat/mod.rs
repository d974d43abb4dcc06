//! Interactive terminal chat for Marca.
//!
//! Implements the chat loop: streamed replies rendered from the stream feed,
//! a thinking spinner, slash commands and the branding questionnaire.
//! Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
