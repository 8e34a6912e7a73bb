//! Chatoyer is a terminal chat client that streams replies from an
//! OpenAI-compatible API and can re-render any finished reply in your target
//! language, in one of five tones.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state: the message log, the streaming session, the
//!   translation requests, and the action reducer that ties them together.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`api`] defines the chat-completion payloads shared by the streaming and
//!   translation services.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions.

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
