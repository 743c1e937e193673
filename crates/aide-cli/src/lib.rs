//! CLI for the aide assistant suite: argument parsing, roster wiring, and
//! the chat REPL.

pub mod assistants;
pub mod chat;
pub mod cli;
