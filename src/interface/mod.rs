//! # Interface Layer
//!
//! Terminal-facing code: the REPL, slash command handlers and console output.

pub mod commands;
pub mod console;
pub mod repl;
