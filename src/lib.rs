//! # toolsmith
//!
//! A terminal coding agent for Ollama. Model responses are streamed, scanned
//! for action markup and the actions are applied to a working directory.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod strings;
