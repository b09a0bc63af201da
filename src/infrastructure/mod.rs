//! # Infrastructure Layer
//!
//! Handles interactions with external systems: the generation backend over HTTP,
//! the filesystem and child processes.

pub mod llm;
pub mod tools;
