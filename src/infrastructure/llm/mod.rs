//! # LLM Transport
//!
//! HTTP access to an Ollama server.

pub mod client;
pub mod lines;
pub mod params;
pub mod types;

pub use client::OllamaClient;
pub use params::ModelParameters;
