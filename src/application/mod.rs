//! # Application Layer
//!
//! Core logic: stream reassembly, action extraction and validation, batch
//! execution, and the session that ties them together.

pub mod engine;
pub mod logging;
pub mod parsing;
pub mod prompts;
pub mod router;
pub mod session;
pub mod state;
pub mod stream;
pub mod validation;
