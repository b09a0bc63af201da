//! # Strings Module
//!
//! Centralizes user-facing text and log messages.

pub mod help;
pub mod logs;
pub mod messages;
