//! # Tools Module
//!
//! In-process filesystem and terminal access, scoped to one working directory.

pub mod executor;
