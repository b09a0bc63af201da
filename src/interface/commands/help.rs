//! # Help Command
//!
//! Handles `/help`.

use crate::interface::console::Console;
use anyhow::Result;

pub fn handle_help(console: &Console) -> Result<()> {
    console.blank();
    console.say(crate::strings::help::COMMANDS);
    Ok(())
}
