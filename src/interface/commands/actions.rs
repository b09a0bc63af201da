//! # Action Commands
//!
//! Handles `/pending` and `/execute`.

use anyhow::Result;

use crate::domain::signal::AbortSignal;
use crate::interface::commands::CommandContext;
use crate::strings::messages;

pub fn handle_pending(ctx: &CommandContext) -> Result<()> {
    let pending = ctx.session.pending();
    if pending.is_empty() {
        ctx.console.say(messages::NO_PENDING);
    } else {
        ctx.console
            .actions(&messages::pending_actions(pending.len()), pending.actions());
    }
    Ok(())
}

pub async fn handle_execute(ctx: &mut CommandContext, abort: &mut AbortSignal) -> Result<()> {
    if ctx.session.pending().is_empty() {
        ctx.console.say(messages::NO_PENDING);
        return Ok(());
    }

    ctx.console.blank();
    ctx.console.say(messages::EXECUTING_PENDING);
    if let Some(report) = ctx.session.execute_pending(abort).await {
        ctx.console.report(&report);
    }
    Ok(())
}
