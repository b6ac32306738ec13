use anyhow::Result;

use super::super::args::CheckCommand;
use super::helper::{CommandContext, block_on, finish, sync_options};
use super::{CommandKind, CommandResult, CommandSummary};
use crate::core::Synchronizer;

/// Dry-run sync used as a CI gate: nothing is translated or written.
pub fn check(cmd: CheckCommand) -> Result<CommandResult> {
    let args = &cmd.args;
    let ctx = CommandContext::load(&args.common)?;
    let options = sync_options(&args.selection, true);
    let synchronizer = Synchronizer::new(&ctx.root, ctx.config)?;

    let report = block_on(synchronizer.plan(&options))??;

    let issues = report.issues.clone();
    let pending = report.pending_count();
    Ok(finish(
        CommandKind::Check,
        CommandSummary::Check(report),
        issues,
        pending,
        true,
    ))
}
