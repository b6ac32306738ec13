use anyhow::{Context, Result};

use super::super::args::SyncCommand;
use super::helper::{CommandContext, block_on, finish, sync_options};
use super::{CommandKind, CommandResult, CommandSummary};
use crate::core::Synchronizer;
use crate::provider::build_provider;

pub fn sync(cmd: SyncCommand) -> Result<CommandResult> {
    let args = &cmd.args;
    let mut ctx = CommandContext::load(&args.common)?;
    if let Some(provider) = args.provider {
        ctx.config.provider = provider;
    }
    if let Some(concurrency) = args.concurrency {
        ctx.config.concurrency = concurrency;
    }

    let options = sync_options(&args.selection, args.dry_run);
    let provider_kind = ctx.config.provider;
    let synchronizer = Synchronizer::new(&ctx.root, ctx.config)?;

    let report = if args.dry_run {
        block_on(synchronizer.plan(&options))??
    } else {
        // Credentials are checked before any file is touched.
        let translator = build_provider(provider_kind, synchronizer.config())
            .with_context(|| format!("Failed to configure provider '{}'", provider_kind))?;
        block_on(synchronizer.run(translator, &options))??
    };

    let issues = report.issues.clone();
    let pending = report.pending_count();
    Ok(finish(
        CommandKind::Sync,
        CommandSummary::Sync(report),
        issues,
        pending,
        false,
    ))
}
