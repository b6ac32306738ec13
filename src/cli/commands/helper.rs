use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{CommandKind, CommandResult, CommandSummary};
use crate::cli::args::{CommonArgs, SelectionArgs};
use crate::config::{Config, find_config_file, load_config};
use crate::core::{ForceRequest, SyncOptions};
use crate::issues::{Issue, Severity};

/// Project root and effective configuration for a command.
pub struct CommandContext {
    pub root: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// Load the config found from `--root` (or the working directory) and
    /// apply command-line overrides on top of it. Relative paths resolve
    /// against the directory holding the config file.
    pub fn load(common: &CommonArgs) -> Result<Self> {
        let start = match &common.root {
            Some(root) => root.clone(),
            None => env::current_dir().context("Failed to get current directory")?,
        };
        let root = find_config_file(&start)
            .and_then(|path| path.parent().map(Path::to_path_buf))
            .unwrap_or(start);
        let loaded = load_config(&root)?;
        let mut config = loaded.config;

        if let Some(locales_root) = &common.locales_root {
            config.locales_root = locales_root.clone();
        }
        if let Some(source_locale) = &common.source_locale {
            config.source_locale = source_locale.clone();
        }
        if let Some(pivot_locale) = &common.pivot_locale {
            config.pivot_locale = pivot_locale.clone();
        }
        config.validate()?;

        if common.verbose && !loaded.from_file {
            eprintln!("note: no config file found, using defaults");
        }

        Ok(Self { root, config })
    }
}

pub fn sync_options(selection: &SelectionArgs, dry_run: bool) -> SyncOptions {
    SyncOptions {
        force: ForceRequest {
            full: selection.full,
            paths: selection.force.clone(),
        },
        dry_run,
        prune: selection.prune.then_some(true),
        locales: selection.locales.clone(),
    }
}

/// Run an async engine call to completion on a current-thread runtime.
pub fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

pub fn finish(
    kind: CommandKind,
    summary: CommandSummary,
    mut issues: Vec<Issue>,
    pending_count: usize,
    exit_on_pending: bool,
) -> CommandResult {
    issues.sort();

    let mut error_count = issues
        .iter()
        .filter(|i| i.severity() == Severity::Error)
        .count();
    let warning_count = issues
        .iter()
        .filter(|i| i.severity() == Severity::Warning)
        .count();

    if let CommandSummary::Init(ref summary) = summary
        && summary.error.is_some()
    {
        error_count += 1;
    }

    CommandResult {
        kind,
        summary,
        error_count,
        warning_count,
        pending_count,
        exit_on_errors: true,
        exit_on_pending,
        issues,
    }
}
