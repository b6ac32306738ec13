//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `sync`: translate changed leaves from the source through the pivot
//! - `check`: report pending work without calling a provider (CI gate)
//! - `init`: write a default `.locsyncrc.json`

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::provider::ProviderKind;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Sync(cmd)) => cmd.args.common.verbose,
            Some(Command::Check(cmd)) => cmd.args.common.verbose,
            Some(Command::Init(cmd)) => cmd.verbose,
            None => false,
        }
    }
}

/// Common arguments shared by `sync` and `check`.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Project directory holding `.locsyncrc.json` (default: current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Locales directory (overrides config file)
    #[arg(long)]
    pub locales_root: Option<String>,

    /// Source locale (overrides config file)
    #[arg(long)]
    pub source_locale: Option<String>,

    /// Pivot locale (overrides config file)
    #[arg(long)]
    pub pivot_locale: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments selecting which leaves are considered changed.
#[derive(Debug, Clone, Args)]
pub struct SelectionArgs {
    /// Retranslate every leaf regardless of change state
    #[arg(long)]
    pub full: bool,

    /// Retranslate the leaves under a dotted path (repeatable)
    #[arg(long = "force", value_name = "PATH")]
    pub force: Vec<String>,

    /// Remove target keys that no longer exist upstream
    #[arg(long)]
    pub prune: bool,

    /// Only process these target locales in the pivot-to-target phase (repeatable)
    #[arg(long = "locale", value_name = "LOCALE")]
    pub locales: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct SyncArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Show what would be translated without calling a provider or writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Translation provider (overrides config file)
    #[arg(long, value_enum, env = "LOCSYNC_PROVIDER")]
    pub provider: Option<ProviderKind>,

    /// Leaves translated in parallel within one language (overrides config file)
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(flatten)]
    pub args: SyncArgs,
}

#[derive(Debug, Parser)]
pub struct CheckArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[derive(Debug, Args)]
pub struct CheckCommand {
    #[command(flatten)]
    pub args: CheckArgs,
}

#[derive(Debug, Args)]
pub struct InitCommand {
    /// Directory to create the config file in (default: current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Translate new and changed keys from the source locale into every target
    Sync(SyncCommand),
    /// Report keys that a sync would translate; exits 1 when any are pending
    Check(CheckCommand),
    /// Initialize a new .locsyncrc.json configuration file
    Init(InitCommand),
}
