use std::path::PathBuf;

use crate::core::SyncReport;
use crate::issues::Issue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Sync,
    Check,
    Init,
}

#[derive(Debug)]
pub enum CommandSummary {
    Sync(SyncReport),
    Check(SyncReport),
    Init(InitSummary),
}

#[derive(Debug)]
pub struct InitSummary {
    pub path: PathBuf,
    /// Set when the file already existed and was left alone.
    pub error: Option<String>,
}

/// Result of running locsync commands
#[derive(Debug)]
pub struct CommandResult {
    pub kind: CommandKind,
    pub summary: CommandSummary,
    pub error_count: usize,
    pub warning_count: usize,
    /// Leaves a sync would still translate, copy or prune.
    pub pending_count: usize,
    /// If true, exit code 1 is returned when there are errors.
    pub exit_on_errors: bool,
    /// If true, exit code 1 is returned when work is pending (`check`).
    pub exit_on_pending: bool,
    /// Issues collected during the run, sorted.
    pub issues: Vec<Issue>,
}
