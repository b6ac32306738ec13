use std::process::ExitCode;

use super::commands::CommandResult;

/// Process exit status.
///
/// - `Success` (0): everything synced, or nothing pending
/// - `Failure` (1): leaf or language failures, or `check` found pending work
/// - `Error` (2): the run could not start or was aborted (config, source, credentials)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}

impl From<&CommandResult> for ExitStatus {
    fn from(result: &CommandResult) -> Self {
        let failed = result.exit_on_errors && result.error_count > 0;
        let pending = result.exit_on_pending && result.pending_count > 0;
        if failed || pending {
            ExitStatus::Failure
        } else {
            ExitStatus::Success
        }
    }
}
