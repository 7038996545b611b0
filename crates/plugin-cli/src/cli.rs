//! Output format and exit status shared by every command.

use clap::ValueEnum;

/// How command results are printed on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON for machine parsing
    Json,
    /// Indented plain text for scripts
    Text,
    /// Colored text for terminals
    #[default]
    Pretty,
}

/// Outcome of a command, mapped onto the process exit status.
///
/// Errors that stop a command before it produces a result (bad flags,
/// unreadable configuration) surface as `anyhow` errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// The command completed (status 0).
    Success,
    /// A reconciliation pass ran but failed (status 1).
    PassFailed,
}

impl ExitCode {
    /// Returns `true` for [`ExitCode::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::PassFailed => Self::FAILURE,
        }
    }
}
