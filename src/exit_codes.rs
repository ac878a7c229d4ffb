//! Process exit codes for the apicli binary.
//!
//! The engine itself only reports terminal states; mapping them onto exit
//! codes is the binary's choice. Codes follow the BSD sysexits.h
//! conventions where one fits, with custom codes above 100.

use crate::app::{CliError, RunState};
use crate::request::DispatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppExitCode {
    /// Success (0) - help displayed or request dispatched
    Success = 0,

    /// Command line usage error (64) - resolution failed, help was shown
    UsageError = 64,

    /// Data format error (65) - local input or output data was incorrect
    DataError = 65,

    /// Internal software error (70) - unexpected application error
    SoftwareError = 70,

    /// Configuration error (78) - catalog or config file issue
    ConfigError = 78,

    /// Network error (101) - the outbound API call failed
    NetworkError = 101,
}

impl AppExitCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl From<AppExitCode> for i32 {
    fn from(code: AppExitCode) -> Self {
        code.code()
    }
}

/// Map the outcome of `App::run` onto an exit code.
pub fn for_result(result: &Result<RunState, CliError>) -> AppExitCode {
    match result {
        Ok(RunState::HelpDisplayed) | Ok(RunState::Dispatched(_)) => AppExitCode::Success,
        Ok(RunState::ResolutionFailed) => AppExitCode::UsageError,
        Err(CliError::Prompt(_)) => AppExitCode::SoftwareError,
        Err(CliError::Dispatch(DispatchError::Transport(_))) => AppExitCode::NetworkError,
        Err(CliError::Dispatch(_)) => AppExitCode::DataError,
    }
}
