//! SAS CLI - sign, verify and manage mesh identities from the command line
//!
//! The CLI has no mesh transport of its own, so it verifies against an
//! explicit signing public key only.

pub mod cli;

pub use cli::Cli;

use sas_core::ErrorKind;

/// Exit codes for CLI operations
///
/// - 0: Success - operation completed, or the signature verified
/// - 1: General error - unspecified error occurred
/// - 2: Verification failed - the signature did not verify
/// - 5: Invalid input - bad arguments or data provided
/// - 6: Identity not found - no such SID in the unlocked keyring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Signature did not verify (exit code 2)
    VerificationFailed = 2,
    /// Invalid input provided (exit code 5)
    InvalidInput = 5,
    /// Identity not found (exit code 6)
    IdentityNotFound = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ErrorKind> for ExitCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidInput | ErrorKind::MalformedInput => ExitCode::InvalidInput,
            ErrorKind::IdentityNotFound => ExitCode::IdentityNotFound,
            ErrorKind::VerificationFailure => ExitCode::VerificationFailed,
            _ => ExitCode::GeneralError,
        }
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    /// Get the exit code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::VerificationFailed => "VERIFICATION_FAILED",
            ExitCode::InvalidInput => "INVALID_INPUT",
            ExitCode::IdentityNotFound => "IDENTITY_NOT_FOUND",
        }
    }
}
