//! Fatal startup failures and their exit codes

use std::process::ExitCode;

use crate::access::{CapabilityCheck, GRANT_GUIDANCE};
use crate::tap::TapError;

/// Exit status when an unclassified startup step fails
pub const EXIT_FAILURE: u8 = 1;
/// Exit status when Accessibility permission is missing
pub const EXIT_CAPABILITY_DENIED: u8 = 2;
/// Exit status when the OS refuses the event tap
pub const EXIT_TAP_CREATION_FAILED: u8 = 3;

/// Reasons the process refuses to run
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error("Accessibility permission required")]
    CapabilityDenied,

    #[error("Failed to create event tap: {0}")]
    TapCreationFailed(#[source] TapError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Failure {
    pub fn exit_code(&self) -> u8 {
        match self {
            Failure::CapabilityDenied => EXIT_CAPABILITY_DENIED,
            Failure::TapCreationFailed(_) => EXIT_TAP_CREATION_FAILED,
            Failure::Other(_) => EXIT_FAILURE,
        }
    }

    /// What the user can do about it, if anything
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Failure::CapabilityDenied => Some(GRANT_GUIDANCE),
            Failure::TapCreationFailed(TapError::Unsupported) => None,
            Failure::TapCreationFailed(_) => Some("Try running with sudo or check permissions"),
            Failure::Other(_) => None,
        }
    }
}

impl From<TapError> for Failure {
    fn from(e: TapError) -> Self {
        Failure::TapCreationFailed(e)
    }
}

impl From<&Failure> for ExitCode {
    fn from(failure: &Failure) -> Self {
        ExitCode::from(failure.exit_code())
    }
}

/// Refuse to continue unless interception is permitted
pub fn ensure_capability(check: &impl CapabilityCheck) -> Result<(), Failure> {
    if check.has_interception_capability() {
        Ok(())
    } else {
        Err(Failure::CapabilityDenied)
    }
}
