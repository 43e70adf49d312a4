use thiserror::Error;

use crate::tmux::DriverError;

/// Failures of the bridge operations, one variant per way an operation can fail.
///
/// Display strings are what the HTTP layer puts in the `error` field.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Status check timeout")]
    SessionCheckTimeout,

    #[error("Failed to check tmux session: {0}")]
    SessionCheck(#[source] DriverError),

    #[error("Session creation timeout")]
    SessionCreationTimeout,

    #[error("Failed to create tmux session: {0}")]
    SessionCreation(#[source] DriverError),

    #[error("Session restart timeout")]
    RestartTimeout,

    #[error("Failed to restart session: {0}")]
    Restart(#[source] DriverError),

    #[error("Command timeout")]
    CommandTimeout,

    #[error("Failed to send command: {0}")]
    CommandDispatch(#[source] DriverError),

    #[error("Output capture timeout")]
    CaptureTimeout,

    #[error("Failed to capture output: {0}")]
    Capture(#[source] DriverError),

    #[error("Status check timeout")]
    StatusTimeout,

    #[error("Failed to check session status: {0}")]
    Status(#[source] DriverError),
}

impl BridgeError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            BridgeError::SessionCheckTimeout
                | BridgeError::SessionCreationTimeout
                | BridgeError::RestartTimeout
                | BridgeError::CommandTimeout
                | BridgeError::CaptureTimeout
                | BridgeError::StatusTimeout
        )
    }

    /// Map a driver error onto a timeout variant or a wrapping variant.
    pub(crate) fn classify(
        err: DriverError,
        timeout: BridgeError,
        wrap: fn(DriverError) -> BridgeError,
    ) -> BridgeError {
        if err.is_timeout() {
            timeout
        } else {
            wrap(err)
        }
    }
}
