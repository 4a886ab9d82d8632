use thiserror::Error;

/// Failure taxonomy for camera acquisition and model loading.
///
/// Frame-not-ready is deliberately absent: a tick that finds no valid frame
/// is skipped, not failed (see `TickOutcome::SkippedNotReady`).
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The user or OS refused access to the capture device.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    /// The capture device is missing, busy, or already held by this process.
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The inference engine failed to load its model.
    #[error("model load failure: {0}")]
    ModelLoadFailure(String),

    /// An operation was requested in a state that does not permit it.
    #[error("invalid loop state for {operation}: {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}
