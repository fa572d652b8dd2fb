//! Error types for capture pipeline operations.

use crate::camera::CameraError;

use super::CaptureState;

/// Errors that can occur during capture pipeline operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// Operation called from a state that does not allow it
    #[error("Cannot {operation} while capture pipeline is {state}")]
    IllegalState {
        operation: &'static str,
        state: CaptureState,
    },
    /// The camera device failed
    #[error(transparent)]
    Camera(#[from] CameraError),
    /// The sampled frame could not be turned into an image artifact
    #[error("Failed to encode captured frame: {0}")]
    Encode(String),
}

impl CaptureError {
    /// True for failures the user can recover from by asking for the camera
    /// again (no camera, access declined, stream failure).
    pub fn is_device_error(&self) -> bool {
        matches!(self, CaptureError::Camera(_))
    }
}
