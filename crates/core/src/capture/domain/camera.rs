use thiserror::Error;

use crate::shared::frame::CapturedPhoto;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera is not ready")]
    NotReady,
    #[error("camera capture failed: {0}")]
    Capture(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain interface for the device camera.
///
/// `is_ready` is the readiness signal the capture pipeline checks before it
/// admits a trigger. `capture` may still fail afterwards.
pub trait Camera: Send {
    fn is_ready(&self) -> bool;

    fn capture(&mut self) -> Result<CapturedPhoto, CameraError>;
}
