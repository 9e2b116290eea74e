use thiserror::Error;

use crate::capture::domain::camera::CameraError;
use crate::detection::domain::detection_client::DetectionError;
use crate::preparation::domain::frame_preparer::PreparationError;
use crate::shared::detection::Detection;
use crate::shared::dimensions::ImageDimensions;

/// Any failure that ends a capture cycle early.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Preparation(#[from] PreparationError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    /// The worker running the cycle stopped without reporting a result.
    #[error("capture cycle ended unexpectedly")]
    Aborted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Capture,
    Prepare,
    Submit,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Capture => "capture",
            Stage::Prepare => "prepare",
            Stage::Submit => "submit",
        }
    }
}

/// Progress reported by a running cycle, in the order it happens.
///
/// Every cycle ends with exactly one `Finished`.
#[derive(Debug)]
pub enum CycleEvent {
    /// The camera produced a photo; preparation starts.
    Captured,
    /// The photo was encoded at these dimensions; submission starts.
    Prepared(ImageDimensions),
    StageCompleted { stage: Stage, elapsed_ms: f64 },
    Finished(Result<Vec<Detection>, CycleError>),
}
