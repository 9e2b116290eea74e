use thiserror::Error;

use crate::shared::frame::{CapturedPhoto, PreparedFrame};

/// Failure to turn a captured photo into an uploadable frame.
#[derive(Error, Debug)]
pub enum PreparationError {
    #[error("image preparation failed: captured photo is empty")]
    EmptyCapture,
    #[error("image preparation failed: target width must be positive")]
    InvalidTargetWidth,
    #[error("image preparation failed: could not decode photo: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("image preparation failed: could not encode frame: {0}")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain interface for the resize/compress step.
///
/// The returned frame is never wider than `target_width`, keeps the photo's
/// aspect ratio, and reports the exact pixel size of its encoded payload.
pub trait FramePreparer: Send + Sync {
    fn prepare(
        &self,
        photo: &CapturedPhoto,
        target_width: u32,
    ) -> Result<PreparedFrame, PreparationError>;
}
