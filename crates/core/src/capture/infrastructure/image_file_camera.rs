use std::fs;
use std::path::PathBuf;

use crate::capture::domain::camera::{Camera, CameraError};
use crate::shared::frame::CapturedPhoto;

/// Adapts an image file on disk to the [`Camera`] interface.
///
/// Each capture re-reads the file, so replacing it between triggers behaves
/// like pointing the camera at a new scene. The camera is ready while the
/// file exists.
pub struct ImageFileCamera {
    path: PathBuf,
    captured: usize,
}

impl ImageFileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            captured: 0,
        }
    }
}

impl Camera for ImageFileCamera {
    fn is_ready(&self) -> bool {
        self.path.is_file()
    }

    fn capture(&mut self) -> Result<CapturedPhoto, CameraError> {
        if !self.is_ready() {
            return Err(CameraError::NotReady);
        }
        let data = fs::read(&self.path).map_err(|e| CameraError::Capture(Box::new(e)))?;
        let photo = CapturedPhoto::new(data, self.captured);
        self.captured += 1;
        log::debug!(
            "Captured photo #{} from {} ({} bytes)",
            photo.index(),
            self.path.display(),
            photo.data().len()
        );
        Ok(photo)
    }
}
