use crate::pipeline::capture_session::CaptureSession;
use crate::projection::coordinate_mapper::{project_detections, ProjectedDetection};
use crate::shared::dimensions::ImageDimensions;

/// Keeps the on-screen overlay in step with the session and the preview.
///
/// The layout collaborator writes the preview size through
/// [`set_destination`](Self::set_destination); [`refresh`](Self::refresh)
/// recomputes the projection whenever the preview size, the session's
/// detections, or its source dimensions have changed since the last call.
#[derive(Debug, Default)]
pub struct OverlayProjector {
    destination: ImageDimensions,
    projected: Vec<ProjectedDetection>,
    /// `(session revision, destination)` the current projection was built from.
    computed_for: Option<(u64, ImageDimensions)>,
}

impl OverlayProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the preview surface size from a layout pass. `{0, 0}` means
    /// unmeasured and suppresses projection.
    pub fn set_destination(&mut self, destination: ImageDimensions) {
        self.destination = destination;
    }

    /// Recomputes if any input changed. Returns whether it recomputed.
    pub fn refresh(&mut self, session: &CaptureSession) -> bool {
        let key = (session.revision(), self.destination);
        if self.computed_for == Some(key) {
            return false;
        }
        self.projected = project_detections(
            session.detections(),
            session.source_dimensions(),
            self.destination,
        );
        self.computed_for = Some(key);
        true
    }

    /// Refreshes, then returns the current overlay.
    pub fn project(&mut self, session: &CaptureSession) -> &[ProjectedDetection] {
        self.refresh(session);
        &self.projected
    }

    /// Last computed overlay, without refreshing.
    pub fn projected(&self) -> &[ProjectedDetection] {
        &self.projected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::cycle_event::CycleEvent;
    use crate::shared::detection::{BoundingBox, Detection};

    fn session_with(source: ImageDimensions, boxes: &[[f64; 4]]) -> CaptureSession {
        let detections = boxes
            .iter()
            .map(|&[x1, y1, x2, y2]| {
                Detection::new("pothole", 0.7, Some(BoundingBox::new(x1, y1, x2, y2).unwrap()))
                    .unwrap()
            })
            .collect();
        let mut session = CaptureSession::new();
        session.begin(true);
        session.apply(CycleEvent::Captured);
        session.apply(CycleEvent::Prepared(source));
        session.apply(CycleEvent::Finished(Ok(detections)));
        session
    }

    #[test]
    fn test_nothing_projected_before_layout() {
        let session = session_with(ImageDimensions::new(640, 360), &[[0.0, 0.0, 10.0, 10.0]]);
        let mut projector = OverlayProjector::new();
        assert!(projector.project(&session).is_empty());
    }

    #[test]
    fn test_nothing_projected_without_source() {
        let mut projector = OverlayProjector::new();
        projector.set_destination(ImageDimensions::new(320, 180));
        assert!(projector.project(&CaptureSession::new()).is_empty());
    }

    #[test]
    fn test_layout_change_recomputes() {
        let session = session_with(ImageDimensions::new(640, 360), &[[100.0, 100.0, 200.0, 200.0]]);
        let mut projector = OverlayProjector::new();

        projector.set_destination(ImageDimensions::new(320, 180));
        assert_eq!(
            projector.project(&session)[0].bbox.to_array(),
            [50.0, 50.0, 100.0, 100.0]
        );

        projector.set_destination(ImageDimensions::new(1280, 720));
        assert_eq!(
            projector.project(&session)[0].bbox.to_array(),
            [200.0, 200.0, 400.0, 400.0]
        );

        projector.set_destination(ImageDimensions::UNKNOWN);
        assert!(projector.project(&session).is_empty());
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let session = session_with(ImageDimensions::new(640, 360), &[[1.0, 2.0, 3.0, 4.0]]);
        let mut projector = OverlayProjector::new();
        projector.set_destination(ImageDimensions::new(300, 300));

        assert!(projector.refresh(&session));
        let first = projector.projected().to_vec();
        assert!(!projector.refresh(&session));
        assert_eq!(projector.projected(), first.as_slice());
    }

    #[test]
    fn test_session_change_recomputes() {
        let mut projector = OverlayProjector::new();
        projector.set_destination(ImageDimensions::new(320, 180));

        let mut session = session_with(ImageDimensions::new(640, 360), &[[0.0, 0.0, 64.0, 36.0]]);
        assert_eq!(projector.project(&session).len(), 1);

        session.begin(true);
        session.apply(CycleEvent::Captured);
        session.apply(CycleEvent::Prepared(ImageDimensions::new(640, 360)));
        session.apply(CycleEvent::Finished(Err(
            crate::pipeline::cycle_event::CycleError::Aborted,
        )));
        assert!(projector.refresh(&session));
        assert!(projector.projected().is_empty());
    }
}
