use crate::pipeline::cycle_event::{CycleError, CycleEvent};
use crate::shared::detection::Detection;
use crate::shared::dimensions::ImageDimensions;

/// Where the session is within a capture cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
    Preparing,
    Submitting,
}

/// The single piece of mutable state behind the capture pipeline.
///
/// Created once at startup and reset, never replaced, on each cycle.
/// `in_flight` holds from the moment a trigger is admitted until the cycle's
/// `Finished` event has been applied, and no trigger is admitted while it
/// holds. Detections and `last_error` are never both populated.
#[derive(Debug, Default)]
pub struct CaptureSession {
    state: CaptureState,
    in_flight: bool,
    last_error: Option<String>,
    detections: Vec<Detection>,
    source_dimensions: Option<ImageDimensions>,
    revision: u64,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// Size of the last frame actually sent; the space detections live in.
    pub fn source_dimensions(&self) -> Option<ImageDimensions> {
        self.source_dimensions
    }

    /// Bumped whenever `detections` or `source_dimensions` change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether a trigger would currently be admitted.
    pub fn can_trigger(&self, camera_ready: bool) -> bool {
        camera_ready && !self.in_flight && self.state == CaptureState::Idle
    }

    /// `Idle -> Capturing`. Returns `false`, changing nothing, when a cycle
    /// is already in flight or the camera is not ready.
    pub fn begin(&mut self, camera_ready: bool) -> bool {
        if !self.can_trigger(camera_ready) {
            return false;
        }
        self.in_flight = true;
        self.last_error = None;
        self.state = CaptureState::Capturing;
        true
    }

    /// Applies one progress event. Returns whether any observable field
    /// changed. Events that do not fit the current state are ignored.
    pub fn apply(&mut self, event: CycleEvent) -> bool {
        match event {
            CycleEvent::Captured => self.advance(CaptureState::Capturing, CaptureState::Preparing),
            CycleEvent::Prepared(dimensions) => {
                if !self.advance(CaptureState::Preparing, CaptureState::Submitting) {
                    return false;
                }
                self.source_dimensions = Some(dimensions);
                self.revision += 1;
                true
            }
            CycleEvent::StageCompleted { .. } => false,
            CycleEvent::Finished(result) => {
                if !self.in_flight {
                    log::warn!("Ignoring cycle result while idle");
                    return false;
                }
                match result {
                    Ok(detections) => self.succeed(detections),
                    Err(error) => self.fail(&error),
                }
                self.state = CaptureState::Idle;
                self.in_flight = false;
                self.revision += 1;
                true
            }
        }
    }

    fn advance(&mut self, from: CaptureState, to: CaptureState) -> bool {
        if self.state != from {
            log::warn!("Ignoring transition {from:?} -> {to:?} while {:?}", self.state);
            return false;
        }
        self.state = to;
        true
    }

    fn succeed(&mut self, detections: Vec<Detection>) {
        self.detections = detections;
        self.last_error = None;
    }

    fn fail(&mut self, error: &CycleError) {
        self.last_error = Some(error.to_string());
        self.detections.clear();
        // Only a failed preparation invalidates the frame geometry
        if matches!(error, CycleError::Preparation(_)) {
            self.source_dimensions = None;
        }
    }
}
