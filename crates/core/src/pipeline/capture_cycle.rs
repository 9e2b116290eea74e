use std::sync::Mutex;
use std::time::Instant;

use crate::capture::domain::camera::{Camera, CameraError};
use crate::detection::domain::detection_client::DetectionClient;
use crate::pipeline::cycle_event::{CycleError, CycleEvent, Stage};
use crate::preparation::domain::frame_preparer::FramePreparer;
use crate::shared::detection::Detection;
use crate::shared::frame::CapturedPhoto;

/// The three stages of one detection cycle: capture → prepare → submit.
///
/// Stages run strictly in sequence and report progress through `emit`. The
/// runner holds no session state; whoever owns the session applies the
/// events. Shareable across threads so a cycle can run off the owner thread.
pub struct CaptureCycle {
    camera: Mutex<Box<dyn Camera>>,
    preparer: Box<dyn FramePreparer>,
    client: Box<dyn DetectionClient>,
    target_width: u32,
}

impl CaptureCycle {
    pub fn new(
        camera: Box<dyn Camera>,
        preparer: Box<dyn FramePreparer>,
        client: Box<dyn DetectionClient>,
        target_width: u32,
    ) -> Self {
        Self {
            camera: Mutex::new(camera),
            preparer,
            client,
            target_width,
        }
    }

    /// Camera readiness signal. Never blocks: a camera that is busy capturing
    /// or whose lock is poisoned reads as not ready.
    pub fn camera_ready(&self) -> bool {
        self.camera
            .try_lock()
            .map(|camera| camera.is_ready())
            .unwrap_or(false)
    }

    /// Runs all stages, ending with exactly one `Finished` event.
    pub fn run(&self, emit: &mut dyn FnMut(CycleEvent)) {
        let result = self.run_stages(emit);
        emit(CycleEvent::Finished(result));
    }

    fn run_stages(
        &self,
        emit: &mut dyn FnMut(CycleEvent),
    ) -> Result<Vec<Detection>, CycleError> {
        let started = Instant::now();
        let photo = self.capture()?;
        emit(timed(Stage::Capture, started));
        emit(CycleEvent::Captured);

        let started = Instant::now();
        let frame = self.preparer.prepare(&photo, self.target_width)?;
        emit(timed(Stage::Prepare, started));
        emit(CycleEvent::Prepared(frame.dimensions()));

        let started = Instant::now();
        let detections = self.client.detect(&frame);
        emit(timed(Stage::Submit, started));
        Ok(detections?)
    }

    fn capture(&self) -> Result<CapturedPhoto, CameraError> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| CameraError::Capture("camera lock poisoned".into()))?;
        camera.capture()
    }
}

fn timed(stage: Stage, started: Instant) -> CycleEvent {
    CycleEvent::StageCompleted {
        stage,
        elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
    }
}
