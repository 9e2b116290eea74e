use crate::pipeline::capture_cycle::CaptureCycle;
use crate::pipeline::capture_session::CaptureSession;
use crate::pipeline::cycle_event::CycleEvent;
use crate::pipeline::cycle_logger::CycleLogger;

/// Runs capture cycles inline on the caller's thread: trigger → capture →
/// prepare → submit → session update.
///
/// The session is passed in by its owner rather than held here, so the same
/// session can be observed by the overlay projector between triggers.
pub struct CapturePipeline {
    cycle: CaptureCycle,
    logger: Box<dyn CycleLogger>,
}

impl CapturePipeline {
    pub fn new(cycle: CaptureCycle, logger: Box<dyn CycleLogger>) -> Self {
        Self { cycle, logger }
    }

    pub fn camera_ready(&self) -> bool {
        self.cycle.camera_ready()
    }

    /// Attempts one cycle. Returns `false` without touching the session when
    /// the trigger is not admitted (cycle in flight or camera not ready).
    pub fn trigger(&mut self, session: &mut CaptureSession) -> bool {
        if session.is_in_flight() || !session.begin(self.cycle.camera_ready()) {
            log::debug!("Trigger ignored: in flight or camera not ready");
            return false;
        }
        let logger = &mut self.logger;
        self.cycle.run(&mut |event| {
            apply_event(session, &mut **logger, event);
        });
        true
    }
}

/// Applies one event to the session and reports it to the logger.
pub(crate) fn apply_event(
    session: &mut CaptureSession,
    logger: &mut dyn CycleLogger,
    event: CycleEvent,
) -> bool {
    match &event {
        CycleEvent::StageCompleted { stage, elapsed_ms } => logger.timing(*stage, *elapsed_ms),
        CycleEvent::Prepared(dimensions) => {
            logger.info(&format!("Frame prepared at {dimensions}"));
        }
        _ => {}
    }
    let finished = matches!(event, CycleEvent::Finished(_));
    let changed = session.apply(event);
    if finished && changed {
        logger.cycle_finished(session.detections().len(), session.last_error());
    }
    changed
}
