use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, TryRecvError};

use crate::pipeline::capture_cycle::CaptureCycle;
use crate::pipeline::capture_pipeline::apply_event;
use crate::pipeline::capture_session::CaptureSession;
use crate::pipeline::cycle_event::{CycleError, CycleEvent};
use crate::pipeline::cycle_logger::CycleLogger;

/// Hosts the capture pipeline for an interactive shell.
///
/// An admitted cycle runs on a worker thread and streams its progress over a
/// channel; the session is only mutated here, on the owner's thread, when
/// the owner calls [`poll`](Self::poll) or [`wait`](Self::wait). The owner
/// stays free to handle layout changes while a cycle waits on I/O.
///
/// Triggers arriving mid-cycle are dropped, never queued. There is no
/// cancellation: dropping the controller waits for an in-flight cycle.
pub struct CaptureController {
    cycle: Arc<CaptureCycle>,
    session: CaptureSession,
    logger: Box<dyn CycleLogger>,
    events: Option<Receiver<CycleEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl CaptureController {
    pub fn new(cycle: CaptureCycle, logger: Box<dyn CycleLogger>) -> Self {
        Self {
            cycle: Arc::new(cycle),
            session: CaptureSession::new(),
            logger,
            events: None,
            worker: None,
        }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn logger(&self) -> &dyn CycleLogger {
        self.logger.as_ref()
    }

    pub fn camera_ready(&self) -> bool {
        self.cycle.camera_ready()
    }

    /// Whether the trigger affordance should be enabled right now.
    pub fn can_trigger(&self) -> bool {
        !self.session.is_in_flight() && self.session.can_trigger(self.camera_ready())
    }

    /// Starts a cycle if the session admits one. Returns whether it started.
    pub fn trigger(&mut self) -> bool {
        // A cycle that already finished must release the guard first
        self.poll();
        if self.session.is_in_flight() || !self.session.begin(self.cycle.camera_ready()) {
            log::debug!("Trigger dropped: cycle in flight or camera not ready");
            return false;
        }

        let (tx, rx) = crossbeam_channel::unbounded::<CycleEvent>();
        let cycle = Arc::clone(&self.cycle);
        self.worker = Some(thread::spawn(move || {
            cycle.run(&mut |event| {
                let _ = tx.send(event);
            });
        }));
        self.events = Some(rx);
        true
    }

    /// Applies every event the worker has produced so far, without blocking.
    /// Returns whether the session changed.
    pub fn poll(&mut self) -> bool {
        self.pump(false)
    }

    /// Blocks until the in-flight cycle, if any, has finished and been
    /// applied. Returns whether the session changed.
    pub fn wait(&mut self) -> bool {
        self.pump(true)
    }

    fn pump(&mut self, blocking: bool) -> bool {
        let Some(rx) = self.events.take() else {
            return false;
        };

        let mut changed = false;
        loop {
            let next = if blocking {
                rx.recv().map_err(|_| TryRecvError::Disconnected)
            } else {
                rx.try_recv()
            };
            match next {
                Ok(event) => {
                    let finished = matches!(event, CycleEvent::Finished(_));
                    changed |= apply_event(&mut self.session, &mut *self.logger, event);
                    if finished {
                        self.join_worker();
                        return changed;
                    }
                }
                Err(TryRecvError::Empty) => {
                    self.events = Some(rx);
                    return changed;
                }
                Err(TryRecvError::Disconnected) => {
                    log::error!("Capture worker exited without a result");
                    let aborted = CycleEvent::Finished(Err(CycleError::Aborted));
                    changed |= apply_event(&mut self.session, &mut *self.logger, aborted);
                    self.join_worker();
                    return changed;
                }
            }
        }
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("Capture worker panicked");
            }
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.join_worker();
    }
}
