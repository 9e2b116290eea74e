use std::collections::HashMap;

use crate::pipeline::cycle_event::Stage;

/// Observer for capture-cycle events.
///
/// Keeps the pipeline free of any particular output mechanism: the CLI logs
/// through the `log` crate, tests discard everything.
pub trait CycleLogger: Send {
    /// Record how long one stage of a cycle took.
    fn timing(&mut self, stage: Stage, duration_ms: f64);

    /// A cycle finished; `error` is its failure message, if any.
    fn cycle_finished(&mut self, detections: usize, error: Option<&str>);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit a summary over all cycles seen so far. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullCycleLogger;

impl CycleLogger for NullCycleLogger {
    fn timing(&mut self, _stage: Stage, _duration_ms: f64) {}
    fn cycle_finished(&mut self, _detections: usize, _error: Option<&str>) {}
    fn info(&mut self, _message: &str) {}
}

/// Logs through the `log` crate and keeps per-stage timings for a summary.
#[derive(Default)]
pub struct TimingCycleLogger {
    timings: HashMap<Stage, Vec<f64>>,
    cycles: usize,
    failures: usize,
    detections: usize,
}

impl TimingCycleLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the formatted summary, or `None` if no cycle finished yet.
    pub fn summary_string(&self) -> Option<String> {
        if self.cycles == 0 {
            return None;
        }

        let mut lines = vec![format!(
            "Capture summary ({} cycles, {} failed, {} detections):",
            self.cycles, self.failures, self.detections
        )];
        for stage in [Stage::Capture, Stage::Prepare, Stage::Submit] {
            let Some(durations) = self.timings.get(&stage) else {
                continue;
            };
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len() as f64;
            let name = stage.name();
            lines.push(format!(
                "  {name:8}: avg {avg_ms:7.1}ms  total {total_ms:8.0}ms  ({} runs)",
                durations.len()
            ));
        }
        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: Stage) -> Option<&[f64]> {
        self.timings.get(&stage).map(|v| v.as_slice())
    }
}

impl CycleLogger for TimingCycleLogger {
    fn timing(&mut self, stage: Stage, duration_ms: f64) {
        log::debug!("{} took {duration_ms:.1}ms", stage.name());
        self.timings.entry(stage).or_default().push(duration_ms);
    }

    fn cycle_finished(&mut self, detections: usize, error: Option<&str>) {
        self.cycles += 1;
        match error {
            Some(message) => {
                self.failures += 1;
                log::warn!("Capture cycle failed: {message}");
            }
            None => {
                self.detections += detections;
                log::info!("Capture cycle finished with {detections} detections");
            }
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
