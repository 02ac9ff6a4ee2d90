//! Search progress reporting.

use tracing::info;

/// Receives advisory progress while a search runs.
///
/// Percentages are deltas; a run reports roughly 100 in total. Nothing in
/// the session depends on what the sink does.
pub trait ProgressSink: Send {
    fn report(&mut self, phase: &str, percent_delta: f32);
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _phase: &str, _percent_delta: f32) {}
}

/// Logs progress with `tracing`.
#[derive(Debug, Default)]
pub struct TracingProgress {
    total: f32,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for TracingProgress {
    fn report(&mut self, phase: &str, percent_delta: f32) {
        self.total = (self.total + percent_delta).min(100.0);
        info!(phase, percent = self.total, "search progress");
    }
}

/// Records every report, for inspection.
impl ProgressSink for Vec<(String, f32)> {
    fn report(&mut self, phase: &str, percent_delta: f32) {
        self.push((phase.to_string(), percent_delta));
    }
}

/// Tracks what has been reported so the final step tops up to 100.
pub(crate) struct PhaseReporter<'a> {
    sink: &'a mut dyn ProgressSink,
    total: f32,
}

impl<'a> PhaseReporter<'a> {
    pub(crate) fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self { sink, total: 0.0 }
    }

    pub(crate) fn step(&mut self, phase: &str, percent_delta: f32) {
        self.total += percent_delta;
        self.sink.report(phase, percent_delta);
    }

    pub(crate) fn finish(&mut self, phase: &str) {
        let rest = (100.0 - self.total).max(0.0);
        self.step(phase, rest);
    }
}
