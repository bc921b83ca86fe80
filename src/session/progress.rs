use std::sync::Mutex;

/// Receiver of export progress: `(percent in [0, 100], stage message)`.
pub trait ProgressSink: Send + Sync {
    /// Called with monotonically non-decreasing percentages.
    fn on_progress(&self, percent: f32, stage: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(f32, &str) + Send + Sync,
{
    fn on_progress(&self, percent: f32, stage: &str) {
        self(percent, stage)
    }
}

/// Sink that discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _percent: f32, _stage: &str) {}
}

/// Clamps and de-duplicates progress so hosts only ever see a non-decreasing series.
pub struct ProgressReporter {
    sink: Box<dyn ProgressSink>,
    last: Mutex<f32>,
}

impl ProgressReporter {
    /// Wrap `sink`.
    pub fn new(sink: impl ProgressSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            last: Mutex::new(0.0),
        }
    }

    /// Reporter that drops every update.
    pub fn silent() -> Self {
        Self::new(NoProgress)
    }

    /// Forward `percent` (clamped to `[0, 100]`, never below the last value sent).
    pub fn report(&self, percent: f32, stage: &str) {
        let pct = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        // Held across the callback so concurrent reporters cannot interleave out of order.
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last = last.max(pct);
        self.sink.on_progress(*last, stage);
    }

    /// Map `fraction` in `[0, 1]` onto `[start, end]` and report it.
    pub fn report_span(&self, start: f32, end: f32, fraction: f64, stage: &str) {
        let f = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0) as f32
        } else {
            0.0
        };
        self.report(start + (end - start) * f, stage);
    }

    /// Last value sent.
    pub fn last(&self) -> f32 {
        match self.last.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("last", &self.last())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/progress.rs"]
mod tests;
