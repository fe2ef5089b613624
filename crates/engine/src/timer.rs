use std::time::{Duration, Instant};

/// Wall-clock stopwatch for one named step of a load or bake.
pub struct StepTimer {
    label: String,
    started: Instant,
}

impl StepTimer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Logs `"<label> took <ms>ms"` and returns the elapsed time.
    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        log::debug!("{} took {:.3}ms", self.label, elapsed.as_secs_f32() * 1000.0);
        elapsed
    }
}
