// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::repro::ReproMode;

/// Receives fractional progress updates in `[0, 1]`.
pub trait ProgressSink: Sync {
    fn on_progress(&self, fraction: f32);
}

/// Execution options passed through every stage entry point.
#[derive(Clone, Copy, Default)]
pub struct ExecutionContext<'a> {
    pub repro_mode: ReproMode,
    pub progress: Option<&'a dyn ProgressSink>,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with default repro mode and no progress sink.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repro_mode(mut self, repro_mode: ReproMode) -> Self {
        self.repro_mode = repro_mode;
        self
    }

    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    /// True when the stage may use the worker pool.
    pub fn parallel_enabled(&self) -> bool {
        self.repro_mode.allows_parallel()
    }

    /// Emits clamped progress to the sink, if configured.
    pub fn report_progress(&self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }

        if let Some(sink) = self.progress {
            sink.on_progress(fraction.clamp(0.0, 1.0));
        }
    }
}

impl std::fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("repro_mode", &self.repro_mode)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
