//! Per-step performance metrics for the pseudo-time stepper.
//!
//! [`StepMetrics`] captures timing and pass counts for a single step so
//! callers can profile the stage pipeline without a profiler attached.

use std::time::Duration;

use indexmap::IndexMap;

/// Timing and pass-count metrics collected during a single step.
///
/// All durations are in microseconds. The solver populates these fields
/// during `run_step()` and retains a copy of the most recent step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step, in microseconds.
    pub total_us: u64,
    /// Time spent estimating local time steps, in microseconds.
    pub time_step_us: u64,
    /// Wall-clock time per stage, in stage order.
    pub stage_us: Vec<u64>,
    /// Accumulated time per collaborator, keyed by collaborator name in
    /// first-call order.
    pub kernel_us: IndexMap<&'static str, u64>,
    /// Number of calls per collaborator, keyed like `kernel_us`.
    pub kernel_calls: IndexMap<&'static str, u32>,
    /// Residual-zeroing passes across all stages.
    pub zero_residual_passes: u32,
    /// Implicit smoothing passes across all stages.
    pub smoothing_passes: u32,
    /// Limiter-bound scratch slots at active nodes that the bounds
    /// initializer left unwritten, summed across stages.
    pub scratch_unwritten: usize,
}

impl StepMetrics {
    /// Calls made to the named collaborator this step.
    pub fn calls(&self, kernel: &str) -> u32 {
        self.kernel_calls.get(kernel).copied().unwrap_or(0)
    }

    /// Number of stages that completed.
    pub fn stages_completed(&self) -> usize {
        self.stage_us.len()
    }

    pub(crate) fn record_kernel(&mut self, kernel: &'static str, elapsed: Duration) {
        *self.kernel_us.entry(kernel).or_insert(0) += micros(elapsed);
        *self.kernel_calls.entry(kernel).or_insert(0) += 1;
    }
}

pub(crate) fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.time_step_us, 0);
        assert!(m.stage_us.is_empty());
        assert!(m.kernel_us.is_empty());
        assert_eq!(m.zero_residual_passes, 0);
        assert_eq!(m.smoothing_passes, 0);
        assert_eq!(m.scratch_unwritten, 0);
        assert_eq!(m.calls("time_step"), 0);
    }

    #[test]
    fn record_accumulates_in_first_call_order() {
        let mut m = StepMetrics::default();
        m.record_kernel("flux", Duration::from_micros(5));
        m.record_kernel("dissipation", Duration::from_micros(2));
        m.record_kernel("flux", Duration::from_micros(3));
        assert_eq!(m.calls("flux"), 2);
        assert_eq!(m.kernel_us["flux"], 8);
        let order: Vec<&str> = m.kernel_calls.keys().copied().collect();
        assert_eq!(order, vec!["flux", "dissipation"]);
    }

    #[test]
    fn micros_saturates() {
        assert_eq!(micros(Duration::MAX), u64::MAX);
        assert_eq!(micros(Duration::from_millis(2)), 2000);
    }
}
