//! Write-coverage checks for lent scratch views.
//!
//! Scratch views arrive poisoned with `NaN`. A consumer that is expected
//! to populate them (the limiter-bound initializer) must write every
//! active node before anyone reads them. [`ViewCoverage`] counts the
//! slots that still hold the poison once the consumer returns and logs
//! a warning naming the consumer if any remain.

use tracing::warn;

use crate::scratch::{LimiterBounds, NodeView};

/// Outcome of a coverage check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoverageReport {
    /// Name of the consumer that populated the views.
    pub consumer: &'static str,
    /// Slots at active nodes still holding the poison value.
    pub unwritten: usize,
    /// Slots at active nodes across all checked views.
    pub total: usize,
}

impl CoverageReport {
    /// Whether every checked slot was written.
    pub fn is_complete(&self) -> bool {
        self.unwritten == 0
    }

    /// Fraction of slots written; `1.0` for an empty check.
    pub fn coverage(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.total - self.unwritten) as f64 / self.total as f64
    }
}

/// Checks that a consumer populated every active node of the views it was lent.
pub struct ViewCoverage {
    consumer: &'static str,
    active_nodes: usize,
}

impl ViewCoverage {
    /// A check for `consumer` over the first `active_nodes` nodes.
    pub fn new(consumer: &'static str, active_nodes: usize) -> Self {
        Self {
            consumer,
            active_nodes,
        }
    }

    /// Count unwritten slots across `views`, warning if any remain.
    pub fn check(&self, views: &[&NodeView<'_>]) -> CoverageReport {
        let mut unwritten = 0;
        let mut total = 0;
        for view in views {
            unwritten += view.unwritten(self.active_nodes);
            total += self.active_nodes.min(view.nodes()) * eddy_core::NCONS;
        }
        let report = CoverageReport {
            consumer: self.consumer,
            unwritten,
            total,
        };
        if !report.is_complete() {
            warn!(
                consumer = self.consumer,
                unwritten,
                total,
                "scratch views left partially populated; unwritten slots read as NaN"
            );
        }
        report
    }

    /// Check both limiter-bound views.
    pub fn check_bounds(&self, bounds: &LimiterBounds<'_>) -> CoverageReport {
        self.check(&[&bounds.umin, &bounds.umax])
    }
}
