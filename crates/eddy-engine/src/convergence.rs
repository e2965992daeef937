//! Density-change convergence monitoring.

use eddy_core::ConsField;

/// Density change over one step at active nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Convergence {
    /// `sqrt(sum((rho - rho_old)^2) / nndint)`.
    pub density_change_l2: f64,
    /// `density_change_l2` relative to the first monitored step.
    pub relative_l2: f64,
    /// Largest absolute density change.
    pub density_change_max: f64,
    /// Node of the largest change; `None` without active nodes.
    pub max_change_node: Option<usize>,
}

/// Tracks the first-step reference norm across steps.
#[derive(Clone, Debug, Default)]
pub struct ConvergenceMonitor {
    reference: Option<f64>,
}

impl ConvergenceMonitor {
    /// A monitor with no reference yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Measure the density change between `cvold` and `cv` over
    /// `0..nndint`. The first measurement becomes the reference.
    pub fn measure(&mut self, cv: &ConsField, cvold: &ConsField, nndint: usize) -> Convergence {
        let mut sum = 0.0;
        let mut max = 0.0;
        let mut max_node = None;
        for (node, (new, old)) in cv.iter().zip(cvold.iter()).take(nndint).enumerate() {
            let dr = new[0] - old[0];
            sum += dr * dr;
            if max_node.is_none() || dr.abs() > max {
                max = dr.abs();
                max_node = Some(node);
            }
        }
        let l2 = if nndint == 0 {
            0.0
        } else {
            (sum / nndint as f64).sqrt()
        };

        let reference = *self
            .reference
            .get_or_insert(if l2 == 0.0 { 1.0 } else { l2 });

        Convergence {
            density_change_l2: l2,
            relative_l2: l2 / reference,
            density_change_max: max,
            max_change_node: max_node,
        }
    }

    /// Forget the reference; the next measurement sets a new one.
    pub fn reset(&mut self) {
        self.reference = None;
    }

    /// The current reference norm.
    pub fn reference(&self) -> Option<f64> {
        self.reference
    }
}
