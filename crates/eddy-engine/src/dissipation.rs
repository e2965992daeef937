//! The dissipation accumulator.
//!
//! Holds the combined artificial and viscous dissipation across the
//! stages of one step. It is zeroed at step start. On a later stage that
//! recomputes dissipation the carried-over field is first scaled by
//! `1 - betrk`; the collaborators then add `betrk` times the new
//! contribution. Stages that skip recomputation reuse the field as is.

use eddy_core::{ConsField, StageIndex};
use eddy_kernel::StageCoefficients;

/// Dissipation field blended across stages.
#[derive(Clone, Debug, PartialEq)]
pub struct DissipationAccumulator {
    field: ConsField,
}

impl DissipationAccumulator {
    /// A zeroed accumulator over `nodes` nodes.
    pub fn new(nodes: usize) -> Self {
        Self {
            field: ConsField::zeros(nodes),
        }
    }

    /// Zero the field. Called once at step start.
    pub fn reset(&mut self) {
        self.field.fill(0.0);
    }

    /// Scale the carried-over field by `1 - betrk` if `stage` is past the
    /// first and recomputes dissipation.
    ///
    /// Returns whether the field was scaled.
    pub fn carry_over(&mut self, stage: StageIndex, coeffs: &StageCoefficients) -> bool {
        if stage.is_first() || !coeffs.recompute_dissipation {
            return false;
        }
        self.field.scale(1.0 - coeffs.betrk);
        true
    }

    /// The accumulated field.
    pub fn field(&self) -> &ConsField {
        &self.field
    }

    /// Mutable access for the collaborators that add new contributions.
    pub fn field_mut(&mut self) -> &mut ConsField {
        &mut self.field
    }
}
