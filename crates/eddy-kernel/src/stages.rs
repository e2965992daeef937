//! Runge–Kutta stage coefficient tables.
//!
//! A [`StageTable`] is validated once at construction and read-only
//! afterwards. The solver iterates it in order; stage count and
//! coefficients are entirely caller-configured.

use eddy_core::{StageIndex, StageTableError};
use smallvec::SmallVec;

/// Coefficients of one Runge–Kutta stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageCoefficients {
    /// Update weight (`ark`), scaling the residual into the state update.
    pub ark: f64,
    /// Dissipation-blend weight (`betrk`): new dissipation enters with
    /// this weight and the carried-over field is scaled by `1 - betrk`.
    pub betrk: f64,
    /// Whether dissipation (and viscous flux) is recomputed this stage.
    pub recompute_dissipation: bool,
}

impl StageCoefficients {
    /// Coefficients for one stage.
    pub const fn new(ark: f64, betrk: f64, recompute_dissipation: bool) -> Self {
        Self {
            ark,
            betrk,
            recompute_dissipation,
        }
    }
}

/// Ordered, validated stage coefficients.
#[derive(Clone, Debug, PartialEq)]
pub struct StageTable {
    stages: SmallVec<[StageCoefficients; 5]>,
}

impl StageTable {
    /// Validate and build a table.
    ///
    /// Checks performed:
    ///
    /// 1. At least one stage.
    /// 2. `ark` and `betrk` are finite.
    /// 3. `betrk` lies in `[0, 1]`, so the carry-over factor does too.
    pub fn new(
        stages: impl IntoIterator<Item = StageCoefficients>,
    ) -> Result<Self, StageTableError> {
        let stages: SmallVec<[StageCoefficients; 5]> = stages.into_iter().collect();
        if stages.is_empty() {
            return Err(StageTableError::Empty);
        }
        for (i, s) in stages.iter().enumerate() {
            let stage = StageIndex(i);
            if !s.ark.is_finite() {
                return Err(StageTableError::NonFiniteCoefficient {
                    stage,
                    name: "ark",
                    value: s.ark,
                });
            }
            if !s.betrk.is_finite() {
                return Err(StageTableError::NonFiniteCoefficient {
                    stage,
                    name: "betrk",
                    value: s.betrk,
                });
            }
            if !(0.0..=1.0).contains(&s.betrk) {
                return Err(StageTableError::BlendOutOfRange {
                    stage,
                    value: s.betrk,
                });
            }
        }
        Ok(Self { stages })
    }

    /// One stage, full update, dissipation recomputed: forward Euler in
    /// pseudo time.
    pub fn single_stage() -> Self {
        Self::preset(&[StageCoefficients::new(1.0, 1.0, true)])
    }

    /// Three stages with dissipation recomputed every stage.
    pub fn three_stage() -> Self {
        Self::preset(&[
            StageCoefficients::new(0.1481, 1.0, true),
            StageCoefficients::new(0.4, 1.0, true),
            StageCoefficients::new(1.0, 1.0, true),
        ])
    }

    /// Five-stage hybrid scheme: dissipation recomputed on stages 1, 3
    /// and 5 and blended with the carried-over field.
    pub fn hybrid_five_stage() -> Self {
        Self::preset(&[
            StageCoefficients::new(0.25, 1.0, true),
            StageCoefficients::new(0.1667, 0.0, false),
            StageCoefficients::new(0.375, 0.56, true),
            StageCoefficients::new(0.5, 0.0, false),
            StageCoefficients::new(1.0, 0.44, true),
        ])
    }

    // Presets are valid by construction.
    fn preset(stages: &[StageCoefficients]) -> Self {
        Self {
            stages: stages.iter().copied().collect(),
        }
    }

    /// Number of stages (always at least one).
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Coefficients of a stage.
    pub fn get(&self, stage: StageIndex) -> Option<&StageCoefficients> {
        self.stages.get(stage.0)
    }

    /// Stages in table order.
    pub fn iter(&self) -> impl Iterator<Item = (StageIndex, &StageCoefficients)> + '_ {
        self.stages
            .iter()
            .enumerate()
            .map(|(i, s)| (StageIndex(i), s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_table_rejected() {
        assert_eq!(StageTable::new(vec![]), Err(StageTableError::Empty));
    }

    #[test]
    fn non_finite_ark_rejected() {
        let err = StageTable::new(vec![
            StageCoefficients::new(1.0, 1.0, true),
            StageCoefficients::new(f64::NAN, 1.0, true),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            StageTableError::NonFiniteCoefficient {
                stage: StageIndex(1),
                name: "ark",
                ..
            }
        ));
    }

    #[test]
    fn non_finite_betrk_rejected() {
        let err = StageTable::new(vec![StageCoefficients::new(1.0, f64::INFINITY, true)])
            .unwrap_err();
        assert!(matches!(
            err,
            StageTableError::NonFiniteCoefficient { name: "betrk", .. }
        ));
    }

    #[test]
    fn blend_outside_unit_interval_rejected() {
        let err = StageTable::new(vec![StageCoefficients::new(1.0, 1.5, true)]).unwrap_err();
        assert_eq!(
            err,
            StageTableError::BlendOutOfRange {
                stage: StageIndex(0),
                value: 1.5
            }
        );
        assert!(StageTable::new(vec![StageCoefficients::new(1.0, -0.1, true)]).is_err());
    }

    #[test]
    fn presets_pass_validation() {
        for table in [
            StageTable::single_stage(),
            StageTable::three_stage(),
            StageTable::hybrid_five_stage(),
        ] {
            let rebuilt = StageTable::new(table.iter().map(|(_, s)| *s)).unwrap();
            assert_eq!(rebuilt, table);
        }
    }

    #[test]
    fn hybrid_recomputes_on_odd_stages() {
        let t = StageTable::hybrid_five_stage();
        assert_eq!(t.len(), 5);
        let flags: Vec<bool> = t.iter().map(|(_, s)| s.recompute_dissipation).collect();
        assert_eq!(flags, vec![true, false, true, false, true]);
        assert_eq!(t.get(StageIndex(4)).unwrap().ark, 1.0);
        assert!(t.get(StageIndex(5)).is_none());
    }

    #[test]
    fn iteration_preserves_order() {
        let t = StageTable::three_stage();
        let idx: Vec<usize> = t.iter().map(|(i, _)| i.0).collect();
        assert_eq!(idx, vec![0, 1, 2]);
        assert!(!t.is_empty());
    }

    proptest! {
        #[test]
        fn any_unit_blend_is_accepted(
            ark in -10.0f64..10.0,
            betrk in 0.0f64..=1.0,
            recompute in any::<bool>(),
        ) {
            let t = StageTable::new(vec![StageCoefficients::new(ark, betrk, recompute)]);
            prop_assert!(t.is_ok());
        }
    }
}
