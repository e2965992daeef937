//! The state updater.
//!
//! Every stage restarts from the step-start snapshot: `cv = cvold - rhs`
//! at active nodes, never `cv - rhs`. Dependent variables and boundary
//! conditions follow; a collaborator that resizes `cv` or `dv` fails the
//! stage. The active state is then scanned for non-finite values.

use eddy_core::{ConsField, DepField, StageIndex, StepError};
use eddy_kernel::{names, KernelSet};

use crate::metrics::StepMetrics;
use crate::residual::call;
use crate::state::ensure_nodes;

/// `cv[i] = cvold[i] - rhs[i]` for `i` in `0..nndint`.
pub(crate) fn apply_residual(cv: &mut ConsField, cvold: &ConsField, rhs: &ConsField, nndint: usize) {
    let active = cv.as_mut_slice().iter_mut().zip(cvold.iter()).zip(rhs.iter());
    for ((new, old), r) in active.take(nndint) {
        for ((c, o), d) in new.iter_mut().zip(old).zip(r) {
            *c = o - d;
        }
    }
}

/// Split borrows of solver state for one stage update.
pub(crate) struct StateUpdater<'a> {
    pub(crate) kernels: &'a KernelSet,
    pub(crate) nndint: usize,
    pub(crate) cv: &'a mut ConsField,
    pub(crate) cvold: &'a ConsField,
    pub(crate) dv: &'a mut DepField,
    pub(crate) rhs: &'a ConsField,
    pub(crate) metrics: &'a mut StepMetrics,
}

impl StateUpdater<'_> {
    /// Update the state for `stage` and refresh everything derived from it.
    pub(crate) fn run(self, stage: StageIndex) -> Result<(), StepError> {
        let Self {
            kernels,
            nndint,
            cv,
            cvold,
            dv,
            rhs,
            metrics,
        } = self;

        apply_residual(cv, cvold, rhs, nndint);

        let nnodes = cvold.len();
        call(metrics, names::DEPENDENT_VARS, Some(stage), || {
            kernels.dependent_vars.update(cv, dv)?;
            ensure_nodes("dv", dv.len(), nnodes)
        })?;
        call(metrics, names::BOUNDARY_CONDITIONS, Some(stage), || {
            kernels.boundary_conditions.enforce(cv, dv)?;
            ensure_nodes("cv", cv.len(), nnodes)?;
            ensure_nodes("dv", dv.len(), nnodes)
        })?;

        if let Some(node) = cv.first_non_finite(0..nndint) {
            return Err(StepError::NonFiniteState { stage, node });
        }
        Ok(())
    }
}
