//! The per-stage residual pipeline.
//!
//! [`ResidualPipeline`] borrows exactly the fields one stage touches and
//! drives the collaborators in a fixed order. It produces the
//! pseudo-time-scaled, boundary-corrected residual in `rhs`; the state
//! update happens afterwards in `update`.

use std::time::Instant;

use eddy_core::{AuxFields, ConsField, KernelError, StageIndex, StepError};
use eddy_kernel::{
    names, DissipationKind, FlowView, KernelSet, ScratchRegion, StageCoefficients, ViewCoverage,
};

use crate::config::{MeshConfig, SchemeConfig};
use crate::dissipation::DissipationAccumulator;
use crate::metrics::StepMetrics;
use crate::precondition::precondition_residual;
use crate::state::ensure_active_nodes;

/// Run one collaborator call, recording its timing and tagging a failure
/// with the collaborator name and stage.
pub(crate) fn call<T>(
    metrics: &mut StepMetrics,
    kernel: &'static str,
    stage: Option<StageIndex>,
    f: impl FnOnce() -> Result<T, KernelError>,
) -> Result<T, StepError> {
    let start = Instant::now();
    let result = f();
    metrics.record_kernel(kernel, start.elapsed());
    result.map_err(|source| StepError::KernelFailed {
        kernel,
        stage,
        source,
    })
}

/// An optional collaborator that the configuration should have supplied.
fn required<'k, T: ?Sized>(
    kernel: Option<&'k T>,
    name: &'static str,
    stage: StageIndex,
) -> Result<&'k T, StepError> {
    kernel.ok_or_else(|| StepError::KernelFailed {
        kernel: name,
        stage: Some(stage),
        source: KernelError::failed("collaborator not configured"),
    })
}

/// Split borrows of solver state for one stage.
pub(crate) struct ResidualPipeline<'a> {
    pub(crate) mesh: &'a MeshConfig,
    pub(crate) scheme: &'a SchemeConfig,
    pub(crate) kernels: &'a KernelSet,
    pub(crate) flow: FlowView<'a>,
    pub(crate) tstep: &'a [f64],
    pub(crate) dissipation: &'a mut DissipationAccumulator,
    pub(crate) rhs: &'a mut ConsField,
    pub(crate) aux: &'a mut AuxFields,
    pub(crate) scratch: &'a mut ScratchRegion,
    pub(crate) metrics: &'a mut StepMetrics,
}

impl ResidualPipeline<'_> {
    /// Compute the scaled residual for `stage`.
    pub(crate) fn run(
        &mut self,
        stage: StageIndex,
        coeffs: &StageCoefficients,
    ) -> Result<(), StepError> {
        let kernels = self.kernels;

        // 1. Carry-over.
        self.dissipation.carry_over(stage, coeffs);

        // 2-3. New dissipation, weighted by betrk.
        if coeffs.recompute_dissipation {
            self.viscous(stage, coeffs.betrk)?;
            self.upwind_dissipation(stage, coeffs.betrk)?;
        }

        // 4. Raw residual.
        let (order, flow, nndint) = (self.scheme.reconstruction, self.flow, self.mesh.nndint);
        let (aux, diss, rhs) = (&*self.aux, self.dissipation.field(), &mut *self.rhs);
        call(self.metrics, names::CONVECTIVE_FLUX, Some(stage), || {
            kernels.convective_flux.flux(order, flow, aux, diss, rhs)?;
            ensure_active_nodes("rhs", rhs.len(), nndint)
        })?;

        // 5. Preconditioning.
        if self.scheme.preconditioning.is_on() {
            let pre = required(
                kernels.preconditioner.as_deref(),
                names::PRECONDITIONER,
                stage,
            )?;
            let rhs = &mut *self.rhs;
            call(self.metrics, names::PRECONDITIONER, Some(stage), || {
                precondition_residual(pre, flow, rhs, nndint)
            })?;
        }

        // 6. Boundary corrections.
        self.zero_residuals(stage)?;
        let rhs = &mut *self.rhs;
        call(self.metrics, names::PERIODIC, Some(stage), || {
            kernels.boundary.combine_periodic(rhs)
        })?;

        // 7. Pseudo-time scaling.
        self.scale(coeffs.ark);

        // 8. Implicit smoothing, then re-mask constrained boundaries.
        if self.scheme.smoothing_enabled() {
            self.smooth(stage)?;
            self.zero_residuals(stage)?;
        }

        Ok(())
    }

    fn viscous(&mut self, stage: StageIndex, beta: f64) -> Result<(), StepError> {
        if !self.scheme.equations.is_viscous() {
            return Ok(());
        }
        let kernels = self.kernels;
        let gradients = required(kernels.gradients.as_deref(), names::GRADIENTS, stage)?;
        let viscous = required(kernels.viscous_flux.as_deref(), names::VISCOUS_FLUX, stage)?;
        let flow = self.flow;

        let aux = &mut *self.aux;
        call(self.metrics, names::GRADIENTS, Some(stage), || {
            gradients.gradients(flow, aux)
        })?;
        call(self.metrics, names::VISCOUS_GRADIENTS, Some(stage), || {
            gradients.viscous_gradients(flow, aux)
        })?;
        let diss = self.dissipation.field_mut();
        call(self.metrics, names::VISCOUS_FLUX, Some(stage), || {
            viscous.viscous_flux(flow, aux, beta, diss)
        })
    }

    fn upwind_dissipation(&mut self, stage: StageIndex, beta: f64) -> Result<(), StepError> {
        let kernels = self.kernels;
        let order = self.scheme.reconstruction;
        let kind = DissipationKind::select(order, self.scheme.preconditioning.is_on());
        let flow = self.flow;

        if order.is_higher_order() {
            // Navier-Stokes stages already computed gradients above.
            if !self.scheme.equations.is_viscous() {
                let gradients = required(kernels.gradients.as_deref(), names::GRADIENTS, stage)?;
                let aux = &mut *self.aux;
                call(self.metrics, names::GRADIENTS, Some(stage), || {
                    gradients.gradients(flow, aux)
                })?;
            }
            self.limit(stage)?;
        }

        let (aux, diss) = (&*self.aux, self.dissipation.field_mut());
        call(self.metrics, names::DISSIPATION, Some(stage), || {
            kernels.dissipation.dissipation(kind, beta, flow, aux, diss)
        })
    }

    fn limit(&mut self, stage: StageIndex) -> Result<(), StepError> {
        let kernels = self.kernels;
        let limiter = required(kernels.limiter.as_deref(), names::LIMITER, stage)?;
        let (nnodes, flow) = (self.mesh.nnodes, self.flow);
        let supplied = self.scratch.real_capacity();
        let mut bounds = self
            .scratch
            .limiter_bounds(nnodes)
            .ok_or(StepError::ScratchTooSmall {
                required: ScratchRegion::required_reals(nnodes),
                supplied,
            })?;

        call(self.metrics, names::LIMITER_INIT, Some(stage), || {
            limiter.init_bounds(flow, &mut bounds)
        })?;
        let coverage =
            ViewCoverage::new(names::LIMITER_INIT, self.mesh.nndint).check_bounds(&bounds);
        self.metrics.scratch_unwritten += coverage.unwritten;

        let aux = &mut *self.aux;
        call(self.metrics, names::LIMITER, Some(stage), || {
            limiter.limit(flow, &bounds, aux)
        })
    }

    fn zero_residuals(&mut self, stage: StageIndex) -> Result<(), StepError> {
        let (kernels, rhs) = (self.kernels, &mut *self.rhs);
        call(self.metrics, names::ZERO_RESIDUALS, Some(stage), || {
            kernels.boundary.zero_residuals(rhs)
        })?;
        self.metrics.zero_residual_passes += 1;
        Ok(())
    }

    fn scale(&mut self, ark: f64) {
        let fac = ark * self.scheme.cfl;
        let active = self.rhs.as_mut_slice().iter_mut().take(self.mesh.nndint);
        for (i, r) in active.enumerate() {
            let adt = fac * self.tstep[i] / self.mesh.vol[i];
            for c in r.iter_mut() {
                *c *= adt;
            }
        }
    }

    fn smooth(&mut self, stage: StageIndex) -> Result<(), StepError> {
        let kernels = self.kernels;
        let smoother = required(kernels.smoother.as_deref(), names::SMOOTHER, stage)?;
        let nnodes = self.mesh.nnodes;
        let supplied = self.scratch.real_capacity();
        let work = self
            .scratch
            .smoothing_work(nnodes)
            .ok_or(StepError::ScratchTooSmall {
                required: ScratchRegion::required_reals(nnodes),
                supplied,
            })?;
        let rhs = &mut *self.rhs;
        call(self.metrics, names::SMOOTHER, Some(stage), || {
            smoother.smooth(rhs, work)
        })?;
        self.metrics.smoothing_passes += 1;
        Ok(())
    }
}
