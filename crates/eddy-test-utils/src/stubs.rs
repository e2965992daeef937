//! Call-recording stub collaborators.
//!
//! Each stub logs its name to the shared [`CallLog`] before doing a
//! trivially predictable amount of work:
//!
//! - [`ConstantTimeStep`] fills every local time step with one value.
//! - [`ConstantResidual`] writes `residual - diss` at every residual node.
//! - [`ConstantDissipation`] and [`ConstantViscousFlux`] add
//!   `beta * contribution` to every node of the dissipation field.
//! - [`FixedJacobians`] returns the same Jacobian pair at every node.
//! - [`RecordingBoundary`] zeroes the residual at a configurable node set.
//! - [`OffsetSmoother`] adds a constant to every residual component.

use std::sync::{Arc, Mutex, PoisonError};

use eddy_core::{AuxFields, ConsField, ConsVector, DepField, KernelError, Reconstruction, NCONS};
use eddy_kernel::{
    names, BoundaryConditions, BoundaryCorrector, ConvectiveFlux, DependentVars,
    DissipationEvaluator, DissipationKind, FlowView, GradientProvider, Jacobians, KernelSet,
    LimiterBounds, PreconditionerJacobians, ResidualSmoother, SlopeLimiter, SmoothingWork,
    TimeStepEstimator, ViscousFlux,
};
use nalgebra::Matrix4;

use crate::CallLog;

fn add_scaled(field: &mut ConsField, beta: f64, contribution: &ConsVector) {
    for node in field.as_mut_slice() {
        for (c, v) in node.iter_mut().zip(contribution) {
            *c += beta * v;
        }
    }
}

// ── Probe ──────────────────────────────────────────────────────────

/// One observed dissipation evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct DissipationCall {
    pub kind: DissipationKind,
    pub beta: f64,
    /// The dissipation field as it was handed in, before the stub added to it.
    pub incoming: ConsField,
}

/// Shared record of dissipation evaluations.
#[derive(Clone, Default)]
pub struct DissipationProbe {
    calls: Arc<Mutex<Vec<DissipationCall>>>,
}

impl DissipationProbe {
    fn push(&self, call: DissipationCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    pub fn calls(&self) -> Vec<DissipationCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// ── Stubs ──────────────────────────────────────────────────────────

pub struct ConstantTimeStep {
    pub log: CallLog,
    pub value: f64,
}

impl TimeStepEstimator for ConstantTimeStep {
    fn local_time_steps(&self, _flow: FlowView<'_>, tstep: &mut [f64]) -> Result<(), KernelError> {
        self.log.record(names::TIME_STEP)?;
        tstep.fill(self.value);
        Ok(())
    }
}

pub struct RecordingGradients {
    pub log: CallLog,
}

impl GradientProvider for RecordingGradients {
    fn gradients(&self, _flow: FlowView<'_>, aux: &mut AuxFields) -> Result<(), KernelError> {
        self.log.record(names::GRADIENTS)?;
        aux.grad_x.fill(0.0);
        aux.grad_y.fill(0.0);
        Ok(())
    }

    fn viscous_gradients(
        &self,
        _flow: FlowView<'_>,
        aux: &mut AuxFields,
    ) -> Result<(), KernelError> {
        self.log.record(names::VISCOUS_GRADIENTS)?;
        aux.visc_grad_x.fill(0.0);
        aux.visc_grad_y.fill(0.0);
        Ok(())
    }
}

pub struct ConstantViscousFlux {
    pub log: CallLog,
    pub contribution: ConsVector,
}

impl ViscousFlux for ConstantViscousFlux {
    fn viscous_flux(
        &self,
        _flow: FlowView<'_>,
        _aux: &AuxFields,
        beta: f64,
        diss: &mut ConsField,
    ) -> Result<(), KernelError> {
        self.log.record(names::VISCOUS_FLUX)?;
        add_scaled(diss, beta, &self.contribution);
        Ok(())
    }
}

/// Writes `[-1, 1]` bounds at every node, or nothing when `writes_bounds`
/// is off.
pub struct RecordingLimiter {
    pub log: CallLog,
    pub writes_bounds: bool,
}

impl SlopeLimiter for RecordingLimiter {
    fn init_bounds(
        &self,
        _flow: FlowView<'_>,
        bounds: &mut LimiterBounds<'_>,
    ) -> Result<(), KernelError> {
        self.log.record(names::LIMITER_INIT)?;
        if self.writes_bounds {
            bounds.umin.as_mut_slice().fill(-1.0);
            bounds.umax.as_mut_slice().fill(1.0);
        }
        Ok(())
    }

    fn limit(
        &self,
        _flow: FlowView<'_>,
        _bounds: &LimiterBounds<'_>,
        aux: &mut AuxFields,
    ) -> Result<(), KernelError> {
        self.log.record(names::LIMITER)?;
        aux.limiter.fill(1.0);
        Ok(())
    }
}

pub struct ConstantDissipation {
    pub log: CallLog,
    pub contribution: ConsVector,
    pub probe: DissipationProbe,
}

impl DissipationEvaluator for ConstantDissipation {
    fn dissipation(
        &self,
        kind: DissipationKind,
        beta: f64,
        _flow: FlowView<'_>,
        _aux: &AuxFields,
        diss: &mut ConsField,
    ) -> Result<(), KernelError> {
        self.log.record(names::DISSIPATION)?;
        self.probe.push(DissipationCall {
            kind,
            beta,
            incoming: diss.clone(),
        });
        add_scaled(diss, beta, &self.contribution);
        Ok(())
    }
}

pub struct ConstantResidual {
    pub log: CallLog,
    pub residual: ConsVector,
}

impl ConvectiveFlux for ConstantResidual {
    fn flux(
        &self,
        _order: Reconstruction,
        _flow: FlowView<'_>,
        _aux: &AuxFields,
        diss: &ConsField,
        rhs: &mut ConsField,
    ) -> Result<(), KernelError> {
        self.log.record(names::CONVECTIVE_FLUX)?;
        for (r, d) in rhs.as_mut_slice().iter_mut().zip(diss.iter()) {
            for ((c, v), dk) in r.iter_mut().zip(&self.residual).zip(d) {
                *c = v - dk;
            }
        }
        Ok(())
    }
}

pub struct FixedJacobians {
    pub log: CallLog,
    pub jacobians: Jacobians,
}

impl PreconditionerJacobians for FixedJacobians {
    fn theta(&self, _node: usize, _cv: &ConsVector, _dv: &[f64]) -> f64 {
        1.0
    }

    /// Logs once per node.
    fn jacobians(
        &self,
        _node: usize,
        _cv: &ConsVector,
        _dv: &[f64],
        _theta: f64,
    ) -> Result<Jacobians, KernelError> {
        self.log.record(names::PRECONDITIONER)?;
        Ok(self.jacobians)
    }
}

pub struct RecordingBoundary {
    pub log: CallLog,
    /// Nodes whose residual is zeroed.
    pub constrained: Vec<usize>,
}

impl BoundaryCorrector for RecordingBoundary {
    fn zero_residuals(&self, rhs: &mut ConsField) -> Result<(), KernelError> {
        self.log.record(names::ZERO_RESIDUALS)?;
        for &i in &self.constrained {
            if i < rhs.len() {
                *rhs.node_mut(i) = [0.0; NCONS];
            }
        }
        Ok(())
    }

    fn combine_periodic(&self, _rhs: &mut ConsField) -> Result<(), KernelError> {
        self.log.record(names::PERIODIC)
    }
}

pub struct OffsetSmoother {
    pub log: CallLog,
    pub offset: f64,
}

impl ResidualSmoother for OffsetSmoother {
    fn smooth(&self, rhs: &mut ConsField, mut work: SmoothingWork<'_>) -> Result<(), KernelError> {
        self.log.record(names::SMOOTHER)?;
        work.work_a.as_mut_slice().fill(0.0);
        work.work_b.as_mut_slice().fill(0.0);
        for node in rhs.as_mut_slice() {
            for c in node.iter_mut() {
                *c += self.offset;
            }
        }
        Ok(())
    }
}

/// Mirrors density into the first dependent component.
pub struct DensityDependentVars {
    pub log: CallLog,
}

impl DependentVars for DensityDependentVars {
    fn update(&self, cv: &ConsField, dv: &mut DepField) -> Result<(), KernelError> {
        self.log.record(names::DEPENDENT_VARS)?;
        if dv.ndv() == 0 {
            return Ok(());
        }
        for (i, state) in cv.iter().enumerate().take(dv.len()) {
            dv.node_mut(i)[0] = state[0];
        }
        Ok(())
    }
}

pub struct RecordingBoundaryConditions {
    pub log: CallLog,
}

impl BoundaryConditions for RecordingBoundaryConditions {
    fn enforce(&self, _cv: &mut ConsField, _dv: &mut DepField) -> Result<(), KernelError> {
        self.log.record(names::BOUNDARY_CONDITIONS)
    }
}

// ── Builder ────────────────────────────────────────────────────────

/// A full stub [`KernelSet`] sharing `log`.
///
/// Defaults: unit time step, zero residual, zero dissipation, identity
/// Jacobians, no constrained nodes, zero smoothing offset, a limiter that
/// writes its bounds, and every optional collaborator present.
pub fn stub_kernels(log: &CallLog) -> StubKernels {
    StubKernels {
        log: log.clone(),
        time_step: 1.0,
        residual: [0.0; NCONS],
        dissipation: [0.0; NCONS],
        viscous: [0.0; NCONS],
        probe: DissipationProbe::default(),
        jacobians: Jacobians {
            cons_to_prim: Matrix4::identity(),
            prim_to_cons_preconditioned: Matrix4::identity(),
        },
        constrained: Vec::new(),
        smoother_offset: 0.0,
        limiter_writes_bounds: true,
        gradients: true,
        viscous_flux: true,
        limiter: true,
        preconditioner: true,
        smoother: true,
    }
}

pub struct StubKernels {
    log: CallLog,
    time_step: f64,
    residual: ConsVector,
    dissipation: ConsVector,
    viscous: ConsVector,
    probe: DissipationProbe,
    jacobians: Jacobians,
    constrained: Vec<usize>,
    smoother_offset: f64,
    limiter_writes_bounds: bool,
    gradients: bool,
    viscous_flux: bool,
    limiter: bool,
    preconditioner: bool,
    smoother: bool,
}

impl StubKernels {
    pub fn time_step(mut self, value: f64) -> Self {
        self.time_step = value;
        self
    }

    pub fn residual(mut self, residual: ConsVector) -> Self {
        self.residual = residual;
        self
    }

    pub fn dissipation(mut self, contribution: ConsVector) -> Self {
        self.dissipation = contribution;
        self
    }

    pub fn viscous(mut self, contribution: ConsVector) -> Self {
        self.viscous = contribution;
        self
    }

    pub fn jacobians(mut self, jacobians: Jacobians) -> Self {
        self.jacobians = jacobians;
        self
    }

    pub fn constrained(mut self, nodes: Vec<usize>) -> Self {
        self.constrained = nodes;
        self
    }

    pub fn smoother_offset(mut self, offset: f64) -> Self {
        self.smoother_offset = offset;
        self
    }

    pub fn limiter_skips_bounds(mut self) -> Self {
        self.limiter_writes_bounds = false;
        self
    }

    pub fn without_gradients(mut self) -> Self {
        self.gradients = false;
        self
    }

    pub fn without_viscous_flux(mut self) -> Self {
        self.viscous_flux = false;
        self
    }

    pub fn without_limiter(mut self) -> Self {
        self.limiter = false;
        self
    }

    pub fn without_preconditioner(mut self) -> Self {
        self.preconditioner = false;
        self
    }

    pub fn without_smoother(mut self) -> Self {
        self.smoother = false;
        self
    }

    /// Handle to the dissipation evaluations of the built set.
    pub fn probe(&self) -> DissipationProbe {
        self.probe.clone()
    }

    pub fn build(self) -> KernelSet {
        let log = self.log;
        KernelSet {
            time_step: Box::new(ConstantTimeStep {
                log: log.clone(),
                value: self.time_step,
            }),
            gradients: self.gradients.then(|| {
                Box::new(RecordingGradients { log: log.clone() }) as Box<dyn GradientProvider>
            }),
            viscous_flux: self.viscous_flux.then(|| {
                Box::new(ConstantViscousFlux {
                    log: log.clone(),
                    contribution: self.viscous,
                }) as Box<dyn ViscousFlux>
            }),
            limiter: self.limiter.then(|| {
                Box::new(RecordingLimiter {
                    log: log.clone(),
                    writes_bounds: self.limiter_writes_bounds,
                }) as Box<dyn SlopeLimiter>
            }),
            dissipation: Box::new(ConstantDissipation {
                log: log.clone(),
                contribution: self.dissipation,
                probe: self.probe,
            }),
            convective_flux: Box::new(ConstantResidual {
                log: log.clone(),
                residual: self.residual,
            }),
            preconditioner: self.preconditioner.then(|| {
                Box::new(FixedJacobians {
                    log: log.clone(),
                    jacobians: self.jacobians,
                }) as Box<dyn PreconditionerJacobians>
            }),
            boundary: Box::new(RecordingBoundary {
                log: log.clone(),
                constrained: self.constrained,
            }),
            smoother: self.smoother.then(|| {
                Box::new(OffsetSmoother {
                    log: log.clone(),
                    offset: self.smoother_offset,
                }) as Box<dyn ResidualSmoother>
            }),
            dependent_vars: Box::new(DensityDependentVars { log: log.clone() }),
            boundary_conditions: Box::new(RecordingBoundaryConditions { log }),
        }
    }
}
