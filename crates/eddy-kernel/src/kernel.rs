//! The collaborator capability set.
//!
//! Each trait is one named external operation with a fixed call
//! contract. The solver owns the fields and lends each collaborator the
//! narrowest borrow it needs, so a stub can exercise the stage ordering
//! without the real numerical kernels.
//!
//! # Contract
//!
//! - Collaborators take `&self`; any state they keep across calls lives
//!   in the fields they are handed or behind their own interior
//!   mutability.
//! - A collaborator that populates a field (`tstep`, `rhs`, the limiter
//!   bounds) must write every active node before returning.
//! - Errors are fatal for the step and are never retried.

use eddy_core::{AuxFields, ConsField, ConsVector, DepField, KernelError, Reconstruction};
use nalgebra::Matrix4;

use crate::scratch::{LimiterBounds, SmoothingWork};

/// Names under which collaborator failures are reported.
pub mod names {
    /// [`TimeStepEstimator`](super::TimeStepEstimator).
    pub const TIME_STEP: &str = "time_step";
    /// [`GradientProvider::gradients`](super::GradientProvider::gradients).
    pub const GRADIENTS: &str = "gradients";
    /// [`GradientProvider::viscous_gradients`](super::GradientProvider::viscous_gradients).
    pub const VISCOUS_GRADIENTS: &str = "viscous_gradients";
    /// [`ViscousFlux`](super::ViscousFlux).
    pub const VISCOUS_FLUX: &str = "viscous_flux";
    /// [`SlopeLimiter::init_bounds`](super::SlopeLimiter::init_bounds).
    pub const LIMITER_INIT: &str = "limiter_init";
    /// [`SlopeLimiter::limit`](super::SlopeLimiter::limit).
    pub const LIMITER: &str = "limiter";
    /// [`DissipationEvaluator`](super::DissipationEvaluator).
    pub const DISSIPATION: &str = "dissipation";
    /// [`ConvectiveFlux`](super::ConvectiveFlux).
    pub const CONVECTIVE_FLUX: &str = "convective_flux";
    /// [`PreconditionerJacobians`](super::PreconditionerJacobians).
    pub const PRECONDITIONER: &str = "preconditioner";
    /// [`BoundaryCorrector::zero_residuals`](super::BoundaryCorrector::zero_residuals).
    pub const ZERO_RESIDUALS: &str = "zero_residuals";
    /// [`BoundaryCorrector::combine_periodic`](super::BoundaryCorrector::combine_periodic).
    pub const PERIODIC: &str = "periodic";
    /// [`ResidualSmoother`](super::ResidualSmoother).
    pub const SMOOTHER: &str = "smoother";
    /// [`DependentVars`](super::DependentVars).
    pub const DEPENDENT_VARS: &str = "dependent_vars";
    /// [`BoundaryConditions`](super::BoundaryConditions).
    pub const BOUNDARY_CONDITIONS: &str = "boundary_conditions";
}

/// Read-only view of the current flow state.
#[derive(Clone, Copy)]
pub struct FlowView<'a> {
    /// Conservative state.
    pub cv: &'a ConsField,
    /// Dependent variables consistent with `cv`.
    pub dv: &'a DepField,
}

/// Which upwind dissipation variant to evaluate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DissipationKind {
    /// First-order upwind dissipation.
    FirstOrder,
    /// First-order upwind dissipation with low-speed preconditioning.
    FirstOrderPreconditioned,
    /// Second-order (limited) upwind dissipation.
    SecondOrder,
    /// Second-order (limited) upwind dissipation with low-speed preconditioning.
    SecondOrderPreconditioned,
}

impl DissipationKind {
    /// Select the variant for a reconstruction order and preconditioning flag.
    pub fn select(order: Reconstruction, preconditioned: bool) -> Self {
        match (order, preconditioned) {
            (Reconstruction::FirstOrder, false) => Self::FirstOrder,
            (Reconstruction::FirstOrder, true) => Self::FirstOrderPreconditioned,
            (Reconstruction::SecondOrder, false) => Self::SecondOrder,
            (Reconstruction::SecondOrder, true) => Self::SecondOrderPreconditioned,
        }
    }
}

/// Fills the local pseudo-time step of every node from the current state.
///
/// Called once per step, before the first stage.
pub trait TimeStepEstimator: Send {
    /// Write `tstep[i]` for every node.
    fn local_time_steps(&self, flow: FlowView<'_>, tstep: &mut [f64]) -> Result<(), KernelError>;
}

/// Computes gradients consumed by reconstruction and viscous fluxes.
pub trait GradientProvider: Send {
    /// Gradients of the reconstructed variables into `aux.grad_x` / `aux.grad_y`.
    fn gradients(&self, flow: FlowView<'_>, aux: &mut AuxFields) -> Result<(), KernelError>;

    /// Velocity and temperature gradients into `aux.visc_grad_x` / `aux.visc_grad_y`.
    fn viscous_gradients(&self, flow: FlowView<'_>, aux: &mut AuxFields)
        -> Result<(), KernelError>;
}

/// Accumulates the viscous flux into the dissipation field.
pub trait ViscousFlux: Send {
    /// Add `beta` times the viscous flux balance to `diss`.
    fn viscous_flux(
        &self,
        flow: FlowView<'_>,
        aux: &AuxFields,
        beta: f64,
        diss: &mut ConsField,
    ) -> Result<(), KernelError>;
}

/// Slope limiter for second-order reconstruction.
pub trait SlopeLimiter: Send {
    /// Populate the per-node minimum and maximum bounds.
    ///
    /// The views arrive poisoned with `NaN`; every active node must be
    /// written before returning.
    fn init_bounds(
        &self,
        flow: FlowView<'_>,
        bounds: &mut LimiterBounds<'_>,
    ) -> Result<(), KernelError>;

    /// Compute limiter values from the bounds into `aux.limiter`.
    fn limit(
        &self,
        flow: FlowView<'_>,
        bounds: &LimiterBounds<'_>,
        aux: &mut AuxFields,
    ) -> Result<(), KernelError>;
}

/// Upwind artificial dissipation.
pub trait DissipationEvaluator: Send {
    /// Add `beta` times the selected dissipation to `diss`.
    fn dissipation(
        &self,
        kind: DissipationKind,
        beta: f64,
        flow: FlowView<'_>,
        aux: &AuxFields,
        diss: &mut ConsField,
    ) -> Result<(), KernelError>;
}

/// Convective flux balance.
pub trait ConvectiveFlux: Send {
    /// Evaluate the convective flux at the given order and combine it with
    /// the accumulated dissipation into the raw residual.
    ///
    /// Must overwrite every active node of `rhs`.
    fn flux(
        &self,
        order: Reconstruction,
        flow: FlowView<'_>,
        aux: &AuxFields,
        diss: &ConsField,
        rhs: &mut ConsField,
    ) -> Result<(), KernelError>;
}

/// The two local Jacobians from which the preconditioning matrix is formed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Jacobians {
    /// Derivative of the primitive with respect to the conservative variables.
    pub cons_to_prim: Matrix4<f64>,
    /// Preconditioned derivative of the conservative with respect to the
    /// primitive variables. Inverted by the solver.
    pub prim_to_cons_preconditioned: Matrix4<f64>,
}

/// Builds the per-node Jacobians used by the preconditioning transform.
pub trait PreconditionerJacobians: Send {
    /// Pseudo-compressibility parameter at a node.
    fn theta(&self, node: usize, cv: &ConsVector, dv: &[f64]) -> f64;

    /// Jacobians at a node for the given `theta`.
    fn jacobians(
        &self,
        node: usize,
        cv: &ConsVector,
        dv: &[f64],
        theta: f64,
    ) -> Result<Jacobians, KernelError>;
}

/// Boundary corrections applied to the residual.
pub trait BoundaryCorrector: Send {
    /// Zero the residual components constrained at symmetry and no-slip
    /// boundaries.
    fn zero_residuals(&self, rhs: &mut ConsField) -> Result<(), KernelError>;

    /// Combine residuals across periodic node pairs so both nodes of a
    /// pair carry the same net residual.
    fn combine_periodic(&self, rhs: &mut ConsField) -> Result<(), KernelError>;
}

/// Implicit residual smoothing across mesh connectivity.
pub trait ResidualSmoother: Send {
    /// Smooth `rhs` in place using the lent scratch.
    fn smooth(&self, rhs: &mut ConsField, work: SmoothingWork<'_>) -> Result<(), KernelError>;
}

/// Recomputes dependent variables from the conservative state.
pub trait DependentVars: Send {
    /// Refresh every node of `dv` from `cv`.
    fn update(&self, cv: &ConsField, dv: &mut DepField) -> Result<(), KernelError>;
}

/// Boundary-condition enforcement on the updated state.
pub trait BoundaryConditions: Send {
    /// Adjust boundary conservative and dependent state after an update.
    fn enforce(&self, cv: &mut ConsField, dv: &mut DepField) -> Result<(), KernelError>;
}

/// Every collaborator the stepper calls into.
///
/// Optional members are only needed by some scheme flags; the solver
/// configuration rejects a set that lacks one its flags require.
pub struct KernelSet {
    /// Local pseudo-time step estimator.
    pub time_step: Box<dyn TimeStepEstimator>,
    /// Gradient provider. Required for Navier–Stokes or second order.
    pub gradients: Option<Box<dyn GradientProvider>>,
    /// Viscous flux. Required for Navier–Stokes.
    pub viscous_flux: Option<Box<dyn ViscousFlux>>,
    /// Slope limiter. Required for second order.
    pub limiter: Option<Box<dyn SlopeLimiter>>,
    /// Upwind dissipation.
    pub dissipation: Box<dyn DissipationEvaluator>,
    /// Convective flux.
    pub convective_flux: Box<dyn ConvectiveFlux>,
    /// Preconditioning Jacobians. Required when preconditioning is on.
    pub preconditioner: Option<Box<dyn PreconditionerJacobians>>,
    /// Residual zeroing and periodic combination.
    pub boundary: Box<dyn BoundaryCorrector>,
    /// Implicit residual smoother. Required when smoothing is positive.
    pub smoother: Option<Box<dyn ResidualSmoother>>,
    /// Dependent-variable recomputation.
    pub dependent_vars: Box<dyn DependentVars>,
    /// Boundary-condition enforcement.
    pub boundary_conditions: Box<dyn BoundaryConditions>,
}
