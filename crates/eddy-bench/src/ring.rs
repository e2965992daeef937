//! Collaborators for a periodic one-dimensional ring of unit cells.
//!
//! Each conservative component is advected at a constant speed with a
//! central flux; the upwind dissipation turns that into a first-order
//! upwind scheme. The kernels are cheap but touch every node with a
//! realistic neighbour access pattern, which is what the benchmarks need.

use eddy_core::{AuxFields, ConsField, ConsVector, DepField, KernelError, Reconstruction, NCONS};
use eddy_kernel::{
    BoundaryConditions, BoundaryCorrector, ConvectiveFlux, DependentVars, DissipationEvaluator,
    DissipationKind, FlowView, GradientProvider, Jacobians, KernelSet, LimiterBounds,
    PreconditionerJacobians, ResidualSmoother, SlopeLimiter, SmoothingWork, TimeStepEstimator,
    ViscousFlux,
};
use nalgebra::Matrix4;

/// Dependent variables per node: pressure and temperature.
pub const RING_NDV: usize = 2;

const SPEED: f64 = 1.0;
const DIFFUSIVITY: f64 = 0.5 * SPEED;
const VISCOSITY: f64 = 0.01;
const SMOOTHING: f64 = 0.5;
const GAMMA: f64 = 1.4;

/// Every collaborator on the ring. All optional members are present.
pub fn ring_kernels() -> KernelSet {
    KernelSet {
        time_step: Box::new(RingTimeStep),
        gradients: Some(Box::new(RingGradients)),
        viscous_flux: Some(Box::new(RingViscousFlux)),
        limiter: Some(Box::new(RingLimiter)),
        dissipation: Box::new(RingDissipation),
        convective_flux: Box::new(RingFlux),
        preconditioner: Some(Box::new(RingPreconditioner)),
        boundary: Box::new(NoBoundaries),
        smoother: Some(Box::new(JacobiSmoother)),
        dependent_vars: Box::new(IdealGas),
        boundary_conditions: Box::new(NoBoundaries),
    }
}

#[inline]
fn neighbours(i: usize, n: usize) -> (usize, usize) {
    ((i + n - 1) % n, (i + 1) % n)
}

/// Add `beta * coeff * laplacian(cv)` to `diss`.
fn add_laplacian(
    cv: &ConsField,
    coeff: impl Fn(usize, usize) -> f64,
    beta: f64,
    diss: &mut ConsField,
) {
    let n = cv.len();
    for i in 0..n {
        let (l, r) = neighbours(i, n);
        let (ul, uc, ur) = (cv.node(l), cv.node(i), cv.node(r));
        let d = diss.node_mut(i);
        for k in 0..NCONS {
            d[k] += beta * coeff(i, k) * (ul[k] - 2.0 * uc[k] + ur[k]);
        }
    }
}

struct RingTimeStep;

impl TimeStepEstimator for RingTimeStep {
    fn local_time_steps(&self, _flow: FlowView<'_>, tstep: &mut [f64]) -> Result<(), KernelError> {
        tstep.fill(1.0 / (SPEED + 2.0 * DIFFUSIVITY + 2.0 * VISCOSITY));
        Ok(())
    }
}

struct RingGradients;

impl RingGradients {
    fn central(cv: &ConsField, grad: &mut ConsField) {
        let n = cv.len();
        for i in 0..n {
            let (l, r) = neighbours(i, n);
            let (ul, ur) = (cv.node(l), cv.node(r));
            let g = grad.node_mut(i);
            for k in 0..NCONS {
                g[k] = 0.5 * (ur[k] - ul[k]);
            }
        }
    }
}

impl GradientProvider for RingGradients {
    fn gradients(&self, flow: FlowView<'_>, aux: &mut AuxFields) -> Result<(), KernelError> {
        Self::central(flow.cv, &mut aux.grad_x);
        aux.grad_y.fill(0.0);
        Ok(())
    }

    fn viscous_gradients(&self, flow: FlowView<'_>, aux: &mut AuxFields) -> Result<(), KernelError> {
        Self::central(flow.cv, &mut aux.visc_grad_x);
        aux.visc_grad_y.fill(0.0);
        Ok(())
    }
}

struct RingViscousFlux;

impl ViscousFlux for RingViscousFlux {
    fn viscous_flux(
        &self,
        flow: FlowView<'_>,
        _aux: &AuxFields,
        beta: f64,
        diss: &mut ConsField,
    ) -> Result<(), KernelError> {
        add_laplacian(flow.cv, |_, _| VISCOSITY, beta, diss);
        Ok(())
    }
}

/// Barth–Jespersen style limiter over the two ring neighbours.
struct RingLimiter;

impl SlopeLimiter for RingLimiter {
    fn init_bounds(
        &self,
        flow: FlowView<'_>,
        bounds: &mut LimiterBounds<'_>,
    ) -> Result<(), KernelError> {
        let cv = flow.cv;
        let n = cv.len();
        for i in 0..n {
            let (l, r) = neighbours(i, n);
            let (ul, uc, ur) = (cv.node(l), cv.node(i), cv.node(r));
            for k in 0..NCONS {
                bounds.umin.node_mut(i)[k] = uc[k].min(ul[k]).min(ur[k]);
                bounds.umax.node_mut(i)[k] = uc[k].max(ul[k]).max(ur[k]);
            }
        }
        Ok(())
    }

    fn limit(
        &self,
        flow: FlowView<'_>,
        bounds: &LimiterBounds<'_>,
        aux: &mut AuxFields,
    ) -> Result<(), KernelError> {
        for i in 0..flow.cv.len() {
            let u = flow.cv.node(i);
            let (lo, hi) = (bounds.umin.node(i), bounds.umax.node(i));
            let mut phi = [1.0; NCONS];
            for k in 0..NCONS {
                let delta = 0.5 * aux.grad_x.node(i)[k];
                phi[k] = if delta > 0.0 {
                    ((hi[k] - u[k]) / delta).min(1.0)
                } else if delta < 0.0 {
                    ((lo[k] - u[k]) / delta).min(1.0)
                } else {
                    1.0
                };
            }
            *aux.limiter.node_mut(i) = phi;
        }
        Ok(())
    }
}

struct RingDissipation;

impl DissipationEvaluator for RingDissipation {
    fn dissipation(
        &self,
        kind: DissipationKind,
        beta: f64,
        flow: FlowView<'_>,
        aux: &AuxFields,
        diss: &mut ConsField,
    ) -> Result<(), KernelError> {
        match kind {
            DissipationKind::FirstOrder | DissipationKind::FirstOrderPreconditioned => {
                add_laplacian(flow.cv, |_, _| DIFFUSIVITY, beta, diss);
            }
            // Smooth regions (phi near 1) get half the first-order dissipation.
            DissipationKind::SecondOrder | DissipationKind::SecondOrderPreconditioned => {
                add_laplacian(
                    flow.cv,
                    |i, k| DIFFUSIVITY * (1.0 - 0.5 * aux.limiter.node(i)[k]),
                    beta,
                    diss,
                );
            }
        }
        Ok(())
    }
}

struct RingFlux;

impl ConvectiveFlux for RingFlux {
    fn flux(
        &self,
        _order: Reconstruction,
        flow: FlowView<'_>,
        _aux: &AuxFields,
        diss: &ConsField,
        rhs: &mut ConsField,
    ) -> Result<(), KernelError> {
        let cv = flow.cv;
        let n = cv.len();
        // Interface nodes past `rhs.len()` still act as neighbours.
        for i in 0..rhs.len() {
            let (l, r) = neighbours(i, n);
            let (ul, ur, d) = (cv.node(l), cv.node(r), diss.node(i));
            let out = rhs.node_mut(i);
            for k in 0..NCONS {
                out[k] = 0.5 * SPEED * (ur[k] - ul[k]) - d[k];
            }
        }
        Ok(())
    }
}

/// Damps the energy residual as the local Mach number drops.
struct RingPreconditioner;

impl PreconditionerJacobians for RingPreconditioner {
    fn theta(&self, _node: usize, cv: &ConsVector, dv: &[f64]) -> f64 {
        let velocity = cv[1] / cv[0];
        let sound_sq = GAMMA * dv[0] / cv[0];
        if sound_sq > 0.0 {
            (velocity * velocity / sound_sq).min(1.0)
        } else {
            1.0
        }
    }

    fn jacobians(
        &self,
        _node: usize,
        _cv: &ConsVector,
        _dv: &[f64],
        theta: f64,
    ) -> Result<Jacobians, KernelError> {
        let mut prim_to_cons = Matrix4::identity();
        prim_to_cons[(3, 3)] = 1.0 + 0.1 * (1.0 - theta);
        Ok(Jacobians {
            cons_to_prim: Matrix4::identity(),
            prim_to_cons_preconditioned: prim_to_cons,
        })
    }
}

/// A ring has no walls and no periodic pairs beyond its own wrap-around.
struct NoBoundaries;

impl BoundaryCorrector for NoBoundaries {
    fn zero_residuals(&self, _rhs: &mut ConsField) -> Result<(), KernelError> {
        Ok(())
    }

    fn combine_periodic(&self, _rhs: &mut ConsField) -> Result<(), KernelError> {
        Ok(())
    }
}

impl BoundaryConditions for NoBoundaries {
    fn enforce(&self, _cv: &mut ConsField, _dv: &mut DepField) -> Result<(), KernelError> {
        Ok(())
    }
}

/// One Jacobi sweep of the implicit smoothing operator.
struct JacobiSmoother;

impl ResidualSmoother for JacobiSmoother {
    fn smooth(&self, rhs: &mut ConsField, mut work: SmoothingWork<'_>) -> Result<(), KernelError> {
        let n = rhs.len();
        for i in 0..n {
            work.work_a.node_mut(i).copy_from_slice(rhs.node(i));
        }
        let denom = 1.0 + 2.0 * SMOOTHING;
        for i in 0..n {
            let (l, r) = neighbours(i, n);
            let (wl, wc, wr) = (work.work_a.node(l), work.work_a.node(i), work.work_a.node(r));
            let out = rhs.node_mut(i);
            for k in 0..NCONS {
                out[k] = (wc[k] + SMOOTHING * (wl[k] + wr[k])) / denom;
            }
        }
        Ok(())
    }
}

/// Pressure and temperature of a calorically perfect gas.
struct IdealGas;

impl DependentVars for IdealGas {
    fn update(&self, cv: &ConsField, dv: &mut DepField) -> Result<(), KernelError> {
        for (i, u) in cv.iter().enumerate() {
            let [rho, mu, mv, e] = *u;
            if rho <= 0.0 {
                return Err(KernelError::failed(format!(
                    "non-positive density {rho} at node {i}"
                )));
            }
            let p = (GAMMA - 1.0) * (e - 0.5 * (mu * mu + mv * mv) / rho);
            let node = dv.node_mut(i);
            node[0] = p;
            node[1] = p / rho;
        }
        Ok(())
    }
}
