//! Explicit multi-stage pseudo-time stepping for compressible finite-volume flow.
//!
//! [`Solver`] advances the conservative state by one full Runge–Kutta
//! step. Each stage runs the residual pipeline (dissipation blending,
//! viscous and upwind dissipation, convective flux, preconditioning,
//! boundary corrections, pseudo-time scaling, implicit smoothing) and
//! then updates the state from the step-start snapshot.
//!
//! # Stage pipeline
//!
//! 1. Dissipation carry-over (`diss *= 1 - betrk` on later recompute stages)
//! 2. Viscous flux (Navier–Stokes, recompute stages)
//! 3. Upwind dissipation (recompute stages; limiter first at second order)
//! 4. Convective flux, producing the raw residual
//! 5. Preconditioning transform
//! 6. Residual zeroing and periodic combination
//! 7. Pseudo-time scaling `ark * cfl * tstep / vol`
//! 8. Implicit residual smoothing, then zeroing again
//! 9. `cv = cvold - rhs`, dependent variables, boundary conditions

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod convergence;
pub mod dissipation;
pub mod metrics;
pub mod precondition;
mod residual;
pub mod solver;
mod state;
mod update;

pub use config::{MeshConfig, SchemeConfig, SolverConfig};
pub use convergence::{Convergence, ConvergenceMonitor};
pub use dissipation::DissipationAccumulator;
pub use metrics::StepMetrics;
pub use solver::{Solver, StepReport};
