//! Collaborator traits, scratch management, and stage tables for Eddy.
//!
//! The stepper drives a fixed set of external numerical kernels through
//! the traits in [`kernel`]. Each trait receives exactly the borrows its
//! contract allows: read-only flow views plus mutable access to the one
//! field it populates.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod guard;
pub mod kernel;
pub mod scratch;
pub mod stages;

pub use guard::{CoverageReport, ViewCoverage};
pub use kernel::{
    names, BoundaryConditions, BoundaryCorrector, ConvectiveFlux, DependentVars,
    DissipationEvaluator, DissipationKind, FlowView, GradientProvider, Jacobians, KernelSet,
    PreconditionerJacobians, ResidualSmoother, SlopeLimiter, TimeStepEstimator, ViscousFlux,
};
pub use scratch::{LimiterBounds, NodeView, ScratchRegion, SmoothingWork};
pub use stages::{StageCoefficients, StageTable};
