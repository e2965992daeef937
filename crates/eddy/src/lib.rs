//! Eddy: explicit multi-stage pseudo-time stepping for compressible
//! finite-volume solvers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Eddy sub-crates. For most users, adding `eddy` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use eddy::prelude::*;
//! use eddy_test_utils::{stub_kernels, uniform_state, CallLog};
//!
//! // Four unit-volume nodes with a constant residual of 0.1 in density.
//! let log = CallLog::new();
//! let kernels = stub_kernels(&log).residual([0.1, 0.0, 0.0, 0.0]).build();
//! let (cv, dv) = uniform_state(4, [1.0, 0.5, 0.0, 2.5]);
//!
//! let config = SolverConfig {
//!     mesh: MeshConfig::uniform(4),
//!     scheme: SchemeConfig {
//!         stages: StageTable::three_stage(),
//!         ..SchemeConfig::default()
//!     },
//!     kernels,
//! };
//! let mut solver = Solver::new(config, cv, dv).unwrap();
//! let mut scratch = ScratchRegion::for_nodes(4, 0);
//!
//! let report = solver.run_step(&mut scratch).unwrap();
//! assert_eq!(report.metrics.stages_completed(), 3);
//! assert!((solver.cv().node(0)[0] - 0.9).abs() < 1e-12);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `eddy-core` | Field containers, scheme flags, stage index, errors |
//! | [`kernel`] | `eddy-kernel` | Collaborator traits, scratch region, stage tables |
//! | [`engine`] | `eddy-engine` | Solver, configuration, dissipation, convergence, metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and errors (`eddy-core`).
///
/// Contains [`types::ConsField`], [`types::DepField`], the scheme flags,
/// and the error types shared by every sub-crate.
pub use eddy_core as types;

/// Collaborator traits and scratch management (`eddy-kernel`).
///
/// Implement the traits in [`kernel::kernel`] and assemble them into a
/// [`kernel::KernelSet`]. Scratch memory is supplied through
/// [`kernel::ScratchRegion`].
pub use eddy_kernel as kernel;

/// Step orchestration (`eddy-engine`).
///
/// [`engine::Solver`] runs one multi-stage step per
/// [`run_step()`](engine::Solver::run_step) call.
pub use eddy_engine as engine;

/// Common imports for typical Eddy usage.
///
/// ```rust
/// use eddy::prelude::*;
/// ```
///
/// This imports the solver and its configuration, the field containers,
/// the scheme flags, the stage table, the scratch region, the collaborator
/// traits, and the error types.
pub mod prelude {
    // Fields and flags
    pub use eddy_core::{
        AuxFields, ConsField, ConsVector, DepField, EquationSet, Preconditioning,
        Reconstruction, StageIndex, NCONS,
    };

    // Errors
    pub use eddy_core::{ConfigError, KernelError, StageTableError, StepError};

    // Collaborators
    pub use eddy_kernel::{
        BoundaryConditions, BoundaryCorrector, ConvectiveFlux, DependentVars,
        DissipationEvaluator, DissipationKind, FlowView, GradientProvider, Jacobians, KernelSet,
        PreconditionerJacobians, ResidualSmoother, SlopeLimiter, TimeStepEstimator, ViscousFlux,
    };

    // Scratch and stages
    pub use eddy_kernel::{
        LimiterBounds, ScratchRegion, SmoothingWork, StageCoefficients, StageTable,
    };

    // Engine
    pub use eddy_engine::{
        Convergence, MeshConfig, SchemeConfig, Solver, SolverConfig, StepMetrics, StepReport,
    };
}
