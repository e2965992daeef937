//! Collaborator failures abort the step with the collaborator name and
//! stage, without retry and without rolling back completed stages.

use std::error::Error;

use eddy_core::{
    AuxFields, ConfigError, ConsField, DepField, KernelError, Preconditioning, Reconstruction,
    StageIndex, StepError,
};
use eddy_engine::{MeshConfig, SchemeConfig, Solver, SolverConfig, StepMetrics};
use eddy_kernel::{
    names, BoundaryConditions, ConvectiveFlux, DependentVars, FlowView, Jacobians, KernelSet,
    ScratchRegion, StageTable,
};
use eddy_test_utils::{ramp_state, stub_kernels, CallLog, StubKernels};
use nalgebra::Matrix4;

fn solver(scheme: SchemeConfig, kernels: StubKernels) -> Solver {
    let (cv, dv) = ramp_state(3);
    let config = SolverConfig {
        mesh: MeshConfig::uniform(3),
        scheme,
        kernels: kernels.build(),
    };
    Solver::new(config, cv, dv).unwrap()
}

fn solver_with(scheme: SchemeConfig, kernels: KernelSet) -> Solver {
    let (cv, dv) = ramp_state(3);
    let config = SolverConfig {
        mesh: MeshConfig::uniform(3),
        scheme,
        kernels,
    };
    Solver::new(config, cv, dv).unwrap()
}

fn three_stage() -> SchemeConfig {
    SchemeConfig {
        stages: StageTable::three_stage(),
        ..SchemeConfig::default()
    }
}

#[test]
fn flux_failure_in_second_stage_keeps_first_stage_update() {
    let log = CallLog::new();
    log.fail_after(names::CONVECTIVE_FLUX, 1);
    let mut s = solver(three_stage(), stub_kernels(&log).residual([1.0, 0.0, 0.0, 0.0]));
    let before = s.cv().clone();
    let mut scratch = ScratchRegion::for_nodes(3, 0);

    let err = s.run_step(&mut scratch).unwrap_err();

    assert!(matches!(
        err,
        StepError::KernelFailed {
            kernel: names::CONVECTIVE_FLUX,
            stage: Some(StageIndex(1)),
            source: KernelError::ExecutionFailed { .. },
        }
    ));
    let msg = err.to_string();
    assert!(msg.contains("convective_flux"), "{msg}");
    assert!(msg.contains("stage 2"), "{msg}");
    assert!(err.source().is_some());

    // Stage 1 (ark = 0.1481) already wrote cv; nothing is rolled back.
    assert!((s.cv().node(0)[0] - (before.node(0)[0] - 0.1481)).abs() < 1e-12);
    assert_eq!(s.step_start_state(), &before);
    assert_eq!(log.count(names::CONVECTIVE_FLUX), 2);
    assert_eq!(log.count(names::DEPENDENT_VARS), 1);
    assert_eq!(s.steps(), 0);
    assert_eq!(s.last_metrics(), &StepMetrics::default());
}

#[test]
fn time_step_failure_has_no_stage() {
    let log = CallLog::new();
    log.fail_after(names::TIME_STEP, 0);
    let mut s = solver(three_stage(), stub_kernels(&log).residual([1.0; 4]));
    let before = s.cv().clone();
    let mut scratch = ScratchRegion::for_nodes(3, 0);

    let err = s.run_step(&mut scratch).unwrap_err();

    assert!(matches!(
        err,
        StepError::KernelFailed {
            kernel: names::TIME_STEP,
            stage: None,
            ..
        }
    ));
    assert!(!err.to_string().contains("stage"));
    assert_eq!(s.cv(), &before);
    assert_eq!(log.calls(), vec![names::TIME_STEP]);
}

#[test]
fn boundary_condition_failure_reports_its_stage() {
    let log = CallLog::new();
    log.fail_after(names::BOUNDARY_CONDITIONS, 2);
    let mut s = solver(three_stage(), stub_kernels(&log));
    let mut scratch = ScratchRegion::for_nodes(3, 0);

    let err = s.run_step(&mut scratch).unwrap_err();

    assert!(matches!(
        err,
        StepError::KernelFailed {
            kernel: names::BOUNDARY_CONDITIONS,
            stage: Some(StageIndex(2)),
            ..
        }
    ));
}

#[test]
fn limiter_failure_stops_before_dissipation() {
    let log = CallLog::new();
    log.fail_after(names::LIMITER, 0);
    let mut s = solver(
        SchemeConfig {
            reconstruction: Reconstruction::SecondOrder,
            ..SchemeConfig::default()
        },
        stub_kernels(&log),
    );
    let mut scratch = ScratchRegion::for_nodes(3, 0);

    let err = s.run_step(&mut scratch).unwrap_err();

    assert!(matches!(
        err,
        StepError::KernelFailed {
            kernel: names::LIMITER,
            ..
        }
    ));
    assert_eq!(log.count(names::DISSIPATION), 0);
    assert_eq!(log.count(names::CONVECTIVE_FLUX), 0);
}

#[test]
fn singular_preconditioning_jacobian() {
    let log = CallLog::new();
    let mut s = solver(
        SchemeConfig {
            preconditioning: Preconditioning::On,
            ..SchemeConfig::default()
        },
        stub_kernels(&log).jacobians(Jacobians {
            cons_to_prim: Matrix4::identity(),
            prim_to_cons_preconditioned: Matrix4::zeros(),
        }),
    );
    let mut scratch = ScratchRegion::for_nodes(3, 0);

    let err = s.run_step(&mut scratch).unwrap_err();

    assert_eq!(
        err,
        StepError::KernelFailed {
            kernel: names::PRECONDITIONER,
            stage: Some(StageIndex(0)),
            source: KernelError::SingularMatrix { node: 0 },
        }
    );
    assert_eq!(log.count(names::ZERO_RESIDUALS), 0);
}

#[test]
fn non_finite_update_aborts() {
    let log = CallLog::new();
    let mut s = solver(three_stage(), stub_kernels(&log).residual([f64::NAN, 0.0, 0.0, 0.0]));
    let mut scratch = ScratchRegion::for_nodes(3, 0);

    let err = s.run_step(&mut scratch).unwrap_err();

    assert_eq!(
        err,
        StepError::NonFiniteState {
            stage: StageIndex(0),
            node: 0
        }
    );
    assert_eq!(log.count(names::CONVECTIVE_FLUX), 1);
}

#[test]
fn smoother_failure_reports_its_name() {
    let log = CallLog::new();
    log.fail_after(names::SMOOTHER, 0);
    let mut s = solver(
        SchemeConfig {
            smoothing: 0.5,
            ..SchemeConfig::default()
        },
        stub_kernels(&log),
    );
    let mut scratch = ScratchRegion::for_nodes(3, 0);

    let err = s.run_step(&mut scratch).unwrap_err();

    assert!(matches!(
        err,
        StepError::KernelFailed {
            kernel: names::SMOOTHER,
            stage: Some(StageIndex(0)),
            ..
        }
    ));
    assert_eq!(log.count(names::ZERO_RESIDUALS), 1);
}

#[test]
fn solver_steps_again_after_a_failure() {
    let log = CallLog::new();
    log.fail_after(names::DISSIPATION, 0);
    let mut s = solver(three_stage(), stub_kernels(&log));
    let mut scratch = ScratchRegion::for_nodes(3, 0);

    assert!(s.run_step(&mut scratch).is_err());
    log.disarm(names::DISSIPATION);
    assert!(s.run_step(&mut scratch).is_ok());
    assert_eq!(s.steps(), 1);
}

#[test]
fn missing_collaborator_rejected_at_construction() {
    let (cv, dv) = ramp_state(3);
    let config = SolverConfig {
        mesh: MeshConfig::uniform(3),
        scheme: SchemeConfig {
            reconstruction: Reconstruction::SecondOrder,
            ..SchemeConfig::default()
        },
        kernels: stub_kernels(&CallLog::new()).without_limiter().build(),
    };
    assert!(matches!(
        Solver::new(config, cv, dv),
        Err(ConfigError::MissingKernel {
            kernel: names::LIMITER,
            ..
        })
    ));
}

// ── Collaborators that resize solver fields ────────────────────────

struct ShrinkingDependentVars;

impl DependentVars for ShrinkingDependentVars {
    fn update(&self, _cv: &ConsField, dv: &mut DepField) -> Result<(), KernelError> {
        *dv = DepField::zeros(1, dv.ndv());
        Ok(())
    }
}

struct ShrinkingBoundaryConditions;

impl BoundaryConditions for ShrinkingBoundaryConditions {
    fn enforce(&self, cv: &mut ConsField, _dv: &mut DepField) -> Result<(), KernelError> {
        *cv = ConsField::zeros(2);
        Ok(())
    }
}

struct ShortResidualFlux;

impl ConvectiveFlux for ShortResidualFlux {
    fn flux(
        &self,
        _order: Reconstruction,
        _flow: FlowView<'_>,
        _aux: &AuxFields,
        _diss: &ConsField,
        rhs: &mut ConsField,
    ) -> Result<(), KernelError> {
        *rhs = ConsField::zeros(1);
        Ok(())
    }
}

#[test]
fn dependent_vars_resize_fails_the_stage() {
    let mut kernels = stub_kernels(&CallLog::new()).build();
    kernels.dependent_vars = Box::new(ShrinkingDependentVars);
    let mut s = solver_with(three_stage(), kernels);
    let mut scratch = ScratchRegion::for_nodes(3, 0);

    let err = s.run_step(&mut scratch).unwrap_err();

    assert!(matches!(
        err,
        StepError::KernelFailed {
            kernel: names::DEPENDENT_VARS,
            stage: Some(StageIndex(0)),
            source: KernelError::ExecutionFailed { .. },
        }
    ));
    assert!(err.to_string().contains("dv resized to 1 nodes, expected 3"));
}

#[test]
fn boundary_conditions_resize_fails_the_stage() {
    let mut kernels = stub_kernels(&CallLog::new()).build();
    kernels.boundary_conditions = Box::new(ShrinkingBoundaryConditions);
    let mut s = solver_with(
        SchemeConfig {
            preconditioning: Preconditioning::On,
            ..three_stage()
        },
        kernels,
    );
    let mut scratch = ScratchRegion::for_nodes(3, 0);

    let err = s.run_step(&mut scratch).unwrap_err();

    assert!(matches!(
        err,
        StepError::KernelFailed {
            kernel: names::BOUNDARY_CONDITIONS,
            stage: Some(StageIndex(0)),
            ..
        }
    ));
    assert!(err.to_string().contains("cv resized to 2 nodes, expected 3"));
}

#[test]
fn short_residual_fails_before_preconditioning() {
    let log = CallLog::new();
    let mut kernels = stub_kernels(&log).build();
    kernels.convective_flux = Box::new(ShortResidualFlux);
    let mut s = solver_with(
        SchemeConfig {
            preconditioning: Preconditioning::On,
            ..SchemeConfig::default()
        },
        kernels,
    );
    let mut scratch = ScratchRegion::for_nodes(3, 0);

    let err = s.run_step(&mut scratch).unwrap_err();

    assert!(matches!(
        err,
        StepError::KernelFailed {
            kernel: names::CONVECTIVE_FLUX,
            ..
        }
    ));
    assert!(err.to_string().contains("rhs has 1 nodes, 3 active nodes required"));
    assert_eq!(log.count(names::PRECONDITIONER), 0);
}
