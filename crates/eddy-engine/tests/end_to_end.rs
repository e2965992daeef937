//! Multi-step scenarios on small meshes with inactive nodes, non-unit
//! volumes, and every optional collaborator switched on.

use eddy_core::{ConsField, EquationSet, Preconditioning, Reconstruction};
use eddy_engine::{MeshConfig, SchemeConfig, Solver, SolverConfig};
use eddy_kernel::{names, ScratchRegion, StageTable};
use eddy_test_utils::{stub_kernels, uniform_state, CallLog, StubKernels};

const R: [f64; 4] = [0.1, 0.2, 0.3, 0.4];
const CV0: [f64; 4] = [1.0, 0.5, 0.0, 2.5];

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
    }
}

/// Four nodes, three active; node 1 has twice the volume.
fn four_node_solver(scheme: SchemeConfig, kernels: StubKernels) -> Solver {
    let (cv, dv) = uniform_state(4, CV0);
    let config = SolverConfig {
        mesh: MeshConfig {
            nnodes: 4,
            nndint: 3,
            vol: vec![1.0, 2.0, 1.0, 1.0],
        },
        scheme,
        kernels: kernels.build(),
    };
    Solver::new(config, cv, dv).unwrap()
}

fn expected_node(scale: f64) -> Vec<f64> {
    CV0.iter().zip(R).map(|(c, r)| c - scale * r).collect()
}

#[test]
fn constant_residual_single_stage() {
    let log = CallLog::new();
    let mut s = four_node_solver(
        SchemeConfig {
            cfl: 2.0,
            ..SchemeConfig::default()
        },
        stub_kernels(&log).residual(R).time_step(0.5),
    );
    let mut scratch = ScratchRegion::for_nodes(4, 0);

    let report = s.run_step(&mut scratch).unwrap();

    // ark * cfl * tstep / vol = 1 / vol
    assert_close(s.cv().node(0), &expected_node(1.0));
    assert_close(s.cv().node(1), &expected_node(0.5));
    assert_close(s.cv().node(2), &expected_node(1.0));
    assert_eq!(s.cv().node(3), &CV0);
    assert_eq!(s.tstep(), &[0.5; 4]);

    // Dependent variables follow the updated density everywhere.
    for i in 0..4 {
        assert_eq!(s.dv().node(i)[0], s.cv().node(i)[0]);
    }

    let c = report.convergence;
    let expected_l2 = ((0.01 + 0.0025 + 0.01) / 3.0f64).sqrt();
    assert!((c.density_change_l2 - expected_l2).abs() < 1e-12);
    assert!((c.density_change_max - 0.1).abs() < 1e-12);
    assert_eq!(c.max_change_node, Some(0));
    assert_eq!(c.relative_l2, 1.0);
}

#[test]
fn repeated_steps_advance_linearly() {
    let log = CallLog::new();
    let mut s = four_node_solver(
        SchemeConfig::default(),
        stub_kernels(&log).residual(R),
    );
    let mut scratch = ScratchRegion::for_nodes(4, 0);

    for step in 1..=3 {
        let report = s.run_step(&mut scratch).unwrap();
        assert!((report.convergence.relative_l2 - 1.0).abs() < 1e-12);
        assert_close(s.cv().node(0), &expected_node(step as f64));
        assert_close(s.step_start_state().node(0), &expected_node((step - 1) as f64));
    }
    assert_eq!(s.steps(), 3);
    assert_eq!(log.count(names::TIME_STEP), 3);
    assert_eq!(s.cv().node(3), &CV0);
}

#[test]
fn hybrid_blend_keeps_constant_dissipation() {
    // Constant contributions d blended as (1 - b) d + b d stay at d, so
    // the last stage sees r - d.
    let log = CallLog::new();
    let d = [0.05; 4];
    let mut s = four_node_solver(
        SchemeConfig {
            stages: StageTable::hybrid_five_stage(),
            ..SchemeConfig::default()
        },
        stub_kernels(&log).residual(R).dissipation(d),
    );
    let mut scratch = ScratchRegion::for_nodes(4, 0);

    s.run_step(&mut scratch).unwrap();

    assert_close(s.diss().node(0), &d);
    let expected: Vec<f64> = CV0
        .iter()
        .zip(R)
        .zip(d)
        .map(|((c, r), d)| c - (r - d))
        .collect();
    assert_close(s.cv().node(0), &expected);
    assert_eq!(log.count(names::DISSIPATION), 3);
}

#[test]
fn full_pipeline_call_counts() {
    let log = CallLog::new();
    let mut s = four_node_solver(
        SchemeConfig {
            stages: StageTable::three_stage(),
            equations: EquationSet::NavierStokes,
            reconstruction: Reconstruction::SecondOrder,
            preconditioning: Preconditioning::On,
            cfl: 1.5,
            smoothing: 0.5,
        },
        stub_kernels(&log).residual(R).constrained(vec![2]),
    );
    let mut scratch = ScratchRegion::for_nodes(4, 8);

    let report = s.run_step(&mut scratch).unwrap();

    let counts = log.counts();
    assert_eq!(counts[names::TIME_STEP], 1);
    assert_eq!(counts[names::GRADIENTS], 3);
    assert_eq!(counts[names::VISCOUS_GRADIENTS], 3);
    assert_eq!(counts[names::VISCOUS_FLUX], 3);
    assert_eq!(counts[names::LIMITER_INIT], 3);
    assert_eq!(counts[names::LIMITER], 3);
    assert_eq!(counts[names::DISSIPATION], 3);
    assert_eq!(counts[names::CONVECTIVE_FLUX], 3);
    assert_eq!(counts[names::PRECONDITIONER], 9);
    assert_eq!(counts[names::ZERO_RESIDUALS], 6);
    assert_eq!(counts[names::PERIODIC], 3);
    assert_eq!(counts[names::SMOOTHER], 3);
    assert_eq!(counts[names::DEPENDENT_VARS], 3);
    assert_eq!(counts[names::BOUNDARY_CONDITIONS], 3);

    assert_eq!(report.metrics.calls(names::PRECONDITIONER), 3);
    assert_eq!(report.metrics.smoothing_passes, 3);
    assert_eq!(s.cv().node(2), &CV0);
    assert_eq!(s.cv().node(3), &CV0);
}

#[test]
fn state_perturbation_between_steps_is_snapshotted() {
    let log = CallLog::new();
    let mut s = four_node_solver(SchemeConfig::default(), stub_kernels(&log));
    let mut scratch = ScratchRegion::for_nodes(4, 0);

    s.run_step(&mut scratch).unwrap();
    s.state_mut()[1][0] = 3.0;
    let perturbed: ConsField = s.cv().clone();
    s.run_step(&mut scratch).unwrap();

    assert_eq!(s.step_start_state(), &perturbed);
    assert_eq!(s.cv(), &perturbed);
}
