//! Step orchestrator: one explicit multi-stage pseudo-time step.
//!
//! [`Solver`] owns the flow fields and the collaborators. Each
//! [`run_step()`](Solver::run_step) call checks the caller's scratch,
//! snapshots the state, estimates local time steps, then runs every
//! stage of the table through the residual pipeline and the state
//! updater.
//!
//! # Failure
//!
//! A failing collaborator aborts the step immediately. There is no
//! rollback: stages that completed before the failure have already
//! overwritten `cv`, and the snapshot of the failed step remains
//! readable through [`step_start_state()`](Solver::step_start_state).

use std::time::Instant;

use eddy_core::{ConfigError, ConsField, ConsVector, DepField, StepError};
use eddy_kernel::{names, FlowView, KernelSet, ScratchRegion};
use tracing::debug;

use crate::config::{MeshConfig, SchemeConfig, SolverConfig};
use crate::convergence::{Convergence, ConvergenceMonitor};
use crate::dissipation::DissipationAccumulator;
use crate::metrics::{micros, StepMetrics};
use crate::residual::{call, ResidualPipeline};
use crate::state::FlowState;
use crate::update::StateUpdater;

// ── StepReport ─────────────────────────────────────────────────────

/// Result of a successful step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// Performance metrics for this step.
    pub metrics: StepMetrics,
    /// Density change over this step.
    pub convergence: Convergence,
}

// ── Solver ─────────────────────────────────────────────────────────

/// Explicit multi-stage Runge–Kutta pseudo-time stepper.
pub struct Solver {
    mesh: MeshConfig,
    scheme: SchemeConfig,
    kernels: KernelSet,
    state: FlowState,
    dissipation: DissipationAccumulator,
    monitor: ConvergenceMonitor,
    steps: u64,
    last_metrics: StepMetrics,
}

impl Solver {
    /// Construct a solver from a [`SolverConfig`] and the initial state.
    ///
    /// Validates the configuration and the state sizes, then allocates
    /// every solver-owned field. Consumes the `SolverConfig`.
    pub fn new(config: SolverConfig, cv: ConsField, dv: DepField) -> Result<Self, ConfigError> {
        config.validate()?;
        let SolverConfig {
            mesh,
            scheme,
            kernels,
        } = config;

        if cv.len() != mesh.nnodes {
            return Err(ConfigError::LengthMismatch {
                field: "cv",
                expected: mesh.nnodes,
                got: cv.len(),
            });
        }
        if dv.len() != mesh.nnodes {
            return Err(ConfigError::LengthMismatch {
                field: "dv",
                expected: mesh.nnodes,
                got: dv.len(),
            });
        }

        debug!(
            nnodes = mesh.nnodes,
            nndint = mesh.nndint,
            stages = scheme.stages.len(),
            equations = %scheme.equations,
            reconstruction = %scheme.reconstruction,
            preconditioning = %scheme.preconditioning,
            "solver configured"
        );

        Ok(Self {
            state: FlowState::new(cv, dv, mesh.nndint),
            dissipation: DissipationAccumulator::new(mesh.nnodes),
            mesh,
            scheme,
            kernels,
            monitor: ConvergenceMonitor::new(),
            steps: 0,
            last_metrics: StepMetrics::default(),
        })
    }

    /// Advance the state by one full multi-stage step.
    ///
    /// Fails with [`StepError::ScratchTooSmall`] before touching any
    /// field if `scratch` cannot host two views over every node.
    pub fn run_step(&mut self, scratch: &mut ScratchRegion) -> Result<StepReport, StepError> {
        let step_start = Instant::now();

        // 1. Scratch sizing, before any side effect.
        scratch.check_capacity(self.mesh.nnodes)?;

        debug!(
            step = self.steps + 1,
            nnodes = self.mesh.nnodes,
            nndint = self.mesh.nndint,
            stages = self.scheme.stages.len(),
            smoothing = self.scheme.smoothing,
            "step start"
        );

        // 2. Snapshot and dissipation reset.
        self.state.cvold.copy_from(&self.state.cv);
        self.dissipation.reset();

        // 3. Local time steps.
        let mut metrics = StepMetrics::default();
        let time_step_start = Instant::now();
        let flow = FlowView {
            cv: &self.state.cv,
            dv: &self.state.dv,
        };
        let (kernels, tstep) = (&self.kernels, &mut self.state.tstep);
        call(&mut metrics, names::TIME_STEP, None, || {
            kernels.time_step.local_time_steps(flow, tstep)
        })?;
        metrics.time_step_us = micros(time_step_start.elapsed());

        // 4. Stages.
        for (stage, coeffs) in self.scheme.stages.iter() {
            let stage_start = Instant::now();
            debug!(
                stage = %stage,
                ark = coeffs.ark,
                betrk = coeffs.betrk,
                recompute_dissipation = coeffs.recompute_dissipation,
                "stage"
            );

            // 4a. Residual pipeline.
            ResidualPipeline {
                mesh: &self.mesh,
                scheme: &self.scheme,
                kernels: &self.kernels,
                flow: FlowView {
                    cv: &self.state.cv,
                    dv: &self.state.dv,
                },
                tstep: &self.state.tstep,
                dissipation: &mut self.dissipation,
                rhs: &mut self.state.rhs,
                aux: &mut self.state.aux,
                scratch: &mut *scratch,
                metrics: &mut metrics,
            }
            .run(stage, coeffs)?;

            // 4b. State update.
            StateUpdater {
                kernels: &self.kernels,
                nndint: self.mesh.nndint,
                cv: &mut self.state.cv,
                cvold: &self.state.cvold,
                dv: &mut self.state.dv,
                rhs: &self.state.rhs,
                metrics: &mut metrics,
            }
            .run(stage)?;

            metrics.stage_us.push(micros(stage_start.elapsed()));
        }

        // 5. Convergence and metrics.
        let convergence = self
            .monitor
            .measure(&self.state.cv, &self.state.cvold, self.mesh.nndint);
        metrics.total_us = micros(step_start.elapsed());
        self.steps += 1;
        self.last_metrics = metrics.clone();

        Ok(StepReport {
            metrics,
            convergence,
        })
    }

    /// Real scratch capacity `run_step` requires.
    pub fn scratch_requirement(&self) -> usize {
        ScratchRegion::required_reals(self.mesh.nnodes)
    }

    /// Forget the convergence reference; the next step sets a new one.
    pub fn reset_convergence(&mut self) {
        self.monitor.reset();
    }

    /// Metrics from the most recent successful step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// Number of successful steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Conservative state.
    pub fn cv(&self) -> &ConsField {
        &self.state.cv
    }

    /// Mutable conservative node values, for setup or perturbation
    /// between steps. The node count is fixed at construction.
    pub fn state_mut(&mut self) -> &mut [ConsVector] {
        self.state.cv.as_mut_slice()
    }

    /// Dependent variables.
    pub fn dv(&self) -> &DepField {
        &self.state.dv
    }

    /// Snapshot of `cv` taken at the start of the most recent step.
    pub fn step_start_state(&self) -> &ConsField {
        &self.state.cvold
    }

    /// Accumulated dissipation.
    pub fn diss(&self) -> &ConsField {
        self.dissipation.field()
    }

    /// Residual of the last completed stage. Covers active nodes only.
    pub fn rhs(&self) -> &ConsField {
        &self.state.rhs
    }

    /// Local pseudo-time steps of the most recent step.
    pub fn tstep(&self) -> &[f64] {
        &self.state.tstep
    }

    /// Mesh sizes and volumes.
    pub fn mesh(&self) -> &MeshConfig {
        &self.mesh
    }

    /// Stage table and scheme flags.
    pub fn config(&self) -> &SchemeConfig {
        &self.scheme
    }
}
