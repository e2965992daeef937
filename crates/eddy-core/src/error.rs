//! Error types for the Eddy workspace.
//!
//! Organized by subsystem: collaborator kernels, the step orchestrator,
//! stage-table validation, and solver configuration.

use thiserror::Error;

use crate::id::StageIndex;

/// Errors returned by an external collaborator (flux, dissipation,
/// smoothing, boundary, ...).
///
/// Wrapped in [`StepError::KernelFailed`] by the solver; never retried.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum KernelError {
    /// The collaborator could not complete its operation.
    #[error("execution failed: {reason}")]
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A collaborator produced or observed a non-finite value.
    #[error("non-finite value in {field} at node {node}")]
    NonFinite {
        /// Name of the offending field.
        field: &'static str,
        /// Node index of the first non-finite value.
        node: usize,
    },
    /// A per-node matrix could not be inverted.
    #[error("singular matrix at node {node}")]
    SingularMatrix {
        /// Node index of the singular matrix.
        node: usize,
    },
}

impl KernelError {
    /// Shorthand for [`KernelError::ExecutionFailed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            reason: reason.into(),
        }
    }
}

/// Errors from one pseudo-time step (`Solver::run_step` in `eddy-engine`).
///
/// Every variant is fatal for the step. After [`StepError::KernelFailed`]
/// or [`StepError::NonFiniteState`] the conservative state, dependent
/// variables, residual, and dissipation are indeterminate and the step
/// must be discarded.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum StepError {
    /// The real scratch buffer cannot host the two limiter-bound views.
    ///
    /// Detected before any stage executes and before the step-start
    /// snapshot is taken.
    #[error("insufficient scratch space: {required} reals required, {supplied} supplied")]
    ScratchTooSmall {
        /// Minimum number of reals, `2 * NCONS * nnodes`.
        required: usize,
        /// Length of the supplied buffer.
        supplied: usize,
    },
    /// A collaborator returned an error.
    #[error("kernel '{kernel}' failed{}: {source}", stage_suffix(.stage))]
    KernelFailed {
        /// Name of the failing collaborator operation.
        kernel: &'static str,
        /// Stage in which the failure occurred; `None` before the stage loop.
        stage: Option<StageIndex>,
        /// The underlying collaborator error.
        #[source]
        source: KernelError,
    },
    /// The updated conservative state holds a NaN or infinity.
    #[error("non-finite conservative state at node {node} after stage {stage}")]
    NonFiniteState {
        /// Stage whose update produced the value.
        stage: StageIndex,
        /// First offending active node.
        node: usize,
    },
}

fn stage_suffix(stage: &Option<StageIndex>) -> String {
    match stage {
        Some(s) => format!(" in stage {s}"),
        None => String::new(),
    }
}

/// Errors detected while validating a stage coefficient table.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum StageTableError {
    /// The table has no stages.
    #[error("stage table has no stages")]
    Empty,
    /// A coefficient is NaN or infinite.
    #[error("stage {stage}: {name} must be finite, got {value}")]
    NonFiniteCoefficient {
        /// Offending stage.
        stage: StageIndex,
        /// Coefficient name (`ark` or `betrk`).
        name: &'static str,
        /// The offending value.
        value: f64,
    },
    /// The dissipation-blend weight lies outside `[0, 1]`.
    #[error("stage {stage}: dissipation blend weight must be in [0, 1], got {value}")]
    BlendOutOfRange {
        /// Offending stage.
        stage: StageIndex,
        /// The offending value.
        value: f64,
    },
}

/// Errors detected while validating a solver configuration.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The mesh has no nodes.
    #[error("mesh has zero nodes")]
    EmptyMesh,
    /// More active nodes than nodes.
    #[error("active node count {nndint} exceeds node count {nnodes}")]
    ActiveNodesExceedMesh {
        /// Configured active node count.
        nndint: usize,
        /// Configured node count.
        nnodes: usize,
    },
    /// A per-node input has the wrong number of nodes.
    #[error("{field} has {got} nodes, expected {expected}")]
    LengthMismatch {
        /// Name of the input.
        field: &'static str,
        /// Expected node count.
        expected: usize,
        /// Actual node count.
        got: usize,
    },
    /// An active node has a non-positive or non-finite control volume.
    #[error("control volume at node {node} must be finite and positive, got {value}")]
    InvalidVolume {
        /// Offending node.
        node: usize,
        /// The offending value.
        value: f64,
    },
    /// The stage coefficient table is invalid.
    #[error("stage table: {0}")]
    Stages(#[from] StageTableError),
    /// The CFL number is NaN, infinite, zero, or negative.
    #[error("cfl must be finite and positive, got {value}")]
    InvalidCfl {
        /// The offending value.
        value: f64,
    },
    /// The residual smoothing coefficient is NaN, infinite, or negative.
    #[error("smoothing coefficient must be finite and >= 0, got {value}")]
    InvalidSmoothing {
        /// The offending value.
        value: f64,
    },
    /// A collaborator required by the scheme flags was not supplied.
    #[error("missing {kernel} kernel, required by {required_by}")]
    MissingKernel {
        /// Name of the missing collaborator.
        kernel: &'static str,
        /// The flag that requires it.
        required_by: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn kernel_failure_display_names_stage() {
        let err = StepError::KernelFailed {
            kernel: "convective_flux",
            stage: Some(StageIndex(2)),
            source: KernelError::failed("boom"),
        };
        let msg = err.to_string();
        assert!(msg.contains("convective_flux"));
        assert!(msg.contains("stage 3"));
        assert!(msg.contains("boom"));
        assert!(err.source().is_some());
    }

    #[test]
    fn kernel_failure_before_stages_has_no_stage() {
        let err = StepError::KernelFailed {
            kernel: "time_step",
            stage: None,
            source: KernelError::NonFinite {
                field: "tstep",
                node: 7,
            },
        };
        assert_eq!(
            err.to_string(),
            "kernel 'time_step' failed: non-finite value in tstep at node 7"
        );
    }

    #[test]
    fn scratch_error_reports_sizes() {
        let err = StepError::ScratchTooSmall {
            required: 32,
            supplied: 31,
        };
        assert!(err.to_string().contains("32"));
        assert!(err.to_string().contains("31"));
    }

    #[test]
    fn config_wraps_stage_table_error() {
        let err: ConfigError = StageTableError::Empty.into();
        assert_eq!(err, ConfigError::Stages(StageTableError::Empty));
        assert!(err.to_string().contains("no stages"));
    }
}
