//! Solver configuration and validation.
//!
//! [`SolverConfig`] replaces process-wide solver state: the mesh arrays,
//! the stage table, the scheme flags, and the collaborators are handed
//! to [`Solver::new`](crate::Solver::new) once and never change.
//! [`validate()`](SolverConfig::validate) checks structural invariants at
//! construction, never per step.

use eddy_core::{ConfigError, EquationSet, Preconditioning, Reconstruction};
use eddy_kernel::{names, KernelSet, StageTable};

// ── MeshConfig ─────────────────────────────────────────────────────

/// Node counts and control volumes of the mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshConfig {
    /// Total node count, including boundary and dummy nodes.
    pub nnodes: usize,
    /// Active nodes (`0..nndint`) that take part in the state update.
    pub nndint: usize,
    /// Control volume per node. Length `nnodes`.
    pub vol: Vec<f64>,
}

impl MeshConfig {
    /// A mesh where every node is active and has unit volume.
    pub fn uniform(nnodes: usize) -> Self {
        Self {
            nnodes,
            nndint: nnodes,
            vol: vec![1.0; nnodes],
        }
    }
}

// ── SchemeConfig ───────────────────────────────────────────────────

/// Stage table and scheme flags.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemeConfig {
    /// Runge–Kutta stages, executed in table order.
    pub stages: StageTable,
    /// Governing equations.
    pub equations: EquationSet,
    /// Reconstruction order.
    pub reconstruction: Reconstruction,
    /// Low-speed preconditioning.
    pub preconditioning: Preconditioning,
    /// Global CFL number.
    pub cfl: f64,
    /// Implicit residual smoothing coefficient; `0` disables smoothing.
    pub smoothing: f64,
}

impl SchemeConfig {
    /// Whether implicit residual smoothing runs.
    pub fn smoothing_enabled(&self) -> bool {
        self.smoothing > 0.0
    }
}

impl Default for SchemeConfig {
    fn default() -> Self {
        Self {
            stages: StageTable::single_stage(),
            equations: EquationSet::Euler,
            reconstruction: Reconstruction::FirstOrder,
            preconditioning: Preconditioning::Off,
            cfl: 1.0,
            smoothing: 0.0,
        }
    }
}

// ── SolverConfig ───────────────────────────────────────────────────

/// Complete configuration for constructing a [`Solver`](crate::Solver).
pub struct SolverConfig {
    /// Mesh sizes and volumes.
    pub mesh: MeshConfig,
    /// Stage table and scheme flags.
    pub scheme: SchemeConfig,
    /// External collaborators.
    pub kernels: KernelSet,
}

impl SolverConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mesh = &self.mesh;
        let scheme = &self.scheme;

        // 1. Mesh shape.
        if mesh.nnodes == 0 {
            return Err(ConfigError::EmptyMesh);
        }
        if mesh.nndint > mesh.nnodes {
            return Err(ConfigError::ActiveNodesExceedMesh {
                nndint: mesh.nndint,
                nnodes: mesh.nnodes,
            });
        }
        if mesh.vol.len() != mesh.nnodes {
            return Err(ConfigError::LengthMismatch {
                field: "vol",
                expected: mesh.nnodes,
                got: mesh.vol.len(),
            });
        }
        // 2. Active volumes divide the residual scaling.
        for (node, &value) in mesh.vol[..mesh.nndint].iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidVolume { node, value });
            }
        }
        // 3. Scalars.
        if !scheme.cfl.is_finite() || scheme.cfl <= 0.0 {
            return Err(ConfigError::InvalidCfl { value: scheme.cfl });
        }
        if !scheme.smoothing.is_finite() || scheme.smoothing < 0.0 {
            return Err(ConfigError::InvalidSmoothing {
                value: scheme.smoothing,
            });
        }
        // 4. Collaborators required by the flags.
        let k = &self.kernels;
        let viscous = scheme.equations.is_viscous();
        let higher_order = scheme.reconstruction.is_higher_order();
        if viscous && k.gradients.is_none() {
            return Err(missing(names::GRADIENTS, "navier-stokes equations"));
        }
        if higher_order && k.gradients.is_none() {
            return Err(missing(names::GRADIENTS, "second-order reconstruction"));
        }
        if viscous && k.viscous_flux.is_none() {
            return Err(missing(names::VISCOUS_FLUX, "navier-stokes equations"));
        }
        if higher_order && k.limiter.is_none() {
            return Err(missing(names::LIMITER, "second-order reconstruction"));
        }
        if scheme.preconditioning.is_on() && k.preconditioner.is_none() {
            return Err(missing(names::PRECONDITIONER, "preconditioning"));
        }
        if scheme.smoothing_enabled() && k.smoother.is_none() {
            return Err(missing(names::SMOOTHER, "a positive smoothing coefficient"));
        }

        Ok(())
    }
}

fn missing(kernel: &'static str, required_by: &'static str) -> ConfigError {
    ConfigError::MissingKernel {
        kernel,
        required_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_test_utils::{stub_kernels, CallLog};

    fn config(nnodes: usize) -> SolverConfig {
        SolverConfig {
            mesh: MeshConfig::uniform(nnodes),
            scheme: SchemeConfig::default(),
            kernels: stub_kernels(&CallLog::new()).build(),
        }
    }

    #[test]
    fn default_config_validates() {
        config(4).validate().unwrap();
    }

    #[test]
    fn empty_mesh_rejected() {
        assert_eq!(config(0).validate(), Err(ConfigError::EmptyMesh));
    }

    #[test]
    fn active_nodes_bounded_by_mesh() {
        let mut c = config(4);
        c.mesh.nndint = 5;
        assert_eq!(
            c.validate(),
            Err(ConfigError::ActiveNodesExceedMesh {
                nndint: 5,
                nnodes: 4
            })
        );
    }

    #[test]
    fn volume_length_checked() {
        let mut c = config(4);
        c.mesh.vol.pop();
        assert!(matches!(
            c.validate(),
            Err(ConfigError::LengthMismatch { field: "vol", .. })
        ));
    }

    #[test]
    fn only_active_volumes_must_be_positive() {
        let mut c = config(4);
        c.mesh.nndint = 3;
        c.mesh.vol[3] = 0.0;
        c.validate().unwrap();
        c.mesh.vol[1] = -1.0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::InvalidVolume {
                node: 1,
                value: -1.0
            })
        );
    }

    #[test]
    fn cfl_and_smoothing_checked() {
        let mut c = config(2);
        c.scheme.cfl = 0.0;
        assert!(matches!(c.validate(), Err(ConfigError::InvalidCfl { .. })));
        c.scheme.cfl = 2.0;
        c.scheme.smoothing = f64::NAN;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidSmoothing { .. })
        ));
    }

    #[test]
    fn flags_require_their_kernels() {
        let log = CallLog::new();

        let mut c = config(2);
        c.kernels = stub_kernels(&log).without_gradients().build();
        c.scheme.reconstruction = Reconstruction::SecondOrder;
        assert_eq!(
            c.validate(),
            Err(ConfigError::MissingKernel {
                kernel: names::GRADIENTS,
                required_by: "second-order reconstruction"
            })
        );

        let mut c = config(2);
        c.kernels = stub_kernels(&log).without_viscous_flux().build();
        c.scheme.equations = EquationSet::NavierStokes;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::MissingKernel {
                kernel: names::VISCOUS_FLUX,
                ..
            })
        ));

        let mut c = config(2);
        c.kernels = stub_kernels(&log).without_limiter().build();
        c.scheme.reconstruction = Reconstruction::SecondOrder;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::MissingKernel {
                kernel: names::LIMITER,
                ..
            })
        ));

        let mut c = config(2);
        c.kernels = stub_kernels(&log).without_preconditioner().build();
        c.scheme.preconditioning = Preconditioning::On;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::MissingKernel {
                kernel: names::PRECONDITIONER,
                ..
            })
        ));

        let mut c = config(2);
        c.kernels = stub_kernels(&log).without_smoother().build();
        c.scheme.smoothing = 0.5;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::MissingKernel {
                kernel: names::SMOOTHER,
                ..
            })
        ));
    }

    #[test]
    fn optional_kernels_not_needed_by_default_flags() {
        let mut c = config(3);
        c.kernels = stub_kernels(&CallLog::new())
            .without_gradients()
            .without_viscous_flux()
            .without_limiter()
            .without_preconditioner()
            .without_smoother()
            .build();
        c.validate().unwrap();
    }
}
