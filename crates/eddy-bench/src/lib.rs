//! Benchmark profiles and utilities for the Eddy pseudo-time stepper.
//!
//! Provides pre-built solver profiles on a periodic ring mesh where every
//! collaborator does real, if simple, numerical work:
//!
//! - [`reference_profile`]: 10K nodes, three-stage scheme, first order
//! - [`stress_profile`]: 100K nodes, hybrid five-stage scheme with
//!   Navier–Stokes, second order, preconditioning, and smoothing
//! - [`perturbed_state`]: deterministic initial state via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod ring;

use eddy_core::{ConsField, DepField, EquationSet, Preconditioning, Reconstruction};
use eddy_engine::{MeshConfig, SchemeConfig, SolverConfig};
use eddy_kernel::StageTable;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use ring::{ring_kernels, RING_NDV};

/// Freestream conservative state the perturbations are applied to.
pub const FREESTREAM: [f64; 4] = [1.0, 0.5, 0.0, 2.5];

/// A solver configuration together with its initial state.
pub struct Profile {
    /// Validated-on-construction configuration.
    pub config: SolverConfig,
    /// Initial conservative state.
    pub cv: ConsField,
    /// Initial dependent variables.
    pub dv: DepField,
}

/// Build a reference benchmark profile: 10K-node ring.
///
/// Three-stage scheme, Euler equations, first order, no preconditioning,
/// no smoothing. CFL 1.5.
pub fn reference_profile(seed: u64) -> Profile {
    ring_profile(
        10_000,
        seed,
        SchemeConfig {
            stages: StageTable::three_stage(),
            cfl: 1.5,
            ..SchemeConfig::default()
        },
    )
}

/// Build a stress benchmark profile: 100K-node ring.
///
/// Every optional pipeline stage is switched on: hybrid five-stage table,
/// Navier–Stokes, second-order reconstruction, preconditioning, and
/// implicit residual smoothing.
pub fn stress_profile(seed: u64) -> Profile {
    ring_profile(
        100_000,
        seed,
        SchemeConfig {
            stages: StageTable::hybrid_five_stage(),
            equations: EquationSet::NavierStokes,
            reconstruction: Reconstruction::SecondOrder,
            preconditioning: Preconditioning::On,
            cfl: 2.5,
            smoothing: 0.5,
        },
    )
}

/// Ring of `nnodes` unit-volume nodes, all active, driven by
/// [`ring_kernels`].
pub fn ring_profile(nnodes: usize, seed: u64, scheme: SchemeConfig) -> Profile {
    let cv = perturbed_state(nnodes, seed);
    let dv = DepField::zeros(nnodes, RING_NDV);
    Profile {
        config: SolverConfig {
            mesh: MeshConfig::uniform(nnodes),
            scheme,
            kernels: ring_kernels(),
        },
        cv,
        dv,
    }
}

/// Freestream state with a seeded perturbation of up to 1% per component.
pub fn perturbed_state(nnodes: usize, seed: u64) -> ConsField {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let nodes = (0..nnodes)
        .map(|_| {
            let mut node = FREESTREAM;
            for v in &mut node {
                *v += 0.01 * (rng.random::<f64>() - 0.5);
            }
            node
        })
        .collect();
    ConsField::from_nodes(nodes)
}
