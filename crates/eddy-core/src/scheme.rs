//! Closed scheme flags decided once per step.
//!
//! These replace ad hoc flag comparisons in the hot path: the solver
//! matches on them once per stage and dispatches to the right
//! collaborator.

use std::fmt;

/// Which set of governing equations is being integrated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum EquationSet {
    /// Inviscid flow: convective flux and artificial dissipation only.
    #[default]
    Euler,
    /// Viscous flow: adds the viscous flux contribution on dissipation stages.
    NavierStokes,
}

impl EquationSet {
    /// Whether viscous terms participate in the residual.
    pub fn is_viscous(self) -> bool {
        matches!(self, Self::NavierStokes)
    }
}

/// Spatial reconstruction order of the upwind scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Reconstruction {
    /// Piecewise-constant states at faces.
    #[default]
    FirstOrder,
    /// Limited linear reconstruction; needs gradients and slope limiters.
    SecondOrder,
}

impl Reconstruction {
    /// Whether this order needs gradients, limiter bounds, and scratch views.
    pub fn is_higher_order(self) -> bool {
        matches!(self, Self::SecondOrder)
    }
}

/// Low-speed preconditioning of the residual.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Preconditioning {
    /// Residual is used as produced by the flux balance.
    #[default]
    Off,
    /// Residual is transformed node by node by the preconditioning matrix,
    /// and the preconditioned dissipation variants are used.
    On,
}

impl Preconditioning {
    /// Whether preconditioning is active.
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for EquationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Euler => write!(f, "euler"),
            Self::NavierStokes => write!(f, "navier-stokes"),
        }
    }
}

impl fmt::Display for Reconstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstOrder => write!(f, "first-order"),
            Self::SecondOrder => write!(f, "second-order"),
        }
    }
}

impl fmt::Display for Preconditioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::On => write!(f, "on"),
        }
    }
}
