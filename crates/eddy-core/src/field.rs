//! Dense node-indexed field storage.
//!
//! Every field is indexed by mesh node and stays index-stable for the
//! whole step. Conservative quantities are stored node-major as
//! `[f64; NCONS]` so a node's four components are contiguous.

use std::ops::Range;

/// Number of transported (conservative) quantities per node:
/// density, two momentum components, total energy.
pub const NCONS: usize = 4;

/// The conservative components of a single node.
pub type ConsVector = [f64; NCONS];

/// A dense field of [`NCONS`] components per node.
///
/// Used for the conservative state, its step-start snapshot, the
/// dissipation accumulator, and the residual.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConsField {
    data: Vec<ConsVector>,
}

impl ConsField {
    /// A field of `nodes` nodes with every component zero.
    pub fn zeros(nodes: usize) -> Self {
        Self {
            data: vec![[0.0; NCONS]; nodes],
        }
    }

    /// Wrap existing per-node data.
    pub fn from_nodes(data: Vec<ConsVector>) -> Self {
        Self { data }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the field has no nodes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Components of node `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn node(&self, i: usize) -> &ConsVector {
        &self.data[i]
    }

    /// Mutable components of node `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn node_mut(&mut self, i: usize) -> &mut ConsVector {
        &mut self.data[i]
    }

    /// All nodes as a slice.
    pub fn as_slice(&self) -> &[ConsVector] {
        &self.data
    }

    /// All nodes as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [ConsVector] {
        &mut self.data
    }

    /// Iterate over node components in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, ConsVector> {
        self.data.iter()
    }

    /// Set every component of every node to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill([value; NCONS]);
    }

    /// Multiply every component of every node by `factor` in place.
    pub fn scale(&mut self, factor: f64) {
        for node in &mut self.data {
            for c in node.iter_mut() {
                *c *= factor;
            }
        }
    }

    /// Overwrite this field with an independent copy of `other`.
    ///
    /// Reuses the existing allocation when the sizes match.
    pub fn copy_from(&mut self, other: &ConsField) {
        self.data.clone_from(&other.data);
    }

    /// First node in `nodes` holding a NaN or infinite component.
    pub fn first_non_finite(&self, nodes: Range<usize>) -> Option<usize> {
        let end = nodes.end.min(self.data.len());
        let start = nodes.start.min(end);
        self.data[start..end]
            .iter()
            .position(|n| n.iter().any(|c| !c.is_finite()))
            .map(|offset| start + offset)
    }
}

/// Dependent (primitive) variables: a fixed number of components per node.
///
/// The layout of the components (pressure, temperature, speed of sound,
/// ratio of specific heats, ...) is owned by the collaborator that
/// recomputes them; the stepper never writes this field directly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DepField {
    ndv: usize,
    data: Vec<f64>,
}

impl DepField {
    /// A field of `nodes` nodes with `ndv` zeroed components each.
    pub fn zeros(nodes: usize, ndv: usize) -> Self {
        Self {
            ndv,
            data: vec![0.0; nodes * ndv],
        }
    }

    /// Wrap flat node-major data with `ndv` components per node.
    ///
    /// Returns `None` if `ndv` is zero or does not divide the data length.
    pub fn from_flat(ndv: usize, data: Vec<f64>) -> Option<Self> {
        if ndv == 0 || data.len() % ndv != 0 {
            return None;
        }
        Some(Self { ndv, data })
    }

    /// Components per node.
    pub fn ndv(&self) -> usize {
        self.ndv
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.data.len().checked_div(self.ndv).unwrap_or(0)
    }

    /// Whether the field has no nodes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Components of node `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn node(&self, i: usize) -> &[f64] {
        &self.data[i * self.ndv..(i + 1) * self.ndv]
    }

    /// Mutable components of node `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn node_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.ndv..(i + 1) * self.ndv]
    }

    /// Flat node-major data.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable flat node-major data.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Per-node fields shared between spatial collaborators within a stage.
///
/// Gradient providers fill these; the limiter, dissipation, and flux
/// collaborators read them. The stepper only allocates them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuxFields {
    /// x-gradient of the reconstructed variables.
    pub grad_x: ConsField,
    /// y-gradient of the reconstructed variables.
    pub grad_y: ConsField,
    /// x-gradient of velocity and temperature for the viscous flux.
    pub visc_grad_x: ConsField,
    /// y-gradient of velocity and temperature for the viscous flux.
    pub visc_grad_y: ConsField,
    /// Slope limiter values.
    pub limiter: ConsField,
}

impl AuxFields {
    /// Zeroed auxiliary fields for `nodes` nodes.
    pub fn zeros(nodes: usize) -> Self {
        Self {
            grad_x: ConsField::zeros(nodes),
            grad_y: ConsField::zeros(nodes),
            visc_grad_x: ConsField::zeros(nodes),
            visc_grad_y: ConsField::zeros(nodes),
            limiter: ConsField::zeros(nodes),
        }
    }
}
