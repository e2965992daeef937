//! Caller-supplied scratch memory for limiter bounds and smoothing.
//!
//! The caller hands the solver a flat real buffer and an integer buffer.
//! [`ScratchRegion::check_capacity`] runs once per step, before any
//! stage. Whenever a sub-step needs scratch, the region carves exactly
//! two equal-length, node-indexed views out of the real buffer, poisons
//! them with `NaN`, and lends them for the duration of that sub-step
//! only. Nothing written into a view survives to the next consumer.

use eddy_core::{StepError, NCONS};

/// A node-indexed window of [`NCONS`] reals per node into scratch memory.
pub struct NodeView<'a> {
    data: &'a mut [f64],
}

impl<'a> NodeView<'a> {
    fn new(data: &'a mut [f64]) -> Self {
        Self { data }
    }

    /// Number of nodes covered.
    pub fn nodes(&self) -> usize {
        self.data.len() / NCONS
    }

    /// The [`NCONS`] slots of node `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn node(&self, i: usize) -> &[f64] {
        &self.data[i * NCONS..(i + 1) * NCONS]
    }

    /// The mutable [`NCONS`] slots of node `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn node_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * NCONS..(i + 1) * NCONS]
    }

    /// Flat node-major slots.
    pub fn as_slice(&self) -> &[f64] {
        &*self.data
    }

    /// Mutable flat node-major slots.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut *self.data
    }

    /// Slots among the first `nodes` nodes still holding the poison value.
    pub fn unwritten(&self, nodes: usize) -> usize {
        let end = nodes.min(self.nodes()) * NCONS;
        self.data[..end].iter().filter(|v| v.is_nan()).count()
    }
}

/// Per-node minimum and maximum bounds used by the slope limiter.
pub struct LimiterBounds<'a> {
    /// Lower bounds.
    pub umin: NodeView<'a>,
    /// Upper bounds.
    pub umax: NodeView<'a>,
}

/// Scratch lent to the implicit residual smoother.
pub struct SmoothingWork<'a> {
    /// First real work view.
    pub work_a: NodeView<'a>,
    /// Second real work view.
    pub work_b: NodeView<'a>,
    /// The whole integer scratch buffer.
    pub ints: &'a mut [usize],
}

/// Real and integer scratch buffers supplied by the caller.
///
/// Allocated once by the caller and reused across steps; the solver
/// never grows them.
pub struct ScratchRegion {
    reals: Vec<f64>,
    ints: Vec<usize>,
}

impl ScratchRegion {
    /// Zero-initialized buffers with the given capacities.
    pub fn new(reals: usize, ints: usize) -> Self {
        Self {
            reals: vec![0.0; reals],
            ints: vec![0; ints],
        }
    }

    /// Wrap existing buffers.
    pub fn from_buffers(reals: Vec<f64>, ints: Vec<usize>) -> Self {
        Self { reals, ints }
    }

    /// Exactly enough real scratch for a mesh of `nnodes` nodes.
    pub fn for_nodes(nnodes: usize, ints: usize) -> Self {
        Self::new(Self::required_reals(nnodes), ints)
    }

    /// Minimum real capacity for `nnodes` nodes: two views of
    /// [`NCONS`] reals per node.
    pub fn required_reals(nnodes: usize) -> usize {
        NCONS.saturating_mul(2).saturating_mul(nnodes)
    }

    /// Fail with [`StepError::ScratchTooSmall`] if the real buffer cannot
    /// host two views over `nnodes` nodes.
    pub fn check_capacity(&self, nnodes: usize) -> Result<(), StepError> {
        let required = Self::required_reals(nnodes);
        if self.reals.len() < required {
            return Err(StepError::ScratchTooSmall {
                required,
                supplied: self.reals.len(),
            });
        }
        Ok(())
    }

    /// Real capacity.
    pub fn real_capacity(&self) -> usize {
        self.reals.len()
    }

    /// Integer capacity.
    pub fn int_capacity(&self) -> usize {
        self.ints.len()
    }

    /// Carve poisoned limiter-bound views over `nnodes` nodes.
    ///
    /// Returns `None` if capacity is insufficient.
    pub fn limiter_bounds(&mut self, nnodes: usize) -> Option<LimiterBounds<'_>> {
        let (umin, umax) = carve(&mut self.reals, nnodes)?;
        Some(LimiterBounds { umin, umax })
    }

    /// Carve poisoned smoothing views over `nnodes` nodes and lend the
    /// integer buffer alongside them.
    ///
    /// Returns `None` if real capacity is insufficient.
    pub fn smoothing_work(&mut self, nnodes: usize) -> Option<SmoothingWork<'_>> {
        let Self { reals, ints } = self;
        let (work_a, work_b) = carve(reals, nnodes)?;
        Some(SmoothingWork {
            work_a,
            work_b,
            ints: ints.as_mut_slice(),
        })
    }
}

fn carve(reals: &mut [f64], nnodes: usize) -> Option<(NodeView<'_>, NodeView<'_>)> {
    let len = NCONS.checked_mul(nnodes)?;
    let needed = len.checked_mul(2)?;
    if reals.len() < needed {
        return None;
    }
    let window = &mut reals[..needed];
    window.fill(f64::NAN);
    let (a, b) = window.split_at_mut(len);
    Some((NodeView::new(a), NodeView::new(b)))
}
