//! Solver-owned field storage.

use eddy_core::{AuxFields, ConsField, DepField, KernelError};

/// Every field the solver owns across steps, sized once at construction.
pub(crate) struct FlowState {
    /// Conservative state, `nnodes` nodes.
    pub(crate) cv: ConsField,
    /// Step-start snapshot of `cv`, written once per step.
    pub(crate) cvold: ConsField,
    /// Dependent variables, `nnodes` nodes.
    pub(crate) dv: DepField,
    /// Residual, `nndint` nodes.
    pub(crate) rhs: ConsField,
    /// Local pseudo-time step, `nnodes` entries.
    pub(crate) tstep: Vec<f64>,
    /// Gradients and limiter values; persist across stages.
    pub(crate) aux: AuxFields,
}

impl FlowState {
    pub(crate) fn new(cv: ConsField, dv: DepField, nndint: usize) -> Self {
        let nnodes = cv.len();
        Self {
            cvold: cv.clone(),
            cv,
            dv,
            rhs: ConsField::zeros(nndint),
            tstep: vec![0.0; nnodes],
            aux: AuxFields::zeros(nnodes),
        }
    }
}

/// Fail unless `field` still has exactly `expected` nodes.
pub(crate) fn ensure_nodes(
    field: &'static str,
    got: usize,
    expected: usize,
) -> Result<(), KernelError> {
    if got != expected {
        return Err(KernelError::failed(format!(
            "{field} resized to {got} nodes, expected {expected}"
        )));
    }
    Ok(())
}

/// Fail unless `field` covers at least the `required` active nodes.
pub(crate) fn ensure_active_nodes(
    field: &'static str,
    got: usize,
    required: usize,
) -> Result<(), KernelError> {
    if got < required {
        return Err(KernelError::failed(format!(
            "{field} has {got} nodes, {required} active nodes required"
        )));
    }
    Ok(())
}
