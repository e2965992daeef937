//! Low-speed preconditioning transform of the residual.
//!
//! For each active node the collaborator supplies the pseudo-compressibility
//! parameter and two local Jacobians. The residual is replaced by
//! `M * rhs` with `M = cons_to_prim * inv(prim_to_cons_preconditioned)`.

use eddy_core::{ConsField, KernelError, NCONS};
use eddy_kernel::{FlowView, Jacobians, PreconditionerJacobians};
use nalgebra::{Matrix4, Vector4};

use crate::state::ensure_active_nodes;

/// The preconditioning matrix at `node`.
///
/// Fails with [`KernelError::SingularMatrix`] if the preconditioned
/// Jacobian cannot be inverted.
pub fn preconditioning_matrix(node: usize, jac: &Jacobians) -> Result<Matrix4<f64>, KernelError> {
    let inverse = jac
        .prim_to_cons_preconditioned
        .try_inverse()
        .ok_or(KernelError::SingularMatrix { node })?;
    Ok(jac.cons_to_prim * inverse)
}

/// Transform the residual at active nodes `0..nndint` in place.
///
/// Fails with [`KernelError::ExecutionFailed`] if `cv`, `dv`, or `rhs`
/// has fewer than `nndint` nodes.
pub fn precondition_residual(
    pre: &dyn PreconditionerJacobians,
    flow: FlowView<'_>,
    rhs: &mut ConsField,
    nndint: usize,
) -> Result<(), KernelError> {
    ensure_active_nodes("cv", flow.cv.len(), nndint)?;
    ensure_active_nodes("dv", flow.dv.len(), nndint)?;
    ensure_active_nodes("rhs", rhs.len(), nndint)?;
    for node in 0..nndint {
        let cv = flow.cv.node(node);
        let dv = flow.dv.node(node);
        let theta = pre.theta(node, cv, dv);
        let jac = pre.jacobians(node, cv, dv, theta)?;
        let m = preconditioning_matrix(node, &jac)?;

        let r = rhs.node(node);
        let out = m * Vector4::new(r[0], r[1], r[2], r[3]);
        rhs.node_mut(node).copy_from_slice(&out.as_slice()[..NCONS]);
    }
    Ok(())
}
