//! Small-mesh state fixtures.

use eddy_core::{ConsField, ConsVector, DepField};

/// Dependent-variable components per node used by the fixtures.
pub const DEFAULT_NDV: usize = 2;

/// Every node holds `value`; dependent variables start at zero.
pub fn uniform_state(nnodes: usize, value: ConsVector) -> (ConsField, DepField) {
    (
        ConsField::from_nodes(vec![value; nnodes]),
        DepField::zeros(nnodes, DEFAULT_NDV),
    )
}

/// Node `i` holds `[1 + i, 0.1 i, -0.1 i, 2.5 + i]`, so every node differs.
pub fn ramp_state(nnodes: usize) -> (ConsField, DepField) {
    let nodes = (0..nnodes)
        .map(|i| {
            let x = i as f64;
            [1.0 + x, 0.1 * x, -0.1 * x, 2.5 + x]
        })
        .collect();
    (
        ConsField::from_nodes(nodes),
        DepField::zeros(nnodes, DEFAULT_NDV),
    )
}
