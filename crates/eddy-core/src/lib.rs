//! Core types for the Eddy pseudo-time stepper.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the dense node-indexed field containers, the closed scheme flags,
//! the stage index type, and the error types shared by every other
//! crate in the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod id;
pub mod scheme;

pub use error::{ConfigError, KernelError, StageTableError, StepError};
pub use field::{AuxFields, ConsField, ConsVector, DepField, NCONS};
pub use id::StageIndex;
pub use scheme::{EquationSet, Preconditioning, Reconstruction};
