//! Data carried through a single deploy run.
//!
//! Everything here is transient: built once per invocation, consumed by the
//! next step of the workflow and dropped when the process exits.

pub mod activation;
pub mod artifact;
pub mod upload;
