//! Window list reconciliation.
//!
//! Keeps the operator's window arrangement stable while the set of windows
//! changes underneath it.

pub mod order;
pub mod types;

pub use order::{DisplayOrder, reconcile};
pub use types::{DisplayEntry, MergeOutcome, MoveDirection};
