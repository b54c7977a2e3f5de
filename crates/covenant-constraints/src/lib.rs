//! # Covenant Constraints - Layer 2: Specification
//!
//! Global constraints let external policy modules veto organizational actions
//! without the controller knowing their logic.
//!
//! - `constraint`: the `GlobalConstraint` trait, verdicts, and the directory
//!   resolving constraint addresses to deployed modules
//! - `registry`: pre/post collections with O(1) swap-and-truncate removal
//! - `pipeline`: the pre → body → post interceptor chain
//!
//! This crate holds no organization state and performs no rollback; the
//! controller runs the pipeline inside its own transaction.

#![forbid(unsafe_code)]

pub mod constraint;
pub mod pipeline;
pub mod registry;

pub use constraint::{ConstraintCall, ConstraintDirectory, ConstraintVerdict, GlobalConstraint};
pub use pipeline::{check_entries, with_constraints, ConstraintHost};
pub use registry::{
    Addition, ConstraintEntry, ConstraintRegistry, PhaseCollection, Removal, Upsert,
};

// Phase vocabulary lives in core; re-exported for constraint authors.
pub use covenant_core::{CallPhase, Phase};
