//! # Covenant Controller - Layer 3: Orchestration
//!
//! The controller of one organization. It decides which principals (schemes)
//! may mint reputation and tokens, register other schemes, manage global
//! constraints, upgrade the controller, and relay calls through the avatar.
//!
//! - `collaborators`: traits for the avatar and the two ledgers it drives
//! - `schemes`: principal → permission/config registry
//! - `transaction`: checkpointed all-or-nothing call execution and the event log
//! - `controller`: the `Controller` and all of its entry points
//!
//! Every mutating entry point is atomic: if any check, constraint, or
//! collaborator fails, nothing the call did remains visible.

#![forbid(unsafe_code)]

pub mod collaborators;
pub mod controller;
pub mod schemes;
pub mod transaction;

pub use collaborators::{Avatar, Owned, ReputationLedger, TokenLedger};
pub use controller::Controller;
pub use schemes::{Scheme, SchemeRegistry};
pub use transaction::{ControllerState, EventLog};

pub use covenant_constraints::{ConstraintDirectory, GlobalConstraint};
pub use covenant_core::{
    Address, ControllerConfig, ControllerEvent, CovenantError, CovenantResult, Hash32, Permission,
    SchemePermissions,
};
