//! # Covenant Core - Layer 1: Foundation
//!
//! Vocabulary shared by every Covenant crate. Contains no controller logic.
//!
//! - `identifiers`: `Address` and `Hash32`
//! - `permissions`: the five-capability scheme permission model and its
//!   delegation rule
//! - `phase`: constraint phases
//! - `invocation`: guarded operations and their literal tags
//! - `events`: controller notifications
//! - `errors`: unified `CovenantError`
//! - `config`: controller configuration

#![allow(missing_docs)]
#![forbid(unsafe_code)]

/// Unified error handling
pub mod errors;

/// Address and hash identifiers
pub mod identifiers;

/// Scheme permission model
pub mod permissions;

/// Constraint phases
pub mod phase;

/// Guarded operations
pub mod invocation;

/// Controller notifications
pub mod events;

/// Controller configuration
pub mod config;

pub use config::ControllerConfig;
pub use errors::{CovenantError, CovenantResult};
pub use events::ControllerEvent;
pub use identifiers::{Address, Hash32};
pub use invocation::{Invocation, Method};
pub use permissions::{
    check_removal, derive_permission_delta, has_bit, Permission, PermissionDelta,
    SchemePermissions,
};
pub use phase::{CallPhase, Phase};
