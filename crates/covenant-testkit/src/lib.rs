//! Covenant Testing Infrastructure
//!
//! Fixtures, in-memory collaborators, sample constraints and proptest
//! strategies shared by the integration tests of every Covenant crate.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]
//!
//! # Usage
//!
//! ```rust,no_run
//! use covenant_testkit::*;
//!
//! let mut fixture = OrganizationBuilder::new().seed(7).build();
//! let scheme = fixture.address("scheme");
//! fixture.register(scheme, SchemePermissions::all());
//! ```

pub mod collaborators;
pub mod constraints;
pub mod fixtures;
pub mod strategies;

pub use collaborators::*;
pub use constraints::*;
pub use fixtures::*;

pub use covenant_core::{
    Address, CallPhase, ControllerEvent, CovenantError, Hash32, Method, Permission,
    SchemePermissions,
};

/// Install a test subscriber honouring `RUST_LOG`; later calls are no-ops
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(false)
        .try_init();
}
