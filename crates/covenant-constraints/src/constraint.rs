//! Global constraint interface
//!
//! A global constraint is an external policy module. The controller knows it
//! only by address; the [`ConstraintDirectory`] resolves that address to the
//! deployed module.

use covenant_core::{Address, CallPhase, Hash32, Invocation, Method};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Decision returned by a constraint check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintVerdict {
    /// Operation may proceed
    Allow,
    /// Operation is vetoed
    Reject {
        /// Human-readable reason, surfaced in the resulting error
        reason: String,
    },
}

impl ConstraintVerdict {
    /// Create an allow verdict
    pub fn allow() -> Self {
        Self::Allow
    }

    /// Create a reject verdict
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject {
            reason: reason.into(),
        }
    }

    /// Allow when `condition` holds, reject with `reason` otherwise
    pub fn allow_if(condition: bool, reason: impl Into<String>) -> Self {
        if condition {
            Self::Allow
        } else {
            Self::reject(reason)
        }
    }

    /// Returns `true` if the verdict allows the operation
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns the rejection reason, if rejected
    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Reject { reason } => Some(reason),
        }
    }
}

impl From<bool> for ConstraintVerdict {
    fn from(allowed: bool) -> Self {
        Self::allow_if(allowed, "constraint returned false")
    }
}

/// Arguments handed to a constraint check
#[derive(Debug, Clone, Copy)]
pub struct ConstraintCall<'a> {
    /// Principal that invoked the guarded operation
    pub sender: Address,
    /// Parameters stored with this constraint's registry entry
    pub params: Hash32,
    /// Guarded operation and its arguments
    pub invocation: &'a Invocation,
}

impl ConstraintCall<'_> {
    /// Operation kind
    pub fn method(&self) -> Method {
        self.invocation.method()
    }

    /// Literal operation tag
    pub fn tag(&self) -> &'static str {
        self.invocation.tag()
    }
}

/// External policy module consulted around privileged operations
///
/// Checks take `&self` and must not change organization state; anything a
/// check needs to remember across calls is its own business.
pub trait GlobalConstraint: Send + Sync + fmt::Debug {
    /// Phase(s) this constraint wants to be consulted in
    fn when(&self) -> CallPhase;

    /// Check run before the operation body
    fn pre(&self, call: &ConstraintCall<'_>) -> ConstraintVerdict;

    /// Check run after the operation body
    fn post(&self, call: &ConstraintCall<'_>) -> ConstraintVerdict;
}

/// Resolves constraint addresses to deployed modules
#[derive(Debug, Clone, Default)]
pub struct ConstraintDirectory {
    modules: HashMap<Address, Arc<dyn GlobalConstraint>>,
}

impl ConstraintDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `module` reachable at `address`, replacing any previous module
    pub fn deploy(&mut self, address: Address, module: Arc<dyn GlobalConstraint>) {
        tracing::debug!(constraint = %address, when = %module.when(), "constraint deployed");
        self.modules.insert(address, module);
    }

    /// Resolve `address`
    pub fn resolve(&self, address: &Address) -> Option<Arc<dyn GlobalConstraint>> {
        self.modules.get(address).cloned()
    }

    /// Whether a module is deployed at `address`
    pub fn contains(&self, address: &Address) -> bool {
        self.modules.contains_key(address)
    }

    /// Number of deployed modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if nothing is deployed
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
