//! Unified error system for Covenant
//!
//! A single error type shared by every crate in the workspace. Every failure
//! aborts the whole call it occurs in; the variants classify *why* so callers
//! can react without parsing messages.

use crate::identifiers::Address;
use serde::{Deserialize, Serialize};

/// Unified error type for all Covenant operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum CovenantError {
    /// Caller lacks the required permission or targets the wrong organization
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error message describing the missing authority
        message: String,
    },

    /// A registration change would move a permission the caller does not hold
    #[error("Privilege escalation: {message}")]
    PrivilegeEscalation {
        /// Error message describing the offending permission bits
        message: String,
    },

    /// A global constraint vetoed the operation
    #[error("Constraint {constraint} rejected {method} in {phase} phase: {reason}")]
    ConstraintRejected {
        /// Address of the rejecting constraint
        constraint: Address,
        /// Phase the rejection happened in (`pre` or `post`)
        phase: String,
        /// Operation tag the constraint was consulted for
        method: String,
        /// Reason reported by the constraint
        reason: String,
    },

    /// A protocol invariant would be broken
    #[error("Invariant violation: {message}")]
    InvariantViolation {
        /// Error message describing the violated invariant
        message: String,
    },

    /// An external collaborator (avatar, ledger, call target) failed
    #[error("Collaborator error: {message}")]
    Collaborator {
        /// Error message describing the collaborator failure
        message: String,
    },

    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },
}

impl CovenantError {
    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a privilege escalation error
    pub fn privilege_escalation(message: impl Into<String>) -> Self {
        Self::PrivilegeEscalation {
            message: message.into(),
        }
    }

    /// Create a constraint rejection error
    pub fn constraint_rejected(
        constraint: Address,
        phase: impl Into<String>,
        method: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ConstraintRejected {
            constraint,
            phase: phase.into(),
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create a collaborator error
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Short machine-readable name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::PrivilegeEscalation { .. } => "privilege_escalation",
            Self::ConstraintRejected { .. } => "constraint_rejected",
            Self::InvariantViolation { .. } => "invariant_violation",
            Self::Collaborator { .. } => "collaborator",
            Self::Invalid { .. } => "invalid",
        }
    }
}

/// Standard Result type for Covenant operations
pub type CovenantResult<T> = std::result::Result<T, CovenantError>;

impl From<std::io::Error> for CovenantError {
    fn from(err: std::io::Error) -> Self {
        Self::invalid(err.to_string())
    }
}

impl From<toml::de::Error> for CovenantError {
    fn from(err: toml::de::Error) -> Self {
        Self::invalid(format!("invalid TOML: {err}"))
    }
}
