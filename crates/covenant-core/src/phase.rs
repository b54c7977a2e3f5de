//! Constraint phases
//!
//! A global constraint declares when it wants to be consulted (`CallPhase`);
//! the registry keeps one collection per concrete `Phase`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Concrete side of a guarded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Before the operation body runs
    Pre,
    /// After the operation body ran
    Post,
}

impl Phase {
    /// Lowercase name used in logs and errors
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Pre => "pre",
            Phase::Post => "post",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase(s) a constraint declares interest in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPhase {
    /// Consulted before the operation only
    Pre,
    /// Consulted after the operation only
    Post,
    /// Consulted on both sides
    PreAndPost,
}

impl CallPhase {
    /// Whether the pre collection is targeted
    pub fn includes_pre(self) -> bool {
        matches!(self, CallPhase::Pre | CallPhase::PreAndPost)
    }

    /// Whether the post collection is targeted
    pub fn includes_post(self) -> bool {
        matches!(self, CallPhase::Post | CallPhase::PreAndPost)
    }

    /// Whether `phase` is targeted
    pub fn includes(self, phase: Phase) -> bool {
        match phase {
            Phase::Pre => self.includes_pre(),
            Phase::Post => self.includes_post(),
        }
    }

    /// Concrete phases targeted, pre first
    pub fn phases(self) -> impl Iterator<Item = Phase> {
        [Phase::Pre, Phase::Post]
            .into_iter()
            .filter(move |phase| self.includes(*phase))
    }
}

impl fmt::Display for CallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallPhase::Pre => "pre",
            CallPhase::Post => "post",
            CallPhase::PreAndPost => "pre_and_post",
        };
        f.write_str(name)
    }
}
