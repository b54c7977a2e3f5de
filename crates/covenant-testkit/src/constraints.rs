//! Sample global constraints

use covenant_constraints::{ConstraintCall, ConstraintVerdict, GlobalConstraint};
use covenant_core::{Address, CallPhase, Hash32, Method, Phase};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Rejects `method` invocations whose amount exceeds `cap`
#[derive(Debug, Clone)]
pub struct AmountCapConstraint {
    method: Method,
    cap: u128,
    when: CallPhase,
}

impl AmountCapConstraint {
    /// Pre-phase cap on `method`
    pub fn new(method: Method, cap: u128) -> Self {
        Self {
            method,
            cap,
            when: CallPhase::Pre,
        }
    }

    pub fn with_phase(mut self, when: CallPhase) -> Self {
        self.when = when;
        self
    }

    fn check(&self, call: &ConstraintCall<'_>) -> ConstraintVerdict {
        if call.method() != self.method {
            return ConstraintVerdict::allow();
        }
        match call.invocation.amount() {
            Some(amount) if amount > self.cap => ConstraintVerdict::reject(format!(
                "{} amount {amount} exceeds cap {}",
                self.method, self.cap
            )),
            _ => ConstraintVerdict::allow(),
        }
    }
}

impl GlobalConstraint for AmountCapConstraint {
    fn when(&self) -> CallPhase {
        self.when
    }

    fn pre(&self, call: &ConstraintCall<'_>) -> ConstraintVerdict {
        self.check(call)
    }

    fn post(&self, call: &ConstraintCall<'_>) -> ConstraintVerdict {
        self.check(call)
    }
}

/// Rejects in the phases it declares, optionally only for one method
#[derive(Debug, Clone)]
pub struct RejectingConstraint {
    when: CallPhase,
    method: Option<Method>,
}

impl RejectingConstraint {
    pub fn new(when: CallPhase) -> Self {
        Self { when, method: None }
    }

    /// Only reject invocations of `method`
    pub fn only(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    fn verdict(&self, phase: Phase, call: &ConstraintCall<'_>) -> ConstraintVerdict {
        match self.method {
            Some(method) if method != call.method() => ConstraintVerdict::allow(),
            _ => ConstraintVerdict::reject(format!("{} rejected in {phase}", call.tag())),
        }
    }
}

impl GlobalConstraint for RejectingConstraint {
    fn when(&self) -> CallPhase {
        self.when
    }

    fn pre(&self, call: &ConstraintCall<'_>) -> ConstraintVerdict {
        self.verdict(Phase::Pre, call)
    }

    fn post(&self, call: &ConstraintCall<'_>) -> ConstraintVerdict {
        self.verdict(Phase::Post, call)
    }
}

/// One check seen by a [`RecordingConstraint`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub phase: Phase,
    pub sender: Address,
    pub tag: &'static str,
    pub params: Hash32,
}

/// Allows everything and records each check it receives
///
/// Clones share the same log and declared phase, so a test can keep a handle
/// after deploying the module.
#[derive(Debug, Clone)]
pub struct RecordingConstraint {
    when: Arc<RwLock<CallPhase>>,
    log: Arc<Mutex<Vec<Observation>>>,
}

impl RecordingConstraint {
    pub fn new(when: CallPhase) -> Self {
        Self {
            when: Arc::new(RwLock::new(when)),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Change the phase the module declares from now on
    pub fn set_when(&self, when: CallPhase) {
        *self.when.write() = when;
    }

    /// Checks recorded so far, oldest first
    pub fn observations(&self) -> Vec<Observation> {
        self.log.lock().clone()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }

    fn record(&self, phase: Phase, call: &ConstraintCall<'_>) -> ConstraintVerdict {
        self.log.lock().push(Observation {
            phase,
            sender: call.sender,
            tag: call.tag(),
            params: call.params,
        });
        ConstraintVerdict::allow()
    }
}

impl GlobalConstraint for RecordingConstraint {
    fn when(&self) -> CallPhase {
        *self.when.read()
    }

    fn pre(&self, call: &ConstraintCall<'_>) -> ConstraintVerdict {
        self.record(Phase::Pre, call)
    }

    fn post(&self, call: &ConstraintCall<'_>) -> ConstraintVerdict {
        self.record(Phase::Post, call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_core::Invocation;

    fn call(invocation: &Invocation) -> ConstraintCall<'_> {
        ConstraintCall {
            sender: Address::from_low_u64(1),
            params: Hash32::ZERO,
            invocation,
        }
    }

    #[test]
    fn cap_only_applies_to_its_method() {
        let cap = AmountCapConstraint::new(Method::MintReputation, 1000);
        let to = Address::from_low_u64(2);
        let over = Invocation::MintReputation { amount: 1500, to };
        let under = Invocation::MintReputation { amount: 1000, to };
        let tokens = Invocation::MintTokens {
            amount: 5000,
            beneficiary: to,
        };
        assert!(!cap.pre(&call(&over)).is_allowed());
        assert!(cap.pre(&call(&under)).is_allowed());
        assert!(cap.pre(&call(&tokens)).is_allowed());
    }

    #[test]
    fn recording_shares_log_between_clones() {
        let recorder = RecordingConstraint::new(CallPhase::PreAndPost);
        let handle = recorder.clone();
        let invocation = Invocation::UnregisterScheme {
            scheme: Address::from_low_u64(3),
        };
        recorder.pre(&call(&invocation));
        recorder.post(&call(&invocation));
        let seen = handle.observations();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].phase, Phase::Pre);
        assert_eq!(seen[1].tag, "unregisterScheme");

        handle.set_when(CallPhase::Post);
        assert_eq!(recorder.when(), CallPhase::Post);
    }
}
