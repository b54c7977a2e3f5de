//! Controller notifications
//!
//! Events are produced inside a call and only become visible to observers once
//! the call commits.

use crate::identifiers::{Address, Hash32};
use crate::phase::CallPhase;
use serde::{Deserialize, Serialize};

/// Notification emitted by a committed controller call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ControllerEvent {
    MintReputation {
        sender: Address,
        to: Address,
        amount: u128,
    },
    BurnReputation {
        sender: Address,
        from: Address,
        amount: u128,
    },
    MintTokens {
        sender: Address,
        beneficiary: Address,
        amount: u128,
    },
    RegisterScheme {
        sender: Address,
        scheme: Address,
    },
    UnregisterScheme {
        sender: Address,
        scheme: Address,
    },
    UpgradeController {
        old_controller: Address,
        new_controller: Address,
    },
    AddGlobalConstraint {
        constraint: Address,
        params: Hash32,
        phase: CallPhase,
    },
    RemoveGlobalConstraint {
        constraint: Address,
        /// Slot freed in the pre collection, if it held the constraint
        pre_slot: Option<usize>,
        /// Slot freed in the post collection, if it held the constraint
        post_slot: Option<usize>,
        phase: CallPhase,
    },
}

impl ControllerEvent {
    /// Event name as it appears in serialized form
    pub fn name(&self) -> &'static str {
        match self {
            ControllerEvent::MintReputation { .. } => "mint_reputation",
            ControllerEvent::BurnReputation { .. } => "burn_reputation",
            ControllerEvent::MintTokens { .. } => "mint_tokens",
            ControllerEvent::RegisterScheme { .. } => "register_scheme",
            ControllerEvent::UnregisterScheme { .. } => "unregister_scheme",
            ControllerEvent::UpgradeController { .. } => "upgrade_controller",
            ControllerEvent::AddGlobalConstraint { .. } => "add_global_constraint",
            ControllerEvent::RemoveGlobalConstraint { .. } => "remove_global_constraint",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_tag_matches_name() {
        let event = ControllerEvent::RegisterScheme {
            sender: Address::from_low_u64(1),
            scheme: Address::from_low_u64(2),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
    }
}
