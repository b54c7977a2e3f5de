//! Guarded operations and their arguments
//!
//! Every operation that runs through the constraint pipeline is described by
//! an [`Invocation`]. Constraints discriminate on [`Method::tag`] and may read
//! the arguments, e.g. to cap minted amounts.

use crate::identifiers::{Address, Hash32};
use crate::permissions::SchemePermissions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation kinds subject to global constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    MintReputation,
    BurnReputation,
    MintTokens,
    RegisterScheme,
    UnregisterScheme,
    GenericCall,
    SendEther,
    ExternalTokenTransfer,
    ExternalTokenTransferFrom,
    ExternalTokenIncreaseApproval,
    ExternalTokenDecreaseApproval,
}

impl Method {
    /// Literal operation tag passed to constraints
    pub fn tag(self) -> &'static str {
        match self {
            Method::MintReputation => "mintReputation",
            Method::BurnReputation => "burnReputation",
            Method::MintTokens => "mintTokens",
            Method::RegisterScheme => "registerScheme",
            Method::UnregisterScheme => "unregisterScheme",
            Method::GenericCall => "genericCall",
            Method::SendEther => "sendEther",
            Method::ExternalTokenTransfer => "externalTokenTransfer",
            Method::ExternalTokenTransferFrom => "externalTokenTransferFrom",
            Method::ExternalTokenIncreaseApproval => "externalTokenIncreaseApproval",
            Method::ExternalTokenDecreaseApproval => "externalTokenDecreaseApproval",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A guarded operation together with its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Invocation {
    MintReputation {
        amount: u128,
        to: Address,
    },
    BurnReputation {
        amount: u128,
        from: Address,
    },
    MintTokens {
        amount: u128,
        beneficiary: Address,
    },
    RegisterScheme {
        scheme: Address,
        config_hash: Hash32,
        permissions: SchemePermissions,
    },
    UnregisterScheme {
        scheme: Address,
    },
    GenericCall {
        target: Address,
        payload: Vec<u8>,
    },
    SendEther {
        amount: u128,
        to: Address,
    },
    ExternalTokenTransfer {
        token: Address,
        to: Address,
        amount: u128,
    },
    ExternalTokenTransferFrom {
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    },
    ExternalTokenIncreaseApproval {
        token: Address,
        spender: Address,
        amount: u128,
    },
    ExternalTokenDecreaseApproval {
        token: Address,
        spender: Address,
        amount: u128,
    },
}

impl Invocation {
    /// The operation kind
    pub fn method(&self) -> Method {
        match self {
            Invocation::MintReputation { .. } => Method::MintReputation,
            Invocation::BurnReputation { .. } => Method::BurnReputation,
            Invocation::MintTokens { .. } => Method::MintTokens,
            Invocation::RegisterScheme { .. } => Method::RegisterScheme,
            Invocation::UnregisterScheme { .. } => Method::UnregisterScheme,
            Invocation::GenericCall { .. } => Method::GenericCall,
            Invocation::SendEther { .. } => Method::SendEther,
            Invocation::ExternalTokenTransfer { .. } => Method::ExternalTokenTransfer,
            Invocation::ExternalTokenTransferFrom { .. } => Method::ExternalTokenTransferFrom,
            Invocation::ExternalTokenIncreaseApproval { .. } => {
                Method::ExternalTokenIncreaseApproval
            }
            Invocation::ExternalTokenDecreaseApproval { .. } => {
                Method::ExternalTokenDecreaseApproval
            }
        }
    }

    /// Literal operation tag
    pub fn tag(&self) -> &'static str {
        self.method().tag()
    }

    /// Amount moved by the operation, if it carries one
    pub fn amount(&self) -> Option<u128> {
        match self {
            Invocation::MintReputation { amount, .. }
            | Invocation::BurnReputation { amount, .. }
            | Invocation::MintTokens { amount, .. }
            | Invocation::SendEther { amount, .. }
            | Invocation::ExternalTokenTransfer { amount, .. }
            | Invocation::ExternalTokenTransferFrom { amount, .. }
            | Invocation::ExternalTokenIncreaseApproval { amount, .. }
            | Invocation::ExternalTokenDecreaseApproval { amount, .. } => Some(*amount),
            Invocation::RegisterScheme { .. }
            | Invocation::UnregisterScheme { .. }
            | Invocation::GenericCall { .. } => None,
        }
    }
}
