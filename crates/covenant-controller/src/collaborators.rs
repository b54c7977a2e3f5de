//! External collaborators
//!
//! The controller never holds balances or executes calls itself. It drives an
//! avatar (the organization's asset container) and two ledgers through these
//! traits, always passing its own address as `caller` so implementations can
//! enforce ownership.
//!
//! Collaborators are `Clone` because a controller call checkpoints them and
//! restores the copy if the call fails.

use covenant_core::{Address, CovenantResult};
use std::fmt;

/// Contract with a single owner allowed to drive it
pub trait Owned {
    /// Address of this collaborator
    fn address(&self) -> Address;

    /// Current owner
    fn owner(&self) -> Address;

    /// Hand ownership to `new_owner`; only the current owner may do this
    fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> CovenantResult<()>;
}

/// Organization reputation ledger
pub trait ReputationLedger: Owned + Clone + fmt::Debug {
    /// Credit `amount` reputation to `to`
    fn mint(&mut self, caller: Address, to: Address, amount: u128) -> CovenantResult<bool>;

    /// Debit `amount` reputation from `from`
    fn burn(&mut self, caller: Address, from: Address, amount: u128) -> CovenantResult<bool>;

    /// Reputation held by `holder`
    fn balance_of(&self, holder: &Address) -> u128;

    /// Reputation in existence
    fn total_supply(&self) -> u128;
}

/// Organization native token ledger
pub trait TokenLedger: Owned + Clone + fmt::Debug {
    /// Credit `amount` tokens to `beneficiary`
    fn mint(&mut self, caller: Address, beneficiary: Address, amount: u128)
        -> CovenantResult<bool>;

    /// Tokens held by `holder`
    fn balance_of(&self, holder: &Address) -> u128;

    /// Tokens in existence
    fn total_supply(&self) -> u128;
}

/// Organization asset container
///
/// Calls relayed through the avatar are attributed to the organization, not
/// to the controller.
pub trait Avatar: Owned + Clone + fmt::Debug {
    /// Address of the organization's token ledger
    fn native_token(&self) -> Address;

    /// Address of the organization's reputation ledger
    fn native_reputation(&self) -> Address;

    /// Execute `payload` against `target`, returning its raw result bytes
    fn generic_call(
        &mut self,
        caller: Address,
        target: Address,
        payload: &[u8],
    ) -> CovenantResult<Vec<u8>>;

    /// Send `amount` of the native currency (smallest unit) to `to`
    fn send_ether(&mut self, caller: Address, amount: u128, to: Address) -> CovenantResult<bool>;

    /// Transfer an external token held by the avatar
    fn external_token_transfer(
        &mut self,
        caller: Address,
        token: Address,
        to: Address,
        amount: u128,
    ) -> CovenantResult<bool>;

    /// Transfer an external token from an account that approved the avatar
    fn external_token_transfer_from(
        &mut self,
        caller: Address,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> CovenantResult<bool>;

    /// Raise the allowance of `spender` over the avatar's external tokens
    fn external_token_increase_approval(
        &mut self,
        caller: Address,
        token: Address,
        spender: Address,
        amount: u128,
    ) -> CovenantResult<bool>;

    /// Lower the allowance of `spender` over the avatar's external tokens
    fn external_token_decrease_approval(
        &mut self,
        caller: Address,
        token: Address,
        spender: Address,
        amount: u128,
    ) -> CovenantResult<bool>;
}
