//! Calls relayed through the avatar
//!
//! The avatar executes these on behalf of the organization. The controller
//! only authorizes them and runs the constraint pipeline around them.

use super::Controller;
use crate::collaborators::{Avatar, ReputationLedger, TokenLedger};
use covenant_core::{Address, CovenantResult, Invocation, Permission};
use tracing::debug;

impl<A, T, R> Controller<A, T, R>
where
    A: Avatar,
    T: TokenLedger,
    R: ReputationLedger,
{
    /// Execute `payload` against `target` as the organization
    ///
    /// The target's result bytes are returned unmodified.
    pub fn generic_call(
        &mut self,
        sender: Address,
        target: Address,
        payload: Vec<u8>,
        org: &Address,
    ) -> CovenantResult<Vec<u8>> {
        debug!(%sender, %target, payload_len = payload.len(), "generic_call");
        self.transact("generic_call", |this| {
            this.authorize(&sender, Permission::GenericCall, org)?;
            let invocation = Invocation::GenericCall {
                target,
                payload: payload.clone(),
            };
            this.guarded(sender, &invocation, |this| {
                let caller = this.address;
                this.avatar.generic_call(caller, target, &payload)
            })
        })
    }

    /// Send `amount` of the native currency from the avatar to `to`
    pub fn send_ether(
        &mut self,
        sender: Address,
        amount: u128,
        to: Address,
        org: &Address,
    ) -> CovenantResult<bool> {
        self.relay(sender, org, Invocation::SendEther { amount, to }, |avatar, caller| {
            avatar.send_ether(caller, amount, to)
        })
    }

    /// Transfer an external token held by the avatar
    pub fn external_token_transfer(
        &mut self,
        sender: Address,
        token: Address,
        to: Address,
        amount: u128,
        org: &Address,
    ) -> CovenantResult<bool> {
        let invocation = Invocation::ExternalTokenTransfer { token, to, amount };
        self.relay(sender, org, invocation, |avatar, caller| {
            avatar.external_token_transfer(caller, token, to, amount)
        })
    }

    /// Transfer an external token from `from`, spending the avatar's allowance
    pub fn external_token_transfer_from(
        &mut self,
        sender: Address,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
        org: &Address,
    ) -> CovenantResult<bool> {
        let invocation = Invocation::ExternalTokenTransferFrom {
            token,
            from,
            to,
            amount,
        };
        self.relay(sender, org, invocation, |avatar, caller| {
            avatar.external_token_transfer_from(caller, token, from, to, amount)
        })
    }

    /// Raise the allowance of `spender` over the avatar's `token`
    pub fn external_token_increase_approval(
        &mut self,
        sender: Address,
        token: Address,
        spender: Address,
        amount: u128,
        org: &Address,
    ) -> CovenantResult<bool> {
        let invocation = Invocation::ExternalTokenIncreaseApproval {
            token,
            spender,
            amount,
        };
        self.relay(sender, org, invocation, |avatar, caller| {
            avatar.external_token_increase_approval(caller, token, spender, amount)
        })
    }

    /// Lower the allowance of `spender` over the avatar's `token`
    pub fn external_token_decrease_approval(
        &mut self,
        sender: Address,
        token: Address,
        spender: Address,
        amount: u128,
        org: &Address,
    ) -> CovenantResult<bool> {
        let invocation = Invocation::ExternalTokenDecreaseApproval {
            token,
            spender,
            amount,
        };
        self.relay(sender, org, invocation, |avatar, caller| {
            avatar.external_token_decrease_approval(caller, token, spender, amount)
        })
    }

    /// Registered-only relay under the invocation's own tag
    fn relay(
        &mut self,
        sender: Address,
        org: &Address,
        invocation: Invocation,
        call: impl FnOnce(&mut A, Address) -> CovenantResult<bool>,
    ) -> CovenantResult<bool> {
        let operation = invocation.tag();
        debug!(%sender, operation, amount = ?invocation.amount(), "relay");
        self.transact(operation, |this| {
            this.authorize(&sender, Permission::Registered, org)?;
            this.guarded(sender, &invocation, |this| {
                let caller = this.address;
                call(&mut this.avatar, caller)
            })
        })
    }
}
