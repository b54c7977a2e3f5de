//! Reputation and token issuance

use super::Controller;
use crate::collaborators::{Avatar, ReputationLedger, TokenLedger};
use covenant_core::{Address, ControllerEvent, CovenantResult, Invocation, Permission};
use tracing::debug;

impl<A, T, R> Controller<A, T, R>
where
    A: Avatar,
    T: TokenLedger,
    R: ReputationLedger,
{
    /// Mint `amount` reputation to `to`
    pub fn mint_reputation(
        &mut self,
        sender: Address,
        amount: u128,
        to: Address,
        org: &Address,
    ) -> CovenantResult<bool> {
        debug!(%sender, %to, amount, "mint_reputation");
        self.transact("mint_reputation", |this| {
            this.authorize(&sender, Permission::Registered, org)?;
            let invocation = Invocation::MintReputation { amount, to };
            this.guarded(sender, &invocation, |this| {
                let caller = this.address;
                let minted = this.reputation.mint(caller, to, amount)?;
                this.emit(ControllerEvent::MintReputation { sender, to, amount });
                Ok(minted)
            })
        })
    }

    /// Burn `amount` reputation from `from`
    pub fn burn_reputation(
        &mut self,
        sender: Address,
        amount: u128,
        from: Address,
        org: &Address,
    ) -> CovenantResult<bool> {
        debug!(%sender, %from, amount, "burn_reputation");
        self.transact("burn_reputation", |this| {
            this.authorize(&sender, Permission::Registered, org)?;
            let invocation = Invocation::BurnReputation { amount, from };
            this.guarded(sender, &invocation, |this| {
                let caller = this.address;
                let burned = this.reputation.burn(caller, from, amount)?;
                this.emit(ControllerEvent::BurnReputation {
                    sender,
                    from,
                    amount,
                });
                Ok(burned)
            })
        })
    }

    /// Mint `amount` native tokens to `beneficiary`
    pub fn mint_tokens(
        &mut self,
        sender: Address,
        amount: u128,
        beneficiary: Address,
        org: &Address,
    ) -> CovenantResult<bool> {
        debug!(%sender, %beneficiary, amount, "mint_tokens");
        self.transact("mint_tokens", |this| {
            this.authorize(&sender, Permission::Registered, org)?;
            let invocation = Invocation::MintTokens {
                amount,
                beneficiary,
            };
            this.guarded(sender, &invocation, |this| {
                let caller = this.address;
                let minted = this.token.mint(caller, beneficiary, amount)?;
                this.emit(ControllerEvent::MintTokens {
                    sender,
                    beneficiary,
                    amount,
                });
                Ok(minted)
            })
        })
    }
}
