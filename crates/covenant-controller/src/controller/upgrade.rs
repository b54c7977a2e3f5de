//! Controller upgrade
//!
//! Upgrading hands the avatar, and whichever ledgers this controller owns, to
//! a successor. Each transfer is verified by reading the owner back. A failed
//! step aborts the call and the transaction restores every earlier step.

use super::Controller;
use crate::collaborators::{Avatar, Owned, ReputationLedger, TokenLedger};
use covenant_core::{Address, ControllerEvent, CovenantError, CovenantResult, Permission};
use tracing::{debug, info};

impl<A, T, R> Controller<A, T, R>
where
    A: Avatar,
    T: TokenLedger,
    R: ReputationLedger,
{
    /// Transfer control of the organization to `new_controller`
    ///
    /// Succeeds at most once per controller.
    pub fn upgrade_controller(
        &mut self,
        sender: Address,
        new_controller: Address,
        org: &Address,
    ) -> CovenantResult<bool> {
        self.transact("upgrade_controller", |this| {
            this.authorize(&sender, Permission::Upgrade, org)?;
            if this.is_upgraded() {
                return Err(CovenantError::invariant(format!(
                    "controller already upgraded to {}",
                    this.state.new_controller
                )));
            }
            if new_controller.is_zero() {
                return Err(CovenantError::invariant(
                    "successor controller must not be the zero address",
                ));
            }
            this.state.new_controller = new_controller;

            let me = this.address;
            hand_over(&mut this.avatar, "avatar", me, new_controller)?;
            if this.token.owner() == me {
                hand_over(&mut this.token, "token ledger", me, new_controller)?;
            }
            if this.reputation.owner() == me {
                hand_over(&mut this.reputation, "reputation ledger", me, new_controller)?;
            }

            info!(%sender, old = %me, new = %new_controller, "controller upgraded");
            this.emit(ControllerEvent::UpgradeController {
                old_controller: me,
                new_controller,
            });
            Ok(true)
        })
    }
}

fn hand_over<C: Owned>(
    collaborator: &mut C,
    label: &str,
    caller: Address,
    successor: Address,
) -> CovenantResult<()> {
    collaborator.transfer_ownership(caller, successor)?;
    let owner = collaborator.owner();
    if owner != successor {
        return Err(CovenantError::invariant(format!(
            "{label} ownership transfer not applied: owner is {owner}, expected {successor}"
        )));
    }
    debug!(label, %successor, "ownership transferred");
    Ok(())
}
