//! Scheme registration and removal
//!
//! A caller can only grant, revoke, or remove permissions it holds itself.
//! The target always ends up with the Registered bit set, whatever flags the
//! caller passed.

use super::Controller;
use crate::collaborators::{Avatar, ReputationLedger, TokenLedger};
use covenant_core::{
    check_removal, derive_permission_delta, Address, ControllerEvent, CovenantResult, Hash32,
    Invocation, Permission, SchemePermissions,
};
use tracing::{debug, info};

impl<A, T, R> Controller<A, T, R>
where
    A: Avatar,
    T: TokenLedger,
    R: ReputationLedger,
{
    /// Register `scheme`, or change an existing registration
    pub fn register_scheme(
        &mut self,
        sender: Address,
        scheme: Address,
        config_hash: Hash32,
        permissions: SchemePermissions,
        org: &Address,
    ) -> CovenantResult<bool> {
        debug!(%sender, %scheme, %permissions, "register_scheme");
        self.transact("register_scheme", |this| {
            this.authorize(&sender, Permission::RegisterSchemes, org)?;
            let invocation = Invocation::RegisterScheme {
                scheme,
                config_hash,
                permissions,
            };
            this.guarded(sender, &invocation, |this| {
                let old = this.state.schemes.permissions_of(&scheme);
                let actor = this.state.schemes.permissions_of(&sender);
                derive_permission_delta(old, permissions, actor)?;

                let granted = permissions.with(Permission::Registered);
                this.state.schemes.register(scheme, config_hash, granted);
                info!(%sender, %scheme, permissions = %granted, "scheme registered");
                this.emit(ControllerEvent::RegisterScheme { sender, scheme });
                Ok(true)
            })
        })
    }

    /// Remove `scheme`; `Ok(false)` if it was not registered
    pub fn unregister_scheme(
        &mut self,
        sender: Address,
        scheme: Address,
        org: &Address,
    ) -> CovenantResult<bool> {
        debug!(%sender, %scheme, "unregister_scheme");
        self.transact("unregister_scheme", |this| {
            this.authorize(&sender, Permission::RegisterSchemes, org)?;
            let invocation = Invocation::UnregisterScheme { scheme };
            this.guarded(sender, &invocation, |this| {
                if !this.state.schemes.is_registered(&scheme) {
                    return Ok(false);
                }
                let target = this.state.schemes.permissions_of(&scheme);
                let actor = this.state.schemes.permissions_of(&sender);
                check_removal(target, actor)?;

                this.state.schemes.remove(&scheme);
                info!(%sender, %scheme, "scheme unregistered");
                this.emit(ControllerEvent::UnregisterScheme { sender, scheme });
                Ok(true)
            })
        })
    }

    /// Remove the caller's own registration; `Ok(false)` if it had none
    pub fn unregister_self(&mut self, sender: Address, org: &Address) -> CovenantResult<bool> {
        self.transact("unregister_self", |this| {
            this.require_organization(org)?;
            if !this.state.schemes.is_registered(&sender) {
                return Ok(false);
            }
            this.state.schemes.remove(&sender);
            info!(%sender, "scheme unregistered itself");
            this.emit(ControllerEvent::UnregisterScheme {
                sender,
                scheme: sender,
            });
            Ok(true)
        })
    }
}
