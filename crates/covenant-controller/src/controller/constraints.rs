//! Global constraint management

use super::Controller;
use crate::collaborators::{Avatar, ReputationLedger, TokenLedger};
use covenant_constraints::{GlobalConstraint, Upsert};
use covenant_core::{
    Address, CallPhase, ControllerEvent, CovenantError, CovenantResult, Hash32, Permission,
};
use std::sync::Arc;
use tracing::{info, warn};

impl<A, T, R> Controller<A, T, R>
where
    A: Avatar,
    T: TokenLedger,
    R: ReputationLedger,
{
    /// Register `constraint` in the collections its declared phase names
    ///
    /// Re-adding a registered constraint only replaces its params.
    pub fn add_global_constraint(
        &mut self,
        sender: Address,
        constraint: Address,
        params: Hash32,
        org: &Address,
    ) -> CovenantResult<bool> {
        self.transact("add_global_constraint", |this| {
            this.authorize(&sender, Permission::ManageConstraints, org)?;
            let phase = this.resolve_constraint(&constraint)?.when();
            let addition = this.state.constraints.add(constraint, params, phase)?;
            info!(
                %sender,
                %constraint,
                %phase,
                pre_slot = ?addition.pre.map(Upsert::slot),
                post_slot = ?addition.post.map(Upsert::slot),
                "global constraint added"
            );
            this.emit(ControllerEvent::AddGlobalConstraint {
                constraint,
                params,
                phase,
            });
            Ok(true)
        })
    }

    /// Remove `constraint` from the collections its declared phase names
    ///
    /// A module no longer deployed declares nothing, so it is removed from
    /// both collections. `Ok(false)` if it was in none of them.
    pub fn remove_global_constraint(
        &mut self,
        sender: Address,
        constraint: Address,
        org: &Address,
    ) -> CovenantResult<bool> {
        self.transact("remove_global_constraint", |this| {
            this.authorize(&sender, Permission::ManageConstraints, org)?;
            let phase = match this.directory.resolve(&constraint) {
                Some(module) => module.when(),
                None => {
                    warn!(%constraint, "removing constraint with no deployed module");
                    CallPhase::PreAndPost
                }
            };
            let removal = this.state.constraints.remove(&constraint, phase);
            if !removal.removed() {
                return Ok(false);
            }
            info!(
                %sender,
                %constraint,
                %phase,
                pre_slot = ?removal.pre_slot,
                post_slot = ?removal.post_slot,
                "global constraint removed"
            );
            this.emit(ControllerEvent::RemoveGlobalConstraint {
                constraint,
                pre_slot: removal.pre_slot,
                post_slot: removal.post_slot,
                phase,
            });
            Ok(true)
        })
    }

    /// Phase currently declared by the module deployed at `constraint`
    pub fn constraint_phase(&self, constraint: &Address) -> CovenantResult<CallPhase> {
        Ok(self.resolve_constraint(constraint)?.when())
    }

    fn resolve_constraint(&self, constraint: &Address) -> CovenantResult<Arc<dyn GlobalConstraint>> {
        self.directory.resolve(constraint).ok_or_else(|| {
            CovenantError::invalid(format!("no constraint module deployed at {constraint}"))
        })
    }
}
