//! The organization controller
//!
//! Every privileged entry point follows the same shape:
//!
//! 1. open a transaction ([`Controller::transact`])
//! 2. require the caller's permission bit
//! 3. require the organization identity to match the bound avatar
//! 4. for operations subject to constraint, run the body inside the
//!    pre/post constraint pipeline
//! 5. mutate state, buffer the notification event
//!
//! Entry points are grouped by concern in the submodules.

mod constraints;
mod ledger;
mod relay;
mod schemes;
mod upgrade;

use crate::collaborators::{Avatar, Owned, ReputationLedger, TokenLedger};
use crate::transaction::{Checkpoint, ControllerState, EventLog};
use covenant_constraints::{
    with_constraints, ConstraintDirectory, ConstraintHost, ConstraintRegistry, GlobalConstraint,
};
use covenant_core::{
    Address, ControllerConfig, ControllerEvent, CovenantError, CovenantResult, Hash32, Invocation,
    Permission, SchemePermissions,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Permissioned controller of one organization
#[derive(Debug)]
pub struct Controller<A, T, R> {
    address: Address,
    avatar: A,
    token: T,
    reputation: R,
    state: ControllerState,
    directory: ConstraintDirectory,
    events: EventLog,
}

impl<A, T, R> Controller<A, T, R>
where
    A: Avatar,
    T: TokenLedger,
    R: ReputationLedger,
{
    /// Bind a controller to an avatar and its two ledgers
    ///
    /// The ledgers must be the ones the avatar names as native. The configured
    /// deployer starts registered with every permission.
    pub fn new(config: ControllerConfig, avatar: A, token: T, reputation: R) -> CovenantResult<Self> {
        config.validate()?;
        if avatar.native_token() != token.address() {
            return Err(CovenantError::invalid(format!(
                "avatar native token {} does not match token ledger {}",
                avatar.native_token(),
                token.address()
            )));
        }
        if avatar.native_reputation() != reputation.address() {
            return Err(CovenantError::invalid(format!(
                "avatar native reputation {} does not match reputation ledger {}",
                avatar.native_reputation(),
                reputation.address()
            )));
        }

        let mut state = ControllerState {
            constraints: ConstraintRegistry::with_capacity_limit(config.max_constraints_per_phase),
            ..ControllerState::default()
        };
        state
            .schemes
            .register(config.deployer, Hash32::ZERO, SchemePermissions::all());

        info!(
            controller = %config.address,
            organization = %avatar.address(),
            deployer = %config.deployer,
            "controller created"
        );

        Ok(Self {
            address: config.address,
            avatar,
            token,
            reputation,
            state,
            directory: ConstraintDirectory::new(),
            events: EventLog::new(),
        })
    }

    /// Use `directory` to resolve constraint addresses
    pub fn with_directory(mut self, directory: ConstraintDirectory) -> Self {
        self.directory = directory;
        self
    }

    /// Make a constraint module reachable at `address`
    ///
    /// Deploying is not registering: the module has no effect until a
    /// constraint-managing scheme adds it.
    pub fn deploy_constraint(&mut self, address: Address, module: Arc<dyn GlobalConstraint>) {
        self.directory.deploy(address, module);
    }

    /// This controller's own address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Identity of the bound organization (the avatar's address)
    pub fn organization(&self) -> Address {
        self.avatar.address()
    }

    /// The bound avatar
    pub fn avatar(&self) -> &A {
        &self.avatar
    }

    /// The bound token ledger
    pub fn token(&self) -> &T {
        &self.token
    }

    /// The bound reputation ledger
    pub fn reputation(&self) -> &R {
        &self.reputation
    }

    /// Successor controller, or `Address::ZERO` if not upgraded
    pub fn new_controller(&self) -> Address {
        self.state.new_controller
    }

    /// Whether this controller has been upgraded
    pub fn is_upgraded(&self) -> bool {
        !self.state.new_controller.is_zero()
    }

    /// Current state (schemes, constraints, upgrade marker)
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Committed events, oldest first
    pub fn events(&self) -> &[ControllerEvent] {
        self.events.committed()
    }

    /// Take every committed event
    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        self.events.drain()
    }

    /// Release the avatar and ledgers, e.g. to bind them to a successor
    pub fn into_collaborators(self) -> (A, T, R) {
        (self.avatar, self.token, self.reputation)
    }

    // ----- read-only queries -------------------------------------------------

    /// Whether `scheme` is registered
    pub fn is_scheme_registered(&self, scheme: &Address, org: &Address) -> CovenantResult<bool> {
        self.require_organization(org)?;
        Ok(self.state.schemes.is_registered(scheme))
    }

    /// Configuration hash of `scheme`; zero when unregistered
    pub fn get_scheme_parameters(&self, scheme: &Address, org: &Address) -> CovenantResult<Hash32> {
        self.require_organization(org)?;
        Ok(self.state.schemes.config_hash_of(scheme))
    }

    /// Permissions of `scheme`; empty when unregistered
    pub fn get_scheme_permissions(
        &self,
        scheme: &Address,
        org: &Address,
    ) -> CovenantResult<SchemePermissions> {
        self.require_organization(org)?;
        Ok(self.state.schemes.permissions_of(scheme))
    }

    /// `(pre, post)` constraint counts
    pub fn global_constraints_count(&self, org: &Address) -> CovenantResult<(usize, usize)> {
        self.require_organization(org)?;
        Ok(self.state.constraints.counts())
    }

    /// Whether `constraint` is registered in either phase
    pub fn is_global_constraint_registered(
        &self,
        constraint: &Address,
        org: &Address,
    ) -> CovenantResult<bool> {
        self.require_organization(org)?;
        Ok(self.state.constraints.is_registered(constraint))
    }

    /// Stored params of `constraint`, pre phase first; zero on a miss
    pub fn get_global_constraint_parameters(
        &self,
        constraint: &Address,
        org: &Address,
    ) -> CovenantResult<Hash32> {
        self.require_organization(org)?;
        Ok(self.state.constraints.params_of(constraint))
    }

    /// Address of the native reputation ledger
    pub fn get_native_reputation(&self, org: &Address) -> CovenantResult<Address> {
        self.require_organization(org)?;
        Ok(self.reputation.address())
    }

    // ----- guards --------------------------------------------------------------

    fn require_permission(&self, sender: &Address, permission: Permission) -> CovenantResult<()> {
        if self.state.schemes.grants(sender, permission) {
            return Ok(());
        }
        debug!(%sender, %permission, "permission check failed");
        Err(CovenantError::unauthorized(format!(
            "{sender} lacks the {permission} permission"
        )))
    }

    fn require_organization(&self, org: &Address) -> CovenantResult<()> {
        let bound = self.avatar.address();
        if *org == bound {
            return Ok(());
        }
        Err(CovenantError::unauthorized(format!(
            "organization {org} does not match bound organization {bound}"
        )))
    }

    /// Permission and organization checks shared by every privileged call
    fn authorize(&self, sender: &Address, permission: Permission, org: &Address) -> CovenantResult<()> {
        self.require_permission(sender, permission)?;
        self.require_organization(org)
    }

    // ----- execution -----------------------------------------------------------

    /// Run `call` with all-or-nothing semantics
    fn transact<O>(
        &mut self,
        operation: &'static str,
        call: impl FnOnce(&mut Self) -> CovenantResult<O>,
    ) -> CovenantResult<O> {
        let checkpoint =
            Checkpoint::capture(&self.state, &self.avatar, &self.token, &self.reputation);
        match call(self) {
            Ok(output) => {
                let published = self.events.commit();
                debug!(operation, published, "call committed");
                Ok(output)
            }
            Err(err) => {
                let Checkpoint {
                    state,
                    avatar,
                    token,
                    reputation,
                } = checkpoint;
                self.state = state;
                self.avatar = avatar;
                self.token = token;
                self.reputation = reputation;
                let dropped = self.events.discard();
                warn!(operation, kind = err.kind(), error = %err, dropped, "call aborted, state restored");
                Err(err)
            }
        }
    }

    /// Run `body` inside the constraint pipeline for `invocation`
    fn guarded<O>(
        &mut self,
        sender: Address,
        invocation: &Invocation,
        body: impl FnOnce(&mut Self) -> CovenantResult<O>,
    ) -> CovenantResult<O> {
        with_constraints(self, sender, invocation, body)
    }

    fn emit(&mut self, event: ControllerEvent) {
        self.events.emit(event);
    }
}

impl<A, T, R> ConstraintHost for Controller<A, T, R> {
    fn constraint_registry(&self) -> &ConstraintRegistry {
        &self.state.constraints
    }

    fn constraint_directory(&self) -> &ConstraintDirectory {
        &self.directory
    }
}
