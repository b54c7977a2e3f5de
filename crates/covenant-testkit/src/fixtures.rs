//! Organization fixtures
//!
//! `OrganizationBuilder` wires a controller over in-memory collaborators, all
//! owned by the controller, with the deployer registered with every
//! permission. Addresses are derived from a seed so separate fixtures never
//! collide.

use crate::collaborators::{CallHandler, InMemoryAvatar, InMemoryReputation, InMemoryToken};
use covenant_constraints::GlobalConstraint;
use covenant_controller::Controller;
use covenant_core::{Address, ControllerConfig, Hash32, SchemePermissions};
use std::sync::Arc;

/// Controller type used throughout the tests
pub type TestController = Controller<InMemoryAvatar, InMemoryToken, InMemoryReputation>;

/// Deterministic address for `label` within fixture `seed`
pub fn fixture_address(seed: u64, label: &str) -> Address {
    Address::derive(format!("covenant-testkit/{seed}/{label}").as_bytes())
}

/// Builder for [`Organization`]
#[derive(Default)]
pub struct OrganizationBuilder {
    seed: u64,
    capacity: Option<usize>,
    ether: u128,
    targets: Vec<(Address, CallHandler)>,
    external: Vec<(Address, Address, u128)>,
    allowances: Vec<(Address, Address, u128)>,
    stuck_avatar: bool,
    stuck_token: bool,
    stuck_reputation: bool,
    foreign_token_owner: Option<Address>,
}

impl OrganizationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Bound each constraint collection to `capacity` entries
    pub fn constraint_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Native currency held by the avatar
    pub fn ether(mut self, amount: u128) -> Self {
        self.ether = amount;
        self
    }

    /// Route generic calls to `target` through `handler`
    pub fn call_target<F>(mut self, target: Address, handler: F) -> Self
    where
        F: Fn(&[u8]) -> covenant_core::CovenantResult<Vec<u8>> + Send + Sync + 'static,
    {
        let handler: CallHandler = Arc::new(handler);
        self.targets.push((target, handler));
        self
    }

    /// External `token` balance held by the avatar
    pub fn external_balance(mut self, token: Address, amount: u128) -> Self {
        self.external.push((token, Address::ZERO, amount));
        self
    }

    /// External `token` balance of `holder`, all of it approved for the avatar
    pub fn external_allowance(mut self, token: Address, holder: Address, amount: u128) -> Self {
        self.external.push((token, holder, amount));
        self.allowances.push((token, holder, amount));
        self
    }

    /// Avatar accepts ownership transfers without applying them
    pub fn stuck_avatar(mut self) -> Self {
        self.stuck_avatar = true;
        self
    }

    /// Token ledger accepts ownership transfers without applying them
    pub fn stuck_token(mut self) -> Self {
        self.stuck_token = true;
        self
    }

    /// Reputation ledger accepts ownership transfers without applying them
    pub fn stuck_reputation(mut self) -> Self {
        self.stuck_reputation = true;
        self
    }

    /// The token ledger belongs to `owner` rather than the controller
    pub fn token_owned_by(mut self, owner: Address) -> Self {
        self.foreign_token_owner = Some(owner);
        self
    }

    pub fn build(self) -> Organization {
        let seed = self.seed;
        let controller_address = fixture_address(seed, "controller");
        let deployer = fixture_address(seed, "deployer");
        let avatar_address = fixture_address(seed, "avatar");
        let token_address = fixture_address(seed, "token");
        let reputation_address = fixture_address(seed, "reputation");

        let token_owner = self.foreign_token_owner.unwrap_or(controller_address);
        let mut token = InMemoryToken::new(token_address, token_owner);
        if self.stuck_token {
            token = token.ignoring_ownership_transfers();
        }
        let mut reputation = InMemoryReputation::new(reputation_address, controller_address);
        if self.stuck_reputation {
            reputation = reputation.ignoring_ownership_transfers();
        }

        let mut avatar = InMemoryAvatar::new(
            avatar_address,
            controller_address,
            token_address,
            reputation_address,
        )
        .with_ether(self.ether);
        for (target, handler) in self.targets {
            avatar = avatar.with_target(target, handler);
        }
        for (token, holder, amount) in self.external {
            let holder = if holder.is_zero() { avatar_address } else { holder };
            avatar = avatar.with_external_balance(token, holder, amount);
        }
        for (token, holder, amount) in self.allowances {
            avatar = avatar.with_allowance(token, holder, avatar_address, amount);
        }
        if self.stuck_avatar {
            avatar = avatar.ignoring_ownership_transfers();
        }

        let mut config = ControllerConfig::new(controller_address, deployer);
        if let Some(capacity) = self.capacity {
            config = config.with_constraint_capacity(capacity);
        }
        let controller = Controller::new(config, avatar, token, reputation)
            .expect("fixture controller is well formed");
        tracing::debug!(seed, org = %avatar_address, "organization fixture built");

        Organization {
            controller,
            deployer,
            org: avatar_address,
            seed,
            deployed: 0,
        }
    }
}

/// A controller together with the identities tests need
#[derive(Debug)]
pub struct Organization {
    pub controller: TestController,
    /// Principal registered with every permission at construction
    pub deployer: Address,
    /// Organization identity (the avatar's address)
    pub org: Address,
    seed: u64,
    deployed: u64,
}

impl Organization {
    /// Deterministic address for `label` within this fixture
    pub fn address(&self, label: &str) -> Address {
        fixture_address(self.seed, label)
    }

    /// Register `scheme` with `permissions`, acting as the deployer
    pub fn register(&mut self, scheme: Address, permissions: SchemePermissions) {
        let deployer = self.deployer;
        let org = self.org;
        self.controller
            .register_scheme(deployer, scheme, Hash32::ZERO, permissions, &org)
            .expect("deployer may register any scheme");
    }

    /// Deploy `module` at a fresh address and return the address
    pub fn deploy<C: GlobalConstraint + 'static>(&mut self, module: C) -> Address {
        self.deployed += 1;
        let address = self.address(&format!("constraint-{}", self.deployed));
        self.controller.deploy_constraint(address, Arc::new(module));
        address
    }

    /// Deploy `module` and register it as the deployer
    pub fn install<C: GlobalConstraint + 'static>(&mut self, module: C, params: Hash32) -> Address {
        let address = self.deploy(module);
        let deployer = self.deployer;
        let org = self.org;
        self.controller
            .add_global_constraint(deployer, address, params, &org)
            .expect("deployer may add constraints");
        address
    }
}
