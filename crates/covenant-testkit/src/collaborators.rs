//! In-memory avatar and ledgers
//!
//! Each collaborator enforces single ownership the way a deployed contract
//! would: only the current owner may drive it. `ignoring_ownership_transfers`
//! makes `transfer_ownership` report success without applying it, which lets
//! tests exercise the controller's post-transfer verification.

use covenant_controller::{Avatar, Owned, ReputationLedger, TokenLedger};
use covenant_core::{Address, CovenantError, CovenantResult};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Handler invoked by a generic call to a registered target
pub type CallHandler = Arc<dyn Fn(&[u8]) -> CovenantResult<Vec<u8>> + Send + Sync>;

fn require_owner(kind: &str, owner: Address, caller: Address) -> CovenantResult<()> {
    if caller == owner {
        Ok(())
    } else {
        Err(CovenantError::unauthorized(format!(
            "{kind}: caller {caller} is not the owner {owner}"
        )))
    }
}

fn credit(balances: &mut BTreeMap<Address, u128>, holder: Address, amount: u128) -> CovenantResult<()> {
    let balance = balances.entry(holder).or_default();
    *balance = balance
        .checked_add(amount)
        .ok_or_else(|| CovenantError::collaborator("balance overflow"))?;
    Ok(())
}

// ----- reputation ---------------------------------------------------------------

/// Reputation ledger kept in memory
#[derive(Debug, Clone)]
pub struct InMemoryReputation {
    address: Address,
    owner: Address,
    balances: BTreeMap<Address, u128>,
    total_supply: u128,
    ignore_transfers: bool,
}

impl InMemoryReputation {
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            balances: BTreeMap::new(),
            total_supply: 0,
            ignore_transfers: false,
        }
    }

    /// Accept ownership transfers without applying them
    pub fn ignoring_ownership_transfers(mut self) -> Self {
        self.ignore_transfers = true;
        self
    }
}

impl Owned for InMemoryReputation {
    fn address(&self) -> Address {
        self.address
    }

    fn owner(&self) -> Address {
        self.owner
    }

    fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> CovenantResult<()> {
        require_owner("reputation", self.owner, caller)?;
        if !self.ignore_transfers {
            self.owner = new_owner;
        }
        Ok(())
    }
}

impl ReputationLedger for InMemoryReputation {
    fn mint(&mut self, caller: Address, to: Address, amount: u128) -> CovenantResult<bool> {
        require_owner("reputation", self.owner, caller)?;
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| CovenantError::collaborator("reputation supply overflow"))?;
        credit(&mut self.balances, to, amount)?;
        self.total_supply = supply;
        Ok(true)
    }

    /// Burns at most the holder's balance
    fn burn(&mut self, caller: Address, from: Address, amount: u128) -> CovenantResult<bool> {
        require_owner("reputation", self.owner, caller)?;
        let balance = self.balances.entry(from).or_default();
        let burned = amount.min(*balance);
        *balance -= burned;
        self.total_supply -= burned;
        Ok(true)
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }
}

// ----- native token -------------------------------------------------------------

/// Mintable token ledger kept in memory
#[derive(Debug, Clone)]
pub struct InMemoryToken {
    address: Address,
    owner: Address,
    balances: BTreeMap<Address, u128>,
    total_supply: u128,
    ignore_transfers: bool,
}

impl InMemoryToken {
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            balances: BTreeMap::new(),
            total_supply: 0,
            ignore_transfers: false,
        }
    }

    /// Accept ownership transfers without applying them
    pub fn ignoring_ownership_transfers(mut self) -> Self {
        self.ignore_transfers = true;
        self
    }
}

impl Owned for InMemoryToken {
    fn address(&self) -> Address {
        self.address
    }

    fn owner(&self) -> Address {
        self.owner
    }

    fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> CovenantResult<()> {
        require_owner("token", self.owner, caller)?;
        if !self.ignore_transfers {
            self.owner = new_owner;
        }
        Ok(())
    }
}

impl TokenLedger for InMemoryToken {
    fn mint(&mut self, caller: Address, beneficiary: Address, amount: u128) -> CovenantResult<bool> {
        require_owner("token", self.owner, caller)?;
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| CovenantError::collaborator("token supply overflow"))?;
        credit(&mut self.balances, beneficiary, amount)?;
        self.total_supply = supply;
        Ok(true)
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }
}

// ----- avatar ---------------------------------------------------------------------

/// Generic calls kept by [`InMemoryAvatar`]; older entries are dropped
pub const CALL_HISTORY_LIMIT: usize = 256;

/// Avatar holding native currency and external token balances in memory
#[derive(Clone)]
pub struct InMemoryAvatar {
    address: Address,
    owner: Address,
    native_token: Address,
    native_reputation: Address,
    ether: BTreeMap<Address, u128>,
    /// (token, holder) → balance
    external_balances: BTreeMap<(Address, Address), u128>,
    /// (token, holder, spender) → allowance
    allowances: BTreeMap<(Address, Address, Address), u128>,
    targets: HashMap<Address, CallHandler>,
    /// Shared until the next call, so checkpoints stay cheap
    calls: Arc<Vec<(Address, Vec<u8>)>>,
    ignore_transfers: bool,
}

impl fmt::Debug for InMemoryAvatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryAvatar")
            .field("address", &self.address)
            .field("owner", &self.owner)
            .field("native_token", &self.native_token)
            .field("native_reputation", &self.native_reputation)
            .field("ether", &self.ether)
            .field("external_balances", &self.external_balances)
            .field("allowances", &self.allowances)
            .field("targets", &self.targets.keys().collect::<Vec<_>>())
            .field("calls", &self.calls.len())
            .finish()
    }
}

impl InMemoryAvatar {
    pub fn new(
        address: Address,
        owner: Address,
        native_token: Address,
        native_reputation: Address,
    ) -> Self {
        Self {
            address,
            owner,
            native_token,
            native_reputation,
            ether: BTreeMap::new(),
            external_balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            targets: HashMap::new(),
            calls: Arc::new(Vec::new()),
            ignore_transfers: false,
        }
    }

    /// Accept ownership transfers without applying them
    pub fn ignoring_ownership_transfers(mut self) -> Self {
        self.ignore_transfers = true;
        self
    }

    /// Route generic calls to `target` through `handler`
    pub fn with_target(mut self, target: Address, handler: CallHandler) -> Self {
        self.targets.insert(target, handler);
        self
    }

    /// Set the avatar's native currency balance
    pub fn with_ether(mut self, amount: u128) -> Self {
        self.ether.insert(self.address, amount);
        self
    }

    /// Give `holder` a balance of the external `token`
    pub fn with_external_balance(mut self, token: Address, holder: Address, amount: u128) -> Self {
        self.external_balances.insert((token, holder), amount);
        self
    }

    /// Let `spender` move `amount` of `holder`'s external `token`
    pub fn with_allowance(
        mut self,
        token: Address,
        holder: Address,
        spender: Address,
        amount: u128,
    ) -> Self {
        self.allowances.insert((token, holder, spender), amount);
        self
    }

    /// Native currency held by `holder`
    pub fn ether_of(&self, holder: &Address) -> u128 {
        self.ether.get(holder).copied().unwrap_or_default()
    }

    /// External `token` held by `holder`
    pub fn external_balance(&self, token: &Address, holder: &Address) -> u128 {
        self.external_balances
            .get(&(*token, *holder))
            .copied()
            .unwrap_or_default()
    }

    /// Allowance of `spender` over `holder`'s external `token`
    pub fn allowance(&self, token: &Address, holder: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(*token, *holder, *spender))
            .copied()
            .unwrap_or_default()
    }

    /// Most recent generic calls, oldest first, at most [`CALL_HISTORY_LIMIT`]
    pub fn calls(&self) -> &[(Address, Vec<u8>)] {
        self.calls.as_slice()
    }

    fn move_external(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> CovenantResult<()> {
        let balance = self.external_balance(&token, &from);
        if balance < amount {
            return Err(CovenantError::collaborator(format!(
                "insufficient {token} balance: {from} holds {balance}, needs {amount}"
            )));
        }
        self.external_balances.insert((token, from), balance - amount);
        let credited = self
            .external_balance(&token, &to)
            .checked_add(amount)
            .ok_or_else(|| CovenantError::collaborator("external balance overflow"))?;
        self.external_balances.insert((token, to), credited);
        Ok(())
    }
}

impl Owned for InMemoryAvatar {
    fn address(&self) -> Address {
        self.address
    }

    fn owner(&self) -> Address {
        self.owner
    }

    fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> CovenantResult<()> {
        require_owner("avatar", self.owner, caller)?;
        if !self.ignore_transfers {
            self.owner = new_owner;
        }
        Ok(())
    }
}

impl Avatar for InMemoryAvatar {
    fn native_token(&self) -> Address {
        self.native_token
    }

    fn native_reputation(&self) -> Address {
        self.native_reputation
    }

    fn generic_call(
        &mut self,
        caller: Address,
        target: Address,
        payload: &[u8],
    ) -> CovenantResult<Vec<u8>> {
        require_owner("avatar", self.owner, caller)?;
        let handler = self
            .targets
            .get(&target)
            .cloned()
            .ok_or_else(|| CovenantError::collaborator(format!("call to unknown target {target}")))?;
        let output = handler(payload)?;
        let calls = Arc::make_mut(&mut self.calls);
        if calls.len() == CALL_HISTORY_LIMIT {
            calls.remove(0);
        }
        calls.push((target, payload.to_vec()));
        Ok(output)
    }

    fn send_ether(&mut self, caller: Address, amount: u128, to: Address) -> CovenantResult<bool> {
        require_owner("avatar", self.owner, caller)?;
        let own = self.ether_of(&self.address);
        if own < amount {
            return Err(CovenantError::collaborator(format!(
                "insufficient ether: avatar holds {own}, needs {amount}"
            )));
        }
        self.ether.insert(self.address, own - amount);
        credit(&mut self.ether, to, amount)?;
        Ok(true)
    }

    fn external_token_transfer(
        &mut self,
        caller: Address,
        token: Address,
        to: Address,
        amount: u128,
    ) -> CovenantResult<bool> {
        require_owner("avatar", self.owner, caller)?;
        self.move_external(token, self.address, to, amount)?;
        Ok(true)
    }

    fn external_token_transfer_from(
        &mut self,
        caller: Address,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> CovenantResult<bool> {
        require_owner("avatar", self.owner, caller)?;
        let allowance = self.allowance(&token, &from, &self.address);
        if allowance < amount {
            return Err(CovenantError::collaborator(format!(
                "allowance of {} over {from} is {allowance}, needs {amount}",
                self.address
            )));
        }
        self.move_external(token, from, to, amount)?;
        self.allowances
            .insert((token, from, self.address), allowance - amount);
        Ok(true)
    }

    fn external_token_increase_approval(
        &mut self,
        caller: Address,
        token: Address,
        spender: Address,
        amount: u128,
    ) -> CovenantResult<bool> {
        require_owner("avatar", self.owner, caller)?;
        let allowance = self
            .allowance(&token, &self.address, &spender)
            .checked_add(amount)
            .ok_or_else(|| CovenantError::collaborator("allowance overflow"))?;
        self.allowances
            .insert((token, self.address, spender), allowance);
        Ok(true)
    }

    /// Lowering below zero leaves a zero allowance
    fn external_token_decrease_approval(
        &mut self,
        caller: Address,
        token: Address,
        spender: Address,
        amount: u128,
    ) -> CovenantResult<bool> {
        require_owner("avatar", self.owner, caller)?;
        let allowance = self
            .allowance(&token, &self.address, &spender)
            .saturating_sub(amount);
        self.allowances
            .insert((token, self.address, spender), allowance);
        Ok(true)
    }
}
