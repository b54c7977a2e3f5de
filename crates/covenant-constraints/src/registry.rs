//! Global constraint registry
//!
//! Two independent ordered collections, one per [`Phase`]. Each collection is
//! a dense `Vec` of entries plus a reverse index from address to slot:
//!
//! - membership and lookup are O(1) through the index
//! - removal swaps the last entry into the freed slot, truncates, and
//!   repoints the moved entry's index, so it is O(1) as well
//!
//! Removal therefore reorders the collection. Insertion order is preserved
//! only until the first removal.

use covenant_core::{Address, CallPhase, CovenantError, CovenantResult, Hash32, Phase};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A registered constraint and its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintEntry {
    /// Address of the constraint module
    pub constraint: Address,
    /// Parameters passed to every check
    pub params: Hash32,
}

/// Outcome of inserting into one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new entry was appended at this slot
    Inserted(usize),
    /// An existing entry at this slot had its params replaced
    Updated(usize),
}

impl Upsert {
    /// Slot holding the entry
    pub fn slot(self) -> usize {
        match self {
            Upsert::Inserted(slot) | Upsert::Updated(slot) => slot,
        }
    }
}

/// One ordered collection with O(1) reverse lookup
#[derive(Debug, Clone, Default)]
pub struct PhaseCollection {
    entries: Vec<ConstraintEntry>,
    slots: HashMap<Address, usize>,
}

impl PhaseCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `constraint`, or replace its params if already present
    pub fn upsert(&mut self, constraint: Address, params: Hash32) -> Upsert {
        if let Some(&slot) = self.slots.get(&constraint) {
            self.entries[slot].params = params;
            return Upsert::Updated(slot);
        }
        let slot = self.entries.len();
        self.entries.push(ConstraintEntry { constraint, params });
        self.slots.insert(constraint, slot);
        Upsert::Inserted(slot)
    }

    /// Remove `constraint`, returning the slot it occupied
    pub fn remove(&mut self, constraint: &Address) -> Option<usize> {
        let slot = self.slots.remove(constraint)?;
        let last = self.entries.len() - 1;
        if slot < last {
            let moved = self.entries[last];
            self.entries[slot] = moved;
            self.slots.insert(moved.constraint, slot);
        }
        self.entries.truncate(last);
        Some(slot)
    }

    /// Entry for `constraint`
    pub fn get(&self, constraint: &Address) -> Option<&ConstraintEntry> {
        self.slots.get(constraint).map(|&slot| &self.entries[slot])
    }

    /// Slot of `constraint`
    pub fn slot_of(&self, constraint: &Address) -> Option<usize> {
        self.slots.get(constraint).copied()
    }

    /// Whether `constraint` is registered
    pub fn contains(&self, constraint: &Address) -> bool {
        self.slots.contains_key(constraint)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in current order
    pub fn entries(&self) -> &[ConstraintEntry] {
        &self.entries
    }

    /// Owned copy of the entries for iteration that must not observe changes
    pub fn snapshot(&self) -> Vec<ConstraintEntry> {
        self.entries.clone()
    }

    /// Whether the reverse index and the entries agree exactly
    pub fn is_consistent(&self) -> bool {
        self.slots.len() == self.entries.len()
            && self.slots.iter().all(|(address, &slot)| {
                self.entries
                    .get(slot)
                    .is_some_and(|entry| entry.constraint == *address)
            })
    }
}

/// Result of adding a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addition {
    /// Outcome in the pre collection, if targeted
    pub pre: Option<Upsert>,
    /// Outcome in the post collection, if targeted
    pub post: Option<Upsert>,
}

/// Result of removing a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Removal {
    /// Slot freed in the pre collection
    pub pre_slot: Option<usize>,
    /// Slot freed in the post collection
    pub post_slot: Option<usize>,
}

impl Removal {
    /// Whether anything was removed
    pub fn removed(&self) -> bool {
        self.pre_slot.is_some() || self.post_slot.is_some()
    }
}

/// Pre and post constraint collections
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    pre: PhaseCollection,
    post: PhaseCollection,
    capacity: Option<usize>,
}

impl ConstraintRegistry {
    /// Create an unbounded registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry bounded to `capacity` entries per collection
    pub fn with_capacity_limit(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Collection for `phase`
    pub fn collection(&self, phase: Phase) -> &PhaseCollection {
        match phase {
            Phase::Pre => &self.pre,
            Phase::Post => &self.post,
        }
    }

    fn collection_mut(&mut self, phase: Phase) -> &mut PhaseCollection {
        match phase {
            Phase::Pre => &mut self.pre,
            Phase::Post => &mut self.post,
        }
    }

    /// Register `constraint` in every collection `when` names
    ///
    /// Capacity is checked for all targeted collections before any of them is
    /// touched, so a `PreAndPost` constraint is never half-registered.
    pub fn add(
        &mut self,
        constraint: Address,
        params: Hash32,
        when: CallPhase,
    ) -> CovenantResult<Addition> {
        if let Some(capacity) = self.capacity {
            for phase in when.phases() {
                let collection = self.collection(phase);
                if !collection.contains(&constraint) && collection.len() >= capacity {
                    return Err(CovenantError::invariant(format!(
                        "{phase} constraint collection is full ({capacity} entries)"
                    )));
                }
            }
        }

        let mut addition = Addition {
            pre: None,
            post: None,
        };
        for phase in when.phases() {
            let outcome = self.collection_mut(phase).upsert(constraint, params);
            match phase {
                Phase::Pre => addition.pre = Some(outcome),
                Phase::Post => addition.post = Some(outcome),
            }
        }
        Ok(addition)
    }

    /// Remove `constraint` from every collection `when` names
    pub fn remove(&mut self, constraint: &Address, when: CallPhase) -> Removal {
        let mut removal = Removal::default();
        for phase in when.phases() {
            let slot = self.collection_mut(phase).remove(constraint);
            match phase {
                Phase::Pre => removal.pre_slot = slot,
                Phase::Post => removal.post_slot = slot,
            }
        }
        removal
    }

    /// `(pre, post)` entry counts
    pub fn counts(&self) -> (usize, usize) {
        (self.pre.len(), self.post.len())
    }

    /// Whether `constraint` is in either collection
    pub fn is_registered(&self, constraint: &Address) -> bool {
        self.pre.contains(constraint) || self.post.contains(constraint)
    }

    /// Stored params, pre collection first; `Hash32::ZERO` when absent
    pub fn params_of(&self, constraint: &Address) -> Hash32 {
        self.pre
            .get(constraint)
            .or_else(|| self.post.get(constraint))
            .map(|entry| entry.params)
            .unwrap_or(Hash32::ZERO)
    }

    /// Whether both collections are internally consistent
    pub fn is_consistent(&self) -> bool {
        self.pre.is_consistent() && self.post.is_consistent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn params(n: u8) -> Hash32 {
        Hash32::from_bytes([n; 32])
    }

    #[test]
    fn upsert_appends_then_updates_in_place() {
        let mut collection = PhaseCollection::new();
        assert_eq!(collection.upsert(addr(1), params(1)), Upsert::Inserted(0));
        assert_eq!(collection.upsert(addr(2), params(2)), Upsert::Inserted(1));
        let updated = collection.upsert(addr(1), params(9));
        assert_eq!(updated, Upsert::Updated(0));
        assert_eq!(updated.slot(), 0);
        assert_eq!(Upsert::Inserted(1).slot(), 1);
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get(&addr(1)).unwrap().params, params(9));
    }

    #[test]
    fn remove_swaps_last_into_freed_slot() {
        let mut collection = PhaseCollection::new();
        for n in 1..=4 {
            collection.upsert(addr(n), params(n as u8));
        }
        assert_eq!(collection.remove(&addr(2)), Some(1));
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.slot_of(&addr(4)), Some(1));
        assert_eq!(collection.entries()[1].constraint, addr(4));
        assert!(collection.is_consistent());
    }

    #[test]
    fn remove_last_entry_just_truncates() {
        let mut collection = PhaseCollection::new();
        collection.upsert(addr(1), params(1));
        collection.upsert(addr(2), params(2));
        assert_eq!(collection.remove(&addr(2)), Some(1));
        assert_eq!(collection.slot_of(&addr(1)), Some(0));
        assert_eq!(collection.remove(&addr(1)), Some(0));
        assert!(collection.is_empty());
        assert_eq!(collection.remove(&addr(1)), None);
    }

    #[test]
    fn pre_and_post_lands_in_both() {
        let mut registry = ConstraintRegistry::new();
        let addition = registry
            .add(addr(1), params(1), CallPhase::PreAndPost)
            .unwrap();
        assert_eq!(addition.pre, Some(Upsert::Inserted(0)));
        assert_eq!(addition.post, Some(Upsert::Inserted(0)));
        assert_eq!(registry.counts(), (1, 1));

        let removal = registry.remove(&addr(1), CallPhase::PreAndPost);
        assert!(removal.removed());
        assert_eq!(registry.counts(), (0, 0));
    }

    #[test]
    fn params_lookup_prefers_pre_and_defaults_to_zero() {
        let mut registry = ConstraintRegistry::new();
        registry.add(addr(1), params(1), CallPhase::Post).unwrap();
        assert_eq!(registry.params_of(&addr(1)), params(1));
        assert_eq!(registry.params_of(&addr(2)), Hash32::ZERO);
        assert!(!registry.is_registered(&addr(2)));
    }

    #[test]
    fn capacity_is_checked_before_any_mutation() {
        let mut registry = ConstraintRegistry::with_capacity_limit(Some(1));
        registry.add(addr(1), params(1), CallPhase::Post).unwrap();

        // Pre has room, post does not: nothing may change
        let err = registry
            .add(addr(2), params(2), CallPhase::PreAndPost)
            .unwrap_err();
        assert!(matches!(err, CovenantError::InvariantViolation { .. }));
        assert_eq!(registry.counts(), (0, 1));

        // Updating an existing entry never counts against capacity
        registry.add(addr(1), params(7), CallPhase::Post).unwrap();
        assert_eq!(registry.params_of(&addr(1)), params(7));
    }

    #[test]
    fn removal_only_touches_declared_phases() {
        let mut registry = ConstraintRegistry::new();
        registry.add(addr(1), params(1), CallPhase::PreAndPost).unwrap();
        let removal = registry.remove(&addr(1), CallPhase::Pre);
        assert_eq!(removal.pre_slot, Some(0));
        assert_eq!(removal.post_slot, None);
        assert!(registry.is_registered(&addr(1)));
        assert_eq!(registry.counts(), (0, 1));
    }
}
